use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tokio::time::timeout;

use super::{GatewayError, HttpGateway, HttpResponse, Method};
use crate::config::ClientConfig;
use crate::resource::Resource;

/// [`HttpGateway`] backed by `reqwest`.
///
/// Relative hrefs (`/orders/1`) resolve against the configured base URL;
/// absolute `http(s)` hrefs are used as-is. Dropping a pending request
/// future aborts the connection.
pub struct ReqwestGateway {
    client: Client,
    base_url: Option<String>,
    request_timeout: Duration,
}

impl ReqwestGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .build()
            .map_err(GatewayError::Client)?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            request_timeout: Duration::from_secs(config.timeout_seconds as u64),
        })
    }

    /// Turn an href into an absolute request URL.
    pub fn resolve(&self, href: &str) -> Result<String, GatewayError> {
        if href.starts_with("http://") || href.starts_with("https://") {
            return Ok(href.to_string());
        }
        match (&self.base_url, href.starts_with('/')) {
            (Some(base), true) => Ok(format!("{}{}", base, href)),
            (Some(base), false) => Ok(format!("{}/{}", base, href)),
            (None, _) => Err(GatewayError::InvalidUrl {
                url: href.to_string(),
                reason: "relative href without a configured base_url".to_string(),
            }),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl HttpGateway for ReqwestGateway {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Resource>,
    ) -> Result<HttpResponse, GatewayError> {
        let target = self.resolve(url)?;
        tracing::debug!(method = %method, url = %target, has_body = body.is_some(), "Gateway request");

        let mut builder = self
            .client
            .request(method.into(), &target)
            .header(ACCEPT, "application/json");
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let send = async {
            let response = builder.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        let (status, bytes) = match timeout(self.request_timeout, send).await {
            Ok(result) => result.map_err(|source| GatewayError::Connection {
                url: target.clone(),
                source,
            })?,
            Err(_) => {
                return Err(GatewayError::Timeout {
                    url: target,
                    seconds: self.request_timeout.as_secs(),
                })
            }
        };

        if !status.is_success() {
            tracing::debug!(url = %target, status = status.as_u16(), "Gateway error status");
            return Err(GatewayError::Status {
                url: target,
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            let parsed: Resource =
                serde_json::from_slice(&bytes).map_err(|source| GatewayError::Decode {
                    url: target.clone(),
                    source,
                })?;
            Some(parsed).filter(|resource| !resource.is_null())
        };

        Ok(HttpResponse::new(status.as_u16(), body))
    }
}
