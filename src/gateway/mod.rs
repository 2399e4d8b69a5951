//! HTTP transport seam.
//!
//! Bindings never talk to the network directly; they go through an
//! [`HttpGateway`]. [`ReqwestGateway`] is the production implementation, and
//! tests substitute their own.
//!
//! Cancellation is cooperative: a binding that no longer needs a response
//! drops the request future. Implementations should make that abort the
//! underlying call where they can (reqwest does).

mod error;
mod reqwest_gateway;

pub use self::error::GatewayError;
pub use self::reqwest_gateway::ReqwestGateway;

use std::fmt;

use async_trait::async_trait;

use crate::resource::Resource;

/// HTTP verbs the binding layer issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether an action with this verb sends the resource as its body.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Put | Method::Post | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed 2xx exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// `None` when the server sent no payload (or a JSON `null`).
    pub body: Option<Resource>,
}

impl HttpResponse {
    pub fn new(status: u16, body: Option<Resource>) -> Self {
        Self { status, body }
    }
}

/// Performs one HTTP request.
///
/// Must resolve to `Err` for non-2xx statuses and transport failures.
#[async_trait]
pub trait HttpGateway: Send + Sync {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Resource>,
    ) -> Result<HttpResponse, GatewayError>;

    /// Convenience wrapper for `GET url`.
    async fn get(&self, url: &str) -> Result<HttpResponse, GatewayError> {
        self.request(Method::Get, url, None).await
    }
}
