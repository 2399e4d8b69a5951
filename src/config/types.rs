use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// HTTP transport and binding behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL that relative hrefs (`/orders/1`) resolve against.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Total request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Remove hypermedia metadata from action request bodies (default: false).
    #[serde(default)]
    pub strip_action_metadata: bool,
}

/// Reserved keys the default metadata provider reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_links_key")]
    pub links_key: String,
    #[serde(default = "default_actions_key")]
    pub actions_key: String,
    #[serde(default = "default_sockets_key")]
    pub sockets_key: String,
    /// Link relation naming a resource's own URL.
    #[serde(default = "default_self_relation")]
    pub self_relation: String,
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_links_key() -> String {
    "_links".to_string()
}

fn default_actions_key() -> String {
    "_actions".to_string()
}

fn default_sockets_key() -> String {
    "_sockets".to_string()
}

fn default_self_relation() -> String {
    "self".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            strip_action_metadata: false,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            links_key: default_links_key(),
            actions_key: default_actions_key(),
            sockets_key: default_sockets_key(),
            self_relation: default_self_relation(),
        }
    }
}
