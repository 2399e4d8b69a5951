//! TOML configuration for the client and the default metadata provider.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{ClientConfig, Config, MetadataConfig};
