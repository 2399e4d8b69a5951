//! Hypermedia metadata lookup.
//!
//! The binding engine never reads link/action/socket keys itself. Everything
//! goes through a [`MetadataProvider`], so the wire convention is pluggable.
//! [`ReservedKeyMetadata`] is the default convention:
//!
//! ```json
//! {
//!   "name": "Ada",
//!   "_links":   { "self":    { "href": "/users/1" } },
//!   "_actions": { "update":  { "href": "/users/1", "method": "PUT" } },
//!   "_sockets": { "changes": { "href": "/ws/users/1", "method": "user-updated" } }
//! }
//! ```

mod reserved;
mod strip;
mod url;
pub mod validate;

pub use reserved::ReservedKeyMetadata;
pub use strip::strip_metadata;
pub use url::{append_params, get_url};

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// A navigable relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub href: String,
}

/// A mutating operation the server currently permits.
///
/// `method` is the raw advertised verb; bindings validate it with
/// [`validate::parse_action_method`] before treating the action as available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAction {
    pub href: String,
    pub method: String,
}

/// A subscribable push channel. Discovery only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSocket {
    pub href: String,
    pub method: String,
}

/// Which metadata table a relation name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Link,
    Action,
    Socket,
}

/// Pluggable metadata lookup strategy.
///
/// Implementations must be pure functions of their inputs; bindings call
/// them on every upstream change and rely on identical answers for
/// identical resources.
pub trait MetadataProvider: Send + Sync {
    /// Whether `key` is reserved for metadata at any nesting level.
    fn is_metadata_key(&self, key: &str) -> bool;

    fn link_lookup(&self, resource: &Resource, name: &str) -> Option<ResourceLink>;

    fn action_lookup(&self, resource: &Resource, name: &str) -> Option<ResourceAction>;

    fn socket_lookup(&self, resource: &Resource, name: &str) -> Option<ResourceSocket>;

    /// Relation names advertised on `resource`, for inspection tooling.
    fn relation_names(&self, _resource: &Resource, _kind: RelationKind) -> Vec<String> {
        Vec::new()
    }
}
