//! Reactive bindings between application state and a hypermedia API.
//!
//! | Binding                     | Drives                                  |
//! |-----------------------------|-----------------------------------------|
//! | [`ResourceBinding`]         | explicit loads of a root resource       |
//! | [`LinkedResourceBinding`]   | loads that follow a relation reactively |
//! | [`ActionBinding`]           | one advertised action                   |
//! | [`CollectionActionBinding`] | one action per item of an array         |
//!
//! Every binding owns its data and state slots exclusively and hands them out
//! only as [`ReadSignal`](crate::reactive::ReadSignal)s. Each binding allows
//! at most one request in flight; starting a new one cancels the previous.

mod action;
mod collection;
mod error;
mod flight;
mod linked;
mod resource;
mod state;

pub use action::ActionBinding;
pub use collection::CollectionActionBinding;
pub use error::{ActionFailure, BindingError};
pub use linked::LinkedResourceBinding;
pub use resource::ResourceBinding;
pub use state::{
    ActionState, CollectionActionState, ItemActionState, LinkedPhase, LinkedResourceState,
    ResourceState,
};

use std::sync::Arc;

use crate::config::Config;
use crate::gateway::{HttpGateway, Method};
use crate::metadata::{validate, MetadataProvider, ResourceAction};
use crate::resource::Resource;

/// Tunables shared by every binding created from one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOptions {
    /// Remove metadata keys from action request bodies.
    pub strip_action_metadata: bool,
    /// Relation name of a resource's canonical URL.
    pub self_relation: String,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            strip_action_metadata: false,
            self_relation: "self".to_string(),
        }
    }
}

impl From<&Config> for BindingOptions {
    fn from(config: &Config) -> Self {
        Self {
            strip_action_metadata: config.client.strip_action_metadata,
            self_relation: config.metadata.self_relation.clone(),
        }
    }
}

/// Collaborators a binding talks to.
#[derive(Clone)]
pub struct BindingContext {
    pub gateway: Arc<dyn HttpGateway>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub options: BindingOptions,
}

impl BindingContext {
    pub fn new(gateway: Arc<dyn HttpGateway>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            gateway,
            metadata,
            options: BindingOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BindingOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve `relation` as an action and validate both href and verb.
    fn usable_action(
        &self,
        resource: &Resource,
        relation: &str,
    ) -> Option<(String, Method)> {
        let ResourceAction { href, method } = self.metadata.action_lookup(resource, relation)?;
        let method = validate::parse_action_method(&method)?;
        validate::is_valid_href(&href).then_some((href, method))
    }
}

impl std::fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
