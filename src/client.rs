//! Entry point tying a gateway and a metadata provider to bindings.

use std::sync::Arc;

use crate::binding::{
    ActionBinding, BindingContext, BindingError, BindingOptions, CollectionActionBinding,
    LinkedResourceBinding, ResourceBinding,
};
use crate::config::Config;
use crate::gateway::{GatewayError, HttpGateway, ReqwestGateway};
use crate::metadata::{self, MetadataProvider, ReservedKeyMetadata, ResourceSocket};
use crate::resource::Resource;

/// Factory for bindings sharing one gateway, metadata provider and option
/// set.
#[derive(Clone, Debug)]
pub struct HypermediaClient {
    context: BindingContext,
}

impl HypermediaClient {
    pub fn new(gateway: Arc<dyn HttpGateway>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            context: BindingContext::new(gateway, metadata),
        }
    }

    /// Client over [`ReqwestGateway`] and [`ReservedKeyMetadata`], both
    /// configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let gateway = ReqwestGateway::new(&config.client)?;
        let metadata = ReservedKeyMetadata::from_config(&config.metadata);
        Ok(Self::new(Arc::new(gateway), Arc::new(metadata)).with_options(config.into()))
    }

    pub fn with_options(mut self, options: BindingOptions) -> Self {
        self.context = self.context.with_options(options);
        self
    }

    pub fn context(&self) -> &BindingContext {
        &self.context
    }

    pub fn metadata(&self) -> &dyn MetadataProvider {
        self.context.metadata.as_ref()
    }

    pub fn gateway(&self) -> &Arc<dyn HttpGateway> {
        &self.context.gateway
    }

    /// New root resource binding starting from `Null`.
    pub fn resource(&self, name: &str) -> ResourceBinding {
        self.resource_with_initial(name, Resource::Null)
    }

    pub fn resource_with_initial(&self, name: &str, initial: Resource) -> ResourceBinding {
        ResourceBinding::new(name, initial, self.context.clone())
    }

    pub fn linked_resource(&self, name: &str, relation: &str) -> LinkedResourceBinding {
        LinkedResourceBinding::new(name, relation, Resource::Null, self.context.clone())
    }

    pub fn action(&self, name: &str, relation: &str) -> ActionBinding {
        ActionBinding::new(name, relation, self.context.clone())
    }

    pub fn collection_action(&self, name: &str, relation: &str) -> CollectionActionBinding {
        CollectionActionBinding::new(name, relation, self.context.clone())
    }

    /// URL of relation `link` on `resource` with `params` appended.
    pub fn get_url(
        &self,
        resource: &Resource,
        link: &str,
        params: &[(&str, &str)],
    ) -> Result<String, BindingError> {
        metadata::get_url(self.metadata(), resource, link, params)
    }

    pub fn socket(&self, resource: &Resource, name: &str) -> Option<ResourceSocket> {
        self.metadata().socket_lookup(resource, name)
    }
}
