use super::{MetadataProvider, RelationKind, ResourceAction, ResourceLink, ResourceSocket};
use crate::config::MetadataConfig;
use crate::resource::Resource;

/// Default provider: metadata lives in reserved top-level keys
/// (`_links`, `_actions`, `_sockets` unless configured otherwise), each a
/// map from relation name to descriptor.
#[derive(Debug, Clone)]
pub struct ReservedKeyMetadata {
    links_key: String,
    actions_key: String,
    sockets_key: String,
}

impl ReservedKeyMetadata {
    pub fn new() -> Self {
        Self::from_config(&MetadataConfig::default())
    }

    pub fn from_config(config: &MetadataConfig) -> Self {
        Self {
            links_key: config.links_key.clone(),
            actions_key: config.actions_key.clone(),
            sockets_key: config.sockets_key.clone(),
        }
    }

    fn table_key(&self, kind: RelationKind) -> &str {
        match kind {
            RelationKind::Link => &self.links_key,
            RelationKind::Action => &self.actions_key,
            RelationKind::Socket => &self.sockets_key,
        }
    }

    fn descriptor<'a>(
        &self,
        resource: &'a Resource,
        kind: RelationKind,
        name: &str,
    ) -> Option<&'a Resource> {
        resource.get(self.table_key(kind))?.get(name)
    }
}

impl Default for ReservedKeyMetadata {
    fn default() -> Self {
        Self::new()
    }
}

fn string_field(descriptor: &Resource, key: &str) -> Option<String> {
    descriptor.get(key).and_then(Resource::as_str).map(str::to_string)
}

impl MetadataProvider for ReservedKeyMetadata {
    fn is_metadata_key(&self, key: &str) -> bool {
        key == self.links_key || key == self.actions_key || key == self.sockets_key
    }

    fn link_lookup(&self, resource: &Resource, name: &str) -> Option<ResourceLink> {
        let descriptor = self.descriptor(resource, RelationKind::Link, name)?;
        Some(ResourceLink {
            href: string_field(descriptor, "href")?,
        })
    }

    fn action_lookup(&self, resource: &Resource, name: &str) -> Option<ResourceAction> {
        let descriptor = self.descriptor(resource, RelationKind::Action, name)?;
        Some(ResourceAction {
            href: string_field(descriptor, "href")?,
            method: string_field(descriptor, "method")?,
        })
    }

    fn socket_lookup(&self, resource: &Resource, name: &str) -> Option<ResourceSocket> {
        let descriptor = self.descriptor(resource, RelationKind::Socket, name)?;
        Some(ResourceSocket {
            href: string_field(descriptor, "href")?,
            method: string_field(descriptor, "method")
                .or_else(|| string_field(descriptor, "event"))?,
        })
    }

    fn relation_names(&self, resource: &Resource, kind: RelationKind) -> Vec<String> {
        resource
            .get(self.table_key(kind))
            .and_then(Resource::as_object)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }
}
