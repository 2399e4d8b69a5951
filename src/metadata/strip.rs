use std::sync::Arc;

use super::MetadataProvider;
use crate::resource::Resource;

/// Copy of `resource` with every metadata key removed, at any depth.
///
/// Arrays are walked element by element; their positions are never checked
/// against [`MetadataProvider::is_metadata_key`].
pub fn strip_metadata(resource: &Resource, provider: &dyn MetadataProvider) -> Resource {
    match resource {
        Resource::Object(fields) => Resource::Object(Arc::new(
            fields
                .iter()
                .filter(|(key, _)| !provider.is_metadata_key(key))
                .map(|(key, value)| (key.clone(), strip_metadata(value, provider)))
                .collect(),
        )),
        Resource::Array(items) => {
            Resource::array(items.iter().map(|item| strip_metadata(item, provider)))
        }
        scalar => scalar.clone(),
    }
}
