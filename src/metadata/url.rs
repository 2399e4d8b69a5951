use super::MetadataProvider;
use crate::binding::BindingError;
use crate::resource::Resource;

/// Append `key=value` pairs to `href`.
///
/// The first separator is `?` unless `href` already has a query string.
/// Keys and values are emitted as given, without percent-encoding.
pub fn append_params(href: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return href.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if href.contains('?') { '&' } else { '?' };
    format!("{}{}{}", href, separator, query)
}

/// Resolve `link` on `resource` and append `params`.
pub fn get_url(
    provider: &dyn MetadataProvider,
    resource: &Resource,
    link: &str,
    params: &[(&str, &str)],
) -> Result<String, BindingError> {
    let resolved = provider
        .link_lookup(resource, link)
        .ok_or_else(|| BindingError::LinkMissing {
            relation: link.to_string(),
        })?;
    Ok(append_params(&resolved.href, params))
}
