//! Predicates deciding whether discovered metadata is usable.

use crate::gateway::Method;

/// An href is usable when it is site-relative (`/…`) or starts with `http`.
///
/// Deliberately a prefix check, not a URL parser.
pub fn is_valid_href(href: &str) -> bool {
    href.starts_with('/') || href.starts_with("http")
}

/// Parse an advertised action verb. Only PUT, POST, DELETE and PATCH are
/// actions; matching ignores case and surrounding whitespace.
pub fn parse_action_method(method: &str) -> Option<Method> {
    match method.trim().to_ascii_uppercase().as_str() {
        "PUT" => Some(Method::Put),
        "POST" => Some(Method::Post),
        "DELETE" => Some(Method::Delete),
        "PATCH" => Some(Method::Patch),
        _ => None,
    }
}
