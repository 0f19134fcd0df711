//! Page-number pagination over the REST collections
//!
//! List endpoints answer with an envelope:
//!
//! ```json
//! {"count": 82, "next": "https://.../people/?page=2", "previous": null, "results": [...]}
//! ```
//!
//! Callers only ever see `results`; the envelope is stripped by the fetcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page requested when the query omits `page`
pub const DEFAULT_PAGE: i32 = 1;

/// Paginated list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<Value>,
}

/// Check for the envelope shape: a numeric `count` next to a `results` field
///
/// No API-version guard: an entity that happened to carry both fields
/// would be treated as a page.
pub fn is_envelope(value: &Value) -> bool {
    value.get("count").is_some_and(Value::is_number) && value.get("results").is_some()
}

/// Return the page items for an envelope, the value itself otherwise
///
/// Fails when a value has the envelope shape but not its types, e.g. a
/// `results` that is not a list.
pub fn unwrap_envelope(value: Value) -> Result<Value, serde_json::Error> {
    if !is_envelope(&value) {
        return Ok(value);
    }
    let envelope: Envelope = serde_json::from_value(value)?;
    Ok(Value::Array(envelope.results))
}

/// Build the key for one entity: `{base}/{collection}/{id}/`
pub fn entity_key(base: &str, collection: &str, id: u32) -> String {
    format!("{}/{}/{}/", base.trim_end_matches('/'), collection, id)
}

/// Build the key for one page: `{base}/{collection}/?page={page}`
pub fn page_key(base: &str, collection: &str, page: u32) -> String {
    format!("{}/{}/?page={}", base.trim_end_matches('/'), collection, page)
}

/// Validate a positive integer argument (`id`, `page`)
pub fn positive(name: &str, value: i32) -> crate::Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            crate::GraphQLError::InvalidArgument(format!(
                "'{}' must be a positive integer, got {}",
                name, value
            ))
        })
}
