//! HTTP response headers for resolved resources

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::resource::Resource;

/// Furthest `Expires` date HTTP/1.1 allows, one year ahead
pub const MAX_EXPIRES: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Format a timestamp as an RFC 1123 HTTP date
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Weak entity tag `W/"<length>-<lastModifiedMillis>"`
pub fn etag(content_length: u64, last_modified: SystemTime) -> String {
    let millis = last_modified
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("W/\"{content_length}-{millis}\"")
}

/// Headers to send with a resource, in a stable order
///
/// `Pragma` is always present and empty, overriding any `no-cache` a container adds.
/// `Expires` is at most [`MAX_EXPIRES`] after `now`.
pub fn response_headers(
    resource: &Resource,
    max_age: Duration,
    now: SystemTime,
) -> IndexMap<String, String> {
    let mut headers = IndexMap::new();
    headers.insert("Content-Type".to_string(), resource.content_type.clone());
    if let Some(length) = resource.content_length {
        headers.insert("Content-Length".to_string(), length.to_string());
    }
    if let Some(modified) = resource.last_modified {
        headers.insert("Last-Modified".to_string(), http_date(modified));
    }
    let expires = now
        .checked_add(max_age.min(MAX_EXPIRES))
        .unwrap_or(now);
    headers.insert("Expires".to_string(), http_date(expires));
    if let (Some(length), Some(modified)) = (resource.content_length, resource.last_modified) {
        headers.insert("ETag".to_string(), etag(length, modified));
    }
    for (name, value) in &resource.headers {
        headers.insert(name.clone(), value.clone());
    }
    headers.insert("Pragma".to_string(), String::new());
    headers
}
