//! Resources as seen by the resolution pipeline
//!
//! A [`ResourceIdentifier`] names a resource. A [`Resource`] is what the pipeline returns
//! for it: the URL clients should request, HTTP metadata, headers added by stages, and where
//! the bytes come from.

pub mod identifier;

use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use serde::Serialize;

use crate::bundle::{Bundle, BundleKind, ResolvedBundle};
use crate::store::{StoredResource, mime_type_for};

pub use identifier::{IdentifierSet, ResourceIdentifier};

/// Header naming the source map of a script or stylesheet
pub const SOURCE_MAP_HEADER: &str = "SourceMap";

/// Where the bytes of a resolved resource come from
#[derive(Debug, Clone)]
pub enum ResourceOrigin {
    /// A single resource in the store
    Stored(StoredResource),
    /// A bundle, concatenated from its resolved members
    Bundle {
        bundle: Arc<Bundle>,
        kind: BundleKind,
        resolved: ResolvedBundle,
    },
    /// Hosted elsewhere, no local content
    External,
}

/// A resolved resource
#[derive(Debug, Clone)]
pub struct Resource {
    pub identifier: ResourceIdentifier,
    /// URL clients use to fetch the resource
    pub request_path: String,
    pub content_type: String,
    pub content_length: Option<u64>,
    pub last_modified: Option<SystemTime>,
    /// Extra response headers contributed by pipeline stages
    pub headers: IndexMap<String, String>,
    pub origin: ResourceOrigin,
}

impl Resource {
    pub fn stored(resource: StoredResource, request_path: String) -> Self {
        Self {
            identifier: resource.identifier.clone(),
            request_path,
            content_type: resource.mime_type.clone(),
            content_length: Some(resource.content_length),
            last_modified: Some(resource.last_modified),
            headers: IndexMap::new(),
            origin: ResourceOrigin::Stored(resource),
        }
    }

    pub fn bundle(
        identifier: ResourceIdentifier,
        request_path: String,
        bundle: Arc<Bundle>,
        kind: BundleKind,
        resolved: ResolvedBundle,
    ) -> Self {
        Self {
            identifier,
            request_path,
            content_type: kind.mime_type().to_string(),
            content_length: Some(resolved.served_length()),
            last_modified: Some(resolved.last_modified),
            headers: IndexMap::new(),
            origin: ResourceOrigin::Bundle {
                bundle,
                kind,
                resolved,
            },
        }
    }

    /// A resource that only exists at an external URL
    pub fn external(identifier: ResourceIdentifier, url: String) -> Self {
        Self {
            content_type: mime_type_for(identifier.name()),
            identifier,
            request_path: url,
            content_length: None,
            last_modified: None,
            headers: IndexMap::new(),
            origin: ResourceOrigin::External,
        }
    }

    pub fn is_bundle(&self) -> bool {
        matches!(self.origin, ResourceOrigin::Bundle { .. })
    }

    pub fn is_external(&self) -> bool {
        matches!(self.origin, ResourceOrigin::External)
    }

    /// Whether the query string already carries `key=`
    pub fn has_query_param(&self, key: &str) -> bool {
        self.request_path
            .split_once('?')
            .is_some_and(|(_, query)| {
                query
                    .split('&')
                    .any(|pair| pair.split('=').next() == Some(key))
            })
    }

    /// Append `key=value` to the request path's query string
    pub fn append_query_param(&mut self, key: &str, value: &str) {
        let separator = if self.request_path.contains('?') {
            '&'
        } else {
            '?'
        };
        self.request_path = format!("{}{separator}{key}={value}", self.request_path);
    }

    pub fn source_map(&self) -> Option<&str> {
        self.headers.get(SOURCE_MAP_HEADER).map(String::as_str)
    }

    /// Serializable summary used by the CLI
    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            identifier: self.identifier.to_string(),
            request_path: self.request_path.clone(),
            content_type: self.content_type.clone(),
            content_length: self.content_length,
            origin: match &self.origin {
                ResourceOrigin::Stored(_) => "store",
                ResourceOrigin::Bundle { .. } => "bundle",
                ResourceOrigin::External => "external",
            },
            members: match &self.origin {
                ResourceOrigin::Bundle { bundle, .. } => {
                    bundle.members().iter().map(ToString::to_string).collect()
                }
                _ => Vec::new(),
            },
        }
    }
}

/// Flat view of a [`Resource`]
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub identifier: String,
    pub request_path: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    pub origin: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}
