//! Bundles of merged resources
//!
//! A [`Bundle`] is an ordered, duplicate-free list of member identifiers whose id encodes
//! that list (see [`id`]). Metadata of the members (sizes, modification times) is resolved
//! lazily by the [`BundleRegistry`] and kept on the bundle behind its own lock.

pub mod id;
pub mod registry;
pub mod stream;

use std::time::SystemTime;

use indexmap::IndexSet;
use parking_lot::Mutex;

use crate::error::Result;
use crate::resource::ResourceIdentifier;
use crate::store::StoredResource;

pub use id::{build_id, decode_id};
pub use registry::BundleRegistry;
pub use stream::ConcatenatedStream;

/// Library namespace under which bundles are addressed
pub const BUNDLE_LIBRARY: &str = "combres";

/// What a bundle concatenates, derived from the extension of its resource name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    Stylesheet,
    Script,
}

impl BundleKind {
    pub fn extension(self) -> &'static str {
        match self {
            BundleKind::Stylesheet => ".css",
            BundleKind::Script => ".js",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            BundleKind::Stylesheet => "text/css",
            BundleKind::Script => "application/javascript",
        }
    }

    /// Split a bundle resource name such as `<id>.css` into id and kind
    pub fn split_name(name: &str) -> Option<(&str, BundleKind)> {
        if let Some(id) = name.strip_suffix(BundleKind::Stylesheet.extension()) {
            return Some((id, BundleKind::Stylesheet));
        }
        name.strip_suffix(BundleKind::Script.extension())
            .map(|id| (id, BundleKind::Script))
    }

    /// The identifier under which a bundle of this kind is requested
    pub fn identifier(self, bundle_id: &str) -> Result<ResourceIdentifier> {
        ResourceIdentifier::new(
            Some(BUNDLE_LIBRARY),
            &format!("{}{}", bundle_id, self.extension()),
        )
    }
}

/// Aggregate metadata of a fully resolved bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundle {
    /// Members in declaration order
    pub resources: Vec<StoredResource>,
    /// Sum of member lengths
    pub total_length: u64,
    /// Most recent member modification time
    pub last_modified: SystemTime,
}

impl ResolvedBundle {
    /// Length of the concatenated body, separators included
    pub fn served_length(&self) -> u64 {
        self.total_length + (stream::SEPARATOR.len() * self.resources.len()) as u64
    }
}

#[derive(Debug, Default)]
pub(crate) struct ResolvedState {
    pub(crate) resolved: bool,
    pub(crate) resources: Vec<StoredResource>,
    pub(crate) total_length: u64,
    pub(crate) last_modified: Option<SystemTime>,
}

impl ResolvedState {
    fn snapshot(&self) -> Option<ResolvedBundle> {
        if self.resources.is_empty() {
            return None;
        }
        Some(ResolvedBundle {
            resources: self.resources.clone(),
            total_length: self.total_length,
            last_modified: self.last_modified?,
        })
    }
}

/// An ordered set of resources served as one concatenated artifact
#[derive(Debug)]
pub struct Bundle {
    id: String,
    members: IndexSet<ResourceIdentifier>,
    pub(crate) state: Mutex<ResolvedState>,
}

impl Bundle {
    /// Create a bundle, deduplicating members while keeping first occurrences
    pub fn new(members: impl IntoIterator<Item = ResourceIdentifier>) -> Result<Self> {
        let members: IndexSet<ResourceIdentifier> = members.into_iter().collect();
        let id = build_id(&members)?;
        Ok(Self::with_id(id, members))
    }

    pub(crate) fn with_id(id: String, members: IndexSet<ResourceIdentifier>) -> Self {
        Self {
            id,
            members,
            state: Mutex::new(ResolvedState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &IndexSet<ResourceIdentifier> {
        &self.members
    }

    /// Last resolved metadata, if the bundle was resolved and all members were found
    pub fn resolved(&self) -> Option<ResolvedBundle> {
        self.state.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ResourceIdentifier {
        ResourceIdentifier::parse(s).unwrap()
    }

    #[test]
    fn test_bundle_dedupes_keeping_first_occurrence() {
        let bundle = Bundle::new([id("lib:a.js"), id("lib:b.js"), id("lib:a.js")]).unwrap();
        let members: Vec<String> = bundle.members().iter().map(ToString::to_string).collect();
        assert_eq!(members, vec!["lib:a.js", "lib:b.js"]);
    }

    #[test]
    fn test_bundle_id_depends_only_on_member_order() {
        let first = Bundle::new([id("lib:a.js"), id("lib:b.js")]).unwrap();
        let second = Bundle::new([id("lib:a.js"), id("lib:b.js"), id("lib:b.js")]).unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(decode_id(first.id()).unwrap().len(), 2);
    }

    #[test]
    fn test_unresolved_bundle_has_no_metadata() {
        let bundle = Bundle::new([id("lib:a.js")]).unwrap();
        assert!(bundle.resolved().is_none());
    }

    #[test]
    fn test_served_length_counts_separators() {
        let member = |name: &str, content_length| StoredResource {
            identifier: id(name),
            content_length,
            last_modified: SystemTime::UNIX_EPOCH,
            mime_type: "text/css".to_string(),
        };
        let resolved = ResolvedBundle {
            resources: vec![member("lib:a.css", 3), member("lib:b.css", 0)],
            total_length: 3,
            last_modified: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(resolved.total_length, 3);
        assert_eq!(resolved.served_length(), 7);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            BundleKind::split_name("abc.css"),
            Some(("abc", BundleKind::Stylesheet))
        );
        assert_eq!(
            BundleKind::split_name("abc.js"),
            Some(("abc", BundleKind::Script))
        );
        assert_eq!(BundleKind::split_name("abc.png"), None);
    }

    #[test]
    fn test_kind_identifier() {
        let identifier = BundleKind::Script.identifier("abc").unwrap();
        assert_eq!(identifier.to_string(), "combres:abc.js");
    }
}
