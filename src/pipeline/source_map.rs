//! Source map linkage
//!
//! Scripts and stylesheets that have a source map next to them get a `SourceMap` response
//! header pointing at it. Whether a map exists is looked up once per identifier.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Next, ResolutionStage, ResourceRequest};
use crate::resource::identifier::WILDCARD;
use crate::resource::{Resource, ResourceIdentifier, ResourceOrigin, SOURCE_MAP_HEADER};

pub struct SourceMapStage {
    /// Map name template, `*` stands for the resource name
    pattern: String,
    known: RwLock<HashMap<ResourceIdentifier, Option<String>>>,
}

impl SourceMapStage {
    pub fn new(pattern: String) -> Self {
        Self {
            pattern,
            known: RwLock::new(HashMap::new()),
        }
    }

    fn map_identifier(&self, id: &ResourceIdentifier) -> Option<ResourceIdentifier> {
        let name = self.pattern.replacen(WILDCARD, id.name(), 1);
        ResourceIdentifier::new(id.library(), &name).ok()
    }

    fn lookup(&self, request: ResourceRequest<'_>, next: Next<'_>) -> Option<String> {
        let id = request.identifier;
        if let Some(known) = self.known.read().get(id) {
            return known.clone();
        }

        let path = self.map_identifier(id).and_then(|map_id| {
            next.resolve(request.for_identifier(&map_id))
                .map(|map| map.request_path)
        });
        if let Some(path) = &path {
            tracing::debug!(resource = %id, source_map = %path, "found source map");
        }
        self.known.write().insert(id.clone(), path.clone());
        path
    }
}

impl ResolutionStage for SourceMapStage {
    fn name(&self) -> &'static str {
        "source-map"
    }

    fn resolve(&self, request: ResourceRequest<'_>, next: Next<'_>) -> Option<Resource> {
        let mut resource = next.resolve(request)?;

        let eligible = matches!(resource.origin, ResourceOrigin::Stored(_))
            && matches!(request.identifier.extension(), Some("js" | "css"));
        if eligible {
            if let Some(path) = self.lookup(request, next) {
                resource.headers.insert(SOURCE_MAP_HEADER.to_string(), path);
            }
        }
        Some(resource)
    }
}
