//! Default library fallback
//!
//! Documents often reference application resources by bare name. When such a request
//! finds nothing, it is retried under the configured default library.

use super::{Next, ResolutionStage, ResourceRequest};
use crate::resource::Resource;

pub struct DefaultsStage {
    default_library: Option<String>,
}

impl DefaultsStage {
    pub fn new(default_library: Option<String>) -> Self {
        Self { default_library }
    }
}

impl ResolutionStage for DefaultsStage {
    fn name(&self) -> &'static str {
        "defaults"
    }

    fn resolve(&self, request: ResourceRequest<'_>, next: Next<'_>) -> Option<Resource> {
        if let Some(resource) = next.resolve(request) {
            return Some(resource);
        }
        if request.identifier.library().is_some() {
            return None;
        }

        let library = self.default_library.as_deref()?;
        let qualified = request.identifier.with_library(Some(library)).ok()?;
        tracing::debug!(
            resource = %request.identifier,
            library,
            "retrying unqualified resource in default library"
        );
        next.resolve(request.for_identifier(&qualified))
    }
}
