//! CDN redirection
//!
//! Resources listed in the CDN table are served from their external URL. The local
//! resource, when there is one, keeps providing metadata and content; only the request
//! path changes, so nothing downstream stamps or unmaps the external URL.

use std::sync::Arc;

use super::{Next, ResolutionStage, ResourceRequest};
use crate::config::CompiledConfig;
use crate::resource::Resource;

pub struct CdnStage {
    config: Arc<CompiledConfig>,
}

impl CdnStage {
    pub fn new(config: Arc<CompiledConfig>) -> Self {
        Self { config }
    }
}

impl ResolutionStage for CdnStage {
    fn name(&self) -> &'static str {
        "cdn"
    }

    fn resolve(&self, request: ResourceRequest<'_>, next: Next<'_>) -> Option<Resource> {
        if self.config.cdn_disabled(request.evaluator) {
            return next.resolve(request);
        }
        let Some(url) = self.config.cdn.url_for(request.identifier, request.evaluator) else {
            return next.resolve(request);
        };

        let resource = match next.resolve(request) {
            Some(mut local) => {
                local.request_path = url;
                local
            }
            None => Resource::external(request.identifier.clone(), url),
        };
        Some(resource)
    }
}
