//! Removes the routing artifact from internal resource URLs
//!
//! With a routing prefix such as `/faces` or a suffix such as `.xhtml`, relative URLs
//! inside a stylesheet (`url(img/bg.png)`) would resolve against the routed path. Serving
//! resources under their plain path avoids that.

use super::{Next, RequestPaths, ResolutionStage, ResourceRequest};
use crate::resource::Resource;

pub struct UnmappingStage {
    paths: RequestPaths,
}

impl UnmappingStage {
    pub fn new(paths: RequestPaths) -> Self {
        Self { paths }
    }
}

impl ResolutionStage for UnmappingStage {
    fn name(&self) -> &'static str {
        "unmapping"
    }

    fn resolve(&self, request: ResourceRequest<'_>, next: Next<'_>) -> Option<Resource> {
        let mut resource = next.resolve(request)?;
        resource.request_path = self.paths.unmap(&resource.request_path);
        Some(resource)
    }
}
