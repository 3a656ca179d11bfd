//! Cache-busting version stamps
//!
//! Appends `v=<token>` to internal request paths so that clients fetch a fresh copy after
//! a change. Bundles are stamped with their last modification in minutes; plain resources
//! with the configured version string.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{Next, RequestPaths, ResolutionStage, ResourceRequest};
use crate::config::CompiledConfig;
use crate::expression::ExpressionEvaluator;
use crate::resource::{Resource, ResourceOrigin};

/// Query parameter carrying the version token
pub const VERSION_PARAM: &str = "v";

pub struct VersionStage {
    config: Arc<CompiledConfig>,
    paths: RequestPaths,
}

impl VersionStage {
    pub fn new(config: Arc<CompiledConfig>, paths: RequestPaths) -> Self {
        Self { config, paths }
    }

    fn token(&self, resource: &Resource, evaluator: &dyn ExpressionEvaluator) -> Option<String> {
        match &resource.origin {
            ResourceOrigin::Bundle { resolved, .. } => {
                Some(minutes_since_epoch(resolved.last_modified).to_string())
            }
            ResourceOrigin::Stored(_) => {
                let version = evaluator.evaluate(self.config.version.as_deref()?);
                let version = version.trim();
                (!version.is_empty()).then(|| version.to_string())
            }
            ResourceOrigin::External => None,
        }
    }
}

impl ResolutionStage for VersionStage {
    fn name(&self) -> &'static str {
        "version"
    }

    fn resolve(&self, request: ResourceRequest<'_>, next: Next<'_>) -> Option<Resource> {
        let mut resource = next.resolve(request)?;

        if resource.has_query_param(VERSION_PARAM)
            || !self.paths.is_internal(&resource.request_path)
            || self.config.is_page(resource.identifier.name())
        {
            return Some(resource);
        }

        if let Some(token) = self.token(&resource, request.evaluator) {
            resource.append_query_param(VERSION_PARAM, &token);
        }
        Some(resource)
    }
}

/// Minute-resolution token, stable across sub-minute filesystem timestamp noise
pub fn minutes_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() / 60)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Bundle, BundleKind, ResolvedBundle};
    use crate::config::BundlingConfig;
    use crate::expression::{NoEvaluation, VariableEvaluator};
    use crate::pipeline::{Pipeline, Terminal};
    use crate::resource::ResourceIdentifier;
    use crate::store::StoredResource;
    use std::time::Duration;

    /// Serves a stored resource, or a bundle for names in the bundle library
    struct Fixed {
        path: String,
    }

    impl Terminal for Fixed {
        fn resolve(&self, request: ResourceRequest<'_>) -> Option<Resource> {
            let id = request.identifier.clone();
            let stored = StoredResource {
                identifier: id.clone(),
                content_length: 1,
                last_modified: UNIX_EPOCH + Duration::from_secs(600),
                mime_type: "text/css".to_string(),
            };
            if id.library() == Some("combres") {
                let bundle = Arc::new(Bundle::new([id.clone()]).unwrap());
                let resolved = ResolvedBundle {
                    resources: vec![stored.clone()],
                    total_length: 1,
                    last_modified: UNIX_EPOCH + Duration::from_secs(6_000),
                };
                return Some(Resource::bundle(
                    id,
                    self.path.clone(),
                    bundle,
                    BundleKind::Stylesheet,
                    resolved,
                ));
            }
            Some(Resource::stored(stored, self.path.clone()))
        }
    }

    fn stage_pipeline(yaml: &str, path: &str) -> Pipeline {
        let config = CompiledConfig::compile(&BundlingConfig::from_yaml(yaml).unwrap()).unwrap();
        let config = Arc::new(config);
        let paths = RequestPaths::from_config(&config);
        Pipeline::new(
            vec![Box::new(VersionStage::new(config, paths))],
            Box::new(Fixed {
                path: path.to_string(),
            }),
        )
    }

    fn stamped(pipeline: &Pipeline, id: &str, eval: &dyn ExpressionEvaluator) -> String {
        let id = ResourceIdentifier::parse(id).unwrap();
        pipeline
            .resolve(ResourceRequest::new(&id, eval))
            .unwrap()
            .request_path
    }

    #[test]
    fn test_plain_resource_gets_configured_version() {
        let pipeline = stage_pipeline("version: \"1.4.2\"", "/resources/a.css?ln=lib");
        assert_eq!(
            stamped(&pipeline, "lib:a.css", &NoEvaluation),
            "/resources/a.css?ln=lib&v=1.4.2"
        );
    }

    #[test]
    fn test_no_version_configured_leaves_plain_resource_alone() {
        let pipeline = stage_pipeline("", "/resources/a.css?ln=lib");
        assert_eq!(
            stamped(&pipeline, "lib:a.css", &NoEvaluation),
            "/resources/a.css?ln=lib"
        );
    }

    #[test]
    fn test_bundle_gets_minute_token() {
        let pipeline = stage_pipeline("", "/resources/x.css?ln=combres");
        assert_eq!(
            stamped(&pipeline, "combres:x.css", &NoEvaluation),
            "/resources/x.css?ln=combres&v=100"
        );
    }

    #[test]
    fn test_existing_version_is_kept() {
        let pipeline = stage_pipeline("version: \"2\"", "/resources/a.css?ln=lib&v=1");
        assert_eq!(
            stamped(&pipeline, "lib:a.css", &NoEvaluation),
            "/resources/a.css?ln=lib&v=1"
        );
    }

    #[test]
    fn test_stamping_twice_yields_one_version() {
        let config = Arc::new(
            CompiledConfig::compile(&BundlingConfig::from_yaml("version: \"2\"").unwrap()).unwrap(),
        );
        let paths = RequestPaths::from_config(&config);
        let stage = || -> Box<dyn ResolutionStage> {
            Box::new(VersionStage::new(Arc::clone(&config), paths.clone()))
        };
        let pipeline = Pipeline::new(
            vec![stage(), stage()],
            Box::new(Fixed {
                path: "/resources/a.css?ln=lib".to_string(),
            }),
        );

        let path = stamped(&pipeline, "lib:a.css", &NoEvaluation);
        assert_eq!(path.matches("v=").count(), 1);
    }

    #[test]
    fn test_external_and_page_paths_are_not_stamped() {
        let external = stage_pipeline("version: \"2\"", "https://cdn.example/resources/a.css");
        assert_eq!(
            stamped(&external, "lib:a.css", &NoEvaluation),
            "https://cdn.example/resources/a.css"
        );

        let page = stage_pipeline("version: \"2\"", "/resources/index.xhtml?ln=lib");
        assert_eq!(
            stamped(&page, "lib:index.xhtml", &NoEvaluation),
            "/resources/index.xhtml?ln=lib"
        );
    }

    #[test]
    fn test_templated_version_is_evaluated() {
        let pipeline = stage_pipeline("version: \"#{build}\"", "/resources/a.css?ln=lib");
        let mut eval = VariableEvaluator::default();
        assert_eq!(
            stamped(&pipeline, "lib:a.css", &eval),
            "/resources/a.css?ln=lib"
        );
        eval.set("build", "42");
        assert_eq!(
            stamped(&pipeline, "lib:a.css", &eval),
            "/resources/a.css?ln=lib&v=42"
        );
    }
}
