//! Resource handler
//!
//! [`ResourceHandler`] wires the services together for a host: one store, one registry, one
//! integrity cache, an optional content cache and the resolution pipeline assembled from
//! the configuration. Hosts hold a single handler for the lifetime of the process.

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;

use crate::builder::{BuildReport, BundleBuilder};
use crate::bundle::{BundleRegistry, ConcatenatedStream};
use crate::cache::ContentCache;
use crate::config::CompiledConfig;
use crate::document::DocumentTree;
use crate::error::{Result, resource};
use crate::expression::{ExpressionEvaluator, NoEvaluation};
use crate::headers;
use crate::integrity::{ContentSource, IntegrityCache};
use crate::pipeline::dispatcher::{Dispatcher, RequestPaths};
use crate::pipeline::{Pipeline, ResourceRequest};
use crate::resource::{Resource, ResourceIdentifier, ResourceOrigin};
use crate::store::{ByteStream, ResourceStore, read_and_close};

/// Entry point for resolving, serving and bundling resources
pub struct ResourceHandler {
    store: Arc<dyn ResourceStore>,
    config: Arc<CompiledConfig>,
    integrity: Arc<IntegrityCache>,
    registry: Arc<BundleRegistry>,
    content: Option<ContentCache>,
    pipeline: Pipeline,
    evaluator: Box<dyn ExpressionEvaluator>,
}

impl ResourceHandler {
    pub fn new(store: Arc<dyn ResourceStore>, config: CompiledConfig) -> Self {
        Self::with_evaluator(store, config, Box::new(NoEvaluation))
    }

    /// Create a handler whose templates are evaluated by `evaluator` unless a request
    /// brings its own
    pub fn with_evaluator(
        store: Arc<dyn ResourceStore>,
        config: CompiledConfig,
        evaluator: Box<dyn ExpressionEvaluator>,
    ) -> Self {
        let config = Arc::new(config);
        let integrity = Arc::new(IntegrityCache::new());
        let registry = Arc::new(BundleRegistry::new(
            Arc::clone(&store),
            Arc::clone(&integrity),
            config.stage,
        ));
        let content = config.cache_ttl.map(ContentCache::new);
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            RequestPaths::from_config(&config),
        );
        let pipeline = Pipeline::from_config(&config, Box::new(dispatcher));

        Self {
            store,
            config,
            integrity,
            registry,
            content,
            pipeline,
            evaluator,
        }
    }

    pub fn config(&self) -> &CompiledConfig {
        &self.config
    }

    pub fn registry(&self) -> &BundleRegistry {
        &self.registry
    }

    pub fn integrity_cache(&self) -> &IntegrityCache {
        &self.integrity
    }

    pub fn content_cache(&self) -> Option<&ContentCache> {
        self.content.as_ref()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Resolve an identifier with the handler's evaluator
    pub fn resolve(&self, id: &ResourceIdentifier) -> Option<Resource> {
        self.resolve_with(id, self.evaluator.as_ref())
    }

    pub fn resolve_with(
        &self,
        id: &ResourceIdentifier,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Option<Resource> {
        self.pipeline.resolve(ResourceRequest::new(id, evaluator))
    }

    /// Open the body of a resolved resource
    ///
    /// Bundles are concatenated from their members, or served from the content cache when
    /// one is configured.
    pub fn open(&self, resource: &Resource) -> Result<Box<dyn ByteStream>> {
        match &resource.origin {
            ResourceOrigin::Stored(stored) => Ok(self.store.open(stored)?),
            ResourceOrigin::Bundle { resolved, .. } => {
                let Some(cache) = &self.content else {
                    let stream =
                        ConcatenatedStream::new(Arc::clone(&self.store), resolved.resources.clone())?;
                    return Ok(Box::new(stream));
                };

                let key = content_key(&resource.identifier, resolved.last_modified);
                let bytes = cache.get_or_load(&key, || {
                    let stream =
                        ConcatenatedStream::new(Arc::clone(&self.store), resolved.resources.clone())?;
                    read_and_close(Box::new(stream), |stream| {
                        let mut bytes = Vec::new();
                        stream.read_to_end(&mut bytes)?;
                        Ok(bytes)
                    })
                })?;
                Ok(Box::new(Cursor::new(bytes)))
            }
            ResourceOrigin::External => Err(resource::external(
                resource.identifier.to_string(),
                resource.request_path.clone(),
            )),
        }
    }

    /// Subresource integrity value for an identifier, `""` when it cannot be computed
    pub fn integrity(&self, id: &ResourceIdentifier) -> String {
        self.integrity.integrity(id, self)
    }

    /// Rewrite a document to reference bundles
    pub fn build(&self, tree: &mut dyn DocumentTree) -> Result<BuildReport> {
        BundleBuilder::new(&self.registry, &self.config, self.config.as_ref()).build(tree)
    }

    /// Response headers for a resolved resource, with `Expires` relative to now
    pub fn response_headers(&self, resource: &Resource) -> IndexMap<String, String> {
        headers::response_headers(resource, self.config.max_age, SystemTime::now())
    }

    /// Forget every registered bundle and cached value
    pub fn reset(&self) {
        self.registry.clear();
        self.integrity.clear();
        if let Some(cache) = &self.content {
            let stats = cache.stats();
            cache.clear();
            tracing::debug!(
                entries = stats.entries,
                size = %stats.formatted_size(),
                "cleared content cache"
            );
        }
        tracing::debug!("cleared bundle registry and integrity cache");
    }
}

impl ContentSource for ResourceHandler {
    fn open_content(&self, id: &ResourceIdentifier) -> Result<Box<dyn ByteStream>> {
        let resource = self
            .resolve(id)
            .ok_or_else(|| resource::not_found(id.to_string()))?;
        self.open(&resource)
    }
}

/// Cache key that changes whenever a member changes
fn content_key(id: &ResourceIdentifier, last_modified: SystemTime) -> String {
    let millis = last_modified
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("{id}@{millis}")
}

impl std::fmt::Debug for ResourceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandler")
            .field("stages", &self.pipeline.stage_names())
            .field("bundles", &self.registry.len())
            .field("integrity_entries", &self.integrity.len())
            .finish_non_exhaustive()
    }
}
