//! Resource resolution pipeline
//!
//! A [`Pipeline`] is an immutable chain of [`ResolutionStage`]s ending in a terminal that
//! produces the actual resource (the [`Dispatcher`]). Each stage sees the rest of the chain
//! only through a [`Next`] handle and may pass the result through, replace it, or rewrite
//! it. Stages hold configuration fixed at startup and no per-request state.
//!
//! The order, outermost first, is
//! `defaults -> cdn -> source-map -> version -> unmapping -> dispatcher`.
//! Stages that have nothing to do under the given configuration are left out.

pub mod cdn;
pub mod defaults;
pub mod dispatcher;
pub mod source_map;
pub mod unmapping;
pub mod version;

use std::sync::Arc;

use crate::config::CompiledConfig;
use crate::expression::ExpressionEvaluator;
use crate::resource::{Resource, ResourceIdentifier};

pub use cdn::CdnStage;
pub use defaults::DefaultsStage;
pub use dispatcher::{Dispatcher, RequestPaths};
pub use source_map::SourceMapStage;
pub use unmapping::UnmappingStage;
pub use version::VersionStage;

/// One request for a resource
#[derive(Clone, Copy)]
pub struct ResourceRequest<'a> {
    pub identifier: &'a ResourceIdentifier,
    /// Evaluates templated configuration for this request
    pub evaluator: &'a dyn ExpressionEvaluator,
}

impl<'a> ResourceRequest<'a> {
    pub fn new(identifier: &'a ResourceIdentifier, evaluator: &'a dyn ExpressionEvaluator) -> Self {
        Self {
            identifier,
            evaluator,
        }
    }

    /// The same request for another identifier
    pub fn for_identifier<'b>(&self, identifier: &'b ResourceIdentifier) -> ResourceRequest<'b>
    where
        'a: 'b,
    {
        ResourceRequest {
            identifier,
            evaluator: self.evaluator,
        }
    }
}

/// A step of the resolution chain
pub trait ResolutionStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, request: ResourceRequest<'_>, next: Next<'_>) -> Option<Resource>;
}

/// The end of the chain, producing resources without delegating
pub trait Terminal: Send + Sync {
    fn resolve(&self, request: ResourceRequest<'_>) -> Option<Resource>;
}

/// Handle over the remainder of the chain
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Box<dyn ResolutionStage>],
    terminal: &'a dyn Terminal,
}

impl Next<'_> {
    pub fn resolve(self, request: ResourceRequest<'_>) -> Option<Resource> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.resolve(
                request,
                Next {
                    stages: rest,
                    terminal: self.terminal,
                },
            ),
            None => self.terminal.resolve(request),
        }
    }
}

/// An assembled resolution chain
pub struct Pipeline {
    stages: Vec<Box<dyn ResolutionStage>>,
    terminal: Box<dyn Terminal>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn ResolutionStage>>, terminal: Box<dyn Terminal>) -> Self {
        Self { stages, terminal }
    }

    /// Assemble the stages the configuration calls for around `terminal`
    pub fn from_config(config: &Arc<CompiledConfig>, terminal: Box<dyn Terminal>) -> Self {
        let paths = RequestPaths::from_config(config);
        let mut stages: Vec<Box<dyn ResolutionStage>> = Vec::new();

        stages.push(Box::new(DefaultsStage::new(config.default_library.clone())));
        if !config.cdn.is_empty() {
            stages.push(Box::new(CdnStage::new(Arc::clone(config))));
        }
        if let Some(pattern) = &config.source_map_pattern {
            stages.push(Box::new(SourceMapStage::new(pattern.clone())));
        }
        stages.push(Box::new(VersionStage::new(
            Arc::clone(config),
            paths.clone(),
        )));
        if paths.has_routing() {
            stages.push(Box::new(UnmappingStage::new(paths)));
        }

        let pipeline = Self::new(stages, terminal);
        tracing::debug!(stages = ?pipeline.stage_names(), "assembled resolution pipeline");
        pipeline
    }

    pub fn resolve(&self, request: ResourceRequest<'_>) -> Option<Resource> {
        Next {
            stages: &self.stages,
            terminal: self.terminal.as_ref(),
        }
        .resolve(request)
    }

    /// Stage names, outermost first
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}
