//! Command helper utilities

use std::path::PathBuf;
use std::sync::Arc;

use combres::config::{BundlingConfig, CompiledConfig};
use combres::error::Result;
use combres::expression::VariableEvaluator;
use combres::handler::ResourceHandler;
use combres::resource::ResourceIdentifier;
use combres::store::FsResourceStore;

/// Global options shared by every command that touches resources
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub root: PathBuf,
    pub vars: Vec<(String, String)>,
}

/// A handler over the filesystem store, plus the store itself for listing
pub struct Session {
    pub handler: ResourceHandler,
    pub store: Arc<FsResourceStore>,
}

/// Load configuration and open the resource root
pub fn open_session(options: &GlobalOptions) -> Result<Session> {
    let raw = BundlingConfig::discover(options.config.as_deref())?;
    let config = CompiledConfig::compile(&raw)?;
    let store = Arc::new(FsResourceStore::new(&options.root)?);
    tracing::debug!(root = %store.root().display(), stage = ?config.stage, "opened resource root");

    let evaluator = VariableEvaluator::new(options.vars.iter().cloned());
    let handler =
        ResourceHandler::with_evaluator(store.clone(), config, Box::new(evaluator));
    Ok(Session { handler, store })
}

pub fn parse_identifier(raw: &str) -> Result<ResourceIdentifier> {
    ResourceIdentifier::parse(raw.trim())
}
