//! Combres - resource bundling, versioning and caching engine
//!
//! Combres sits between server-rendered documents and the resources they reference. It
//! rewrites documents so that runs of stylesheets and scripts collapse into bundles,
//! resolves identifiers through a pipeline of stages (default library, CDN, source maps,
//! versioning, URL unmapping) and serves bundle bodies by concatenating their members.
//!
//! The usual entry point is [`handler::ResourceHandler`]:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use combres::config::{BundlingConfig, CompiledConfig};
//! use combres::document::Document;
//! use combres::handler::ResourceHandler;
//! use combres::store::FsResourceStore;
//!
//! # fn main() -> combres::error::Result<()> {
//! let config = CompiledConfig::compile(&BundlingConfig::load("combres.yaml".as_ref())?)?;
//! let store = Arc::new(FsResourceStore::new("resources")?);
//! let handler = ResourceHandler::new(store, config);
//!
//! let mut page = Document::load("page.yaml".as_ref())?;
//! handler.build(&mut page)?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod bundle;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod expression;
pub mod handler;
pub mod headers;
pub mod integrity;
pub mod pipeline;
pub mod resource;
pub mod store;
