//! Configuration file handling for combres
//!
//! This module contains:
//! - [`BundlingConfig`]: the `combres.yaml` document as written by users
//! - [`CdnTable`]: the compiled CDN redirection table
//! - [`CompiledConfig`]: the validated, ready-to-use form built once at startup

pub mod cdn;
pub mod compiled;


use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, config};

pub use cdn::CdnTable;
pub use compiled::CompiledConfig;

/// Name of the configuration file looked up in the user's config directory
pub const CONFIG_FILE: &str = "combres.yaml";

/// Environment variable pointing at a configuration file
pub const CONFIG_ENV: &str = "COMBRES_CONFIG";

pub const DEFAULT_RESOURCE_PREFIX: &str = "/resources";

/// One week
pub const DEFAULT_MAX_AGE: i64 = 604_800;

pub const DEFAULT_SOURCE_MAP_PATTERN: &str = "*.map";

/// Project stage, which decides how eagerly cached metadata is re-validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStage {
    #[default]
    Production,
    Development,
}

impl ProjectStage {
    pub fn is_development(self) -> bool {
        self == ProjectStage::Development
    }
}

/// A switch that is either fixed or evaluated per request from a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle {
    Fixed(bool),
    Template(String),
}

impl Default for Toggle {
    fn default() -> Self {
        Toggle::Fixed(false)
    }
}

/// Routing artifact wrapped around internal resource URLs by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Bundling configuration (combres.yaml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundlingConfig {
    pub stage: ProjectStage,

    /// Path segment under which resources are served
    pub resource_prefix: String,

    pub routing: Routing,

    /// Identifiers never merged into bundles
    pub exclude: Vec<String>,

    /// Identifiers removed from documents and never bundled
    pub suppress: Vec<String>,

    pub inline_css: bool,
    pub inline_js: bool,

    /// Seconds bundle content stays cached, 0 disables the content cache
    pub cache_ttl: i64,

    /// Seconds clients may cache responses
    pub max_age: i64,

    /// Entries of the form `library:name=URL`
    pub cdn: Vec<String>,

    pub cdn_disabled: Toggle,

    /// Version stamped onto plain resources, may be a template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Where source maps live relative to a resource, `None` disables lookup
    pub source_map_pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_library: Option<String>,

    /// Suffixes of page-like resources that never get a version stamp
    pub page_suffixes: Vec<String>,

    /// Members of each vendor resource library
    pub libraries: IndexMap<String, Vec<String>>,
}

impl Default for BundlingConfig {
    fn default() -> Self {
        Self {
            stage: ProjectStage::default(),
            resource_prefix: DEFAULT_RESOURCE_PREFIX.to_string(),
            routing: Routing::default(),
            exclude: Vec::new(),
            suppress: Vec::new(),
            inline_css: false,
            inline_js: false,
            cache_ttl: 0,
            max_age: DEFAULT_MAX_AGE,
            cdn: Vec::new(),
            cdn_disabled: Toggle::default(),
            version: None,
            source_map_pattern: Some(DEFAULT_SOURCE_MAP_PATTERN.to_string()),
            default_library: None,
            page_suffixes: vec![".xhtml".to_string(), ".html".to_string()],
            libraries: IndexMap::new(),
        }
    }
}

impl BundlingConfig {
    /// Parse configuration from a YAML string and validate it
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(config::not_found(path.display().to_string()));
        }
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| config::read_failed(path.display().to_string(), e.to_string()))?;
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&yaml)
                .map_err(|e| config::parse_failed(path.display().to_string(), e.to_string()))?
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load from an explicit path, or from the default location when it exists
    ///
    /// An explicit path that does not exist is an error; a missing default file yields the
    /// default configuration.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match default_path() {
                Some(path) if path.is_file() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Serialize configuration to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check every rule that can be checked without serving a request
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl < 0 {
            return Err(config::invalid(format!(
                "cache_ttl must not be negative, got {}",
                self.cache_ttl
            )));
        }
        if self.max_age < 0 {
            return Err(config::invalid(format!(
                "max_age must not be negative, got {}",
                self.max_age
            )));
        }
        if self.routing.prefix.is_some() && self.routing.suffix.is_some() {
            return Err(config::invalid(
                "routing takes either a prefix or a suffix, not both",
            ));
        }
        if !self.resource_prefix.starts_with('/') {
            return Err(config::invalid(format!(
                "resource_prefix must start with '/', got '{}'",
                self.resource_prefix
            )));
        }
        if let Some(pattern) = &self.source_map_pattern {
            if pattern.matches('*').count() != 1 {
                return Err(config::invalid(format!(
                    "source_map_pattern must contain exactly one '*', got '{pattern}'"
                )));
            }
        }

        // Compiling parses every identifier and CDN entry
        CompiledConfig::compile(self).map(|_| ())
    }
}

/// Default configuration file location, `<config_dir>/combres/combres.yaml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("combres").join(CONFIG_FILE))
}
