//! Validated configuration in the form the engine consumes

use std::time::Duration;

use indexmap::IndexMap;

use super::{BundlingConfig, CdnTable, ProjectStage, Routing, Toggle};
use crate::error::{Result, config};
use crate::expression::ExpressionEvaluator;
use crate::resource::{IdentifierSet, ResourceIdentifier};

/// Configuration with every identifier parsed and the CDN table built
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub stage: ProjectStage,
    pub resource_prefix: String,
    pub routing: Routing,
    pub exclude: IdentifierSet,
    pub suppress: IdentifierSet,
    pub inline_css: bool,
    pub inline_js: bool,
    /// `None` when the content cache is disabled
    pub cache_ttl: Option<Duration>,
    pub max_age: Duration,
    pub cdn: CdnTable,
    pub cdn_disabled: Toggle,
    pub version: Option<String>,
    pub source_map_pattern: Option<String>,
    pub default_library: Option<String>,
    pub page_suffixes: Vec<String>,
    pub libraries: IndexMap<ResourceIdentifier, Vec<ResourceIdentifier>>,
}

impl CompiledConfig {
    pub fn compile(raw: &BundlingConfig) -> Result<Self> {
        let cache_ttl = u64::try_from(raw.cache_ttl)
            .map_err(|_| config::invalid("cache_ttl must not be negative"))?;
        let max_age = u64::try_from(raw.max_age)
            .map_err(|_| config::invalid("max_age must not be negative"))?;

        if let Some(library) = &raw.default_library {
            ResourceIdentifier::new(Some(library), "probe")
                .map_err(|e| config::invalid(format!("default_library: {e}")))?;
        }

        let mut libraries = IndexMap::with_capacity(raw.libraries.len());
        for (name, members) in &raw.libraries {
            let key = parse_rule("libraries", name)?;
            let members = members
                .iter()
                .map(|member| parse_rule("libraries", member))
                .collect::<Result<Vec<_>>>()?;
            libraries.insert(key, members);
        }

        Ok(Self {
            stage: raw.stage,
            resource_prefix: raw.resource_prefix.trim_end_matches('/').to_string(),
            routing: raw.routing.clone(),
            exclude: parse_set("exclude", &raw.exclude)?,
            suppress: parse_set("suppress", &raw.suppress)?,
            inline_css: raw.inline_css,
            inline_js: raw.inline_js,
            cache_ttl: (cache_ttl > 0).then(|| Duration::from_secs(cache_ttl)),
            max_age: Duration::from_secs(max_age),
            cdn: CdnTable::parse(&raw.cdn)?,
            cdn_disabled: raw.cdn_disabled.clone(),
            version: raw.version.clone().filter(|v| !v.is_empty()),
            source_map_pattern: raw.source_map_pattern.clone(),
            default_library: raw.default_library.clone(),
            page_suffixes: raw.page_suffixes.clone(),
            libraries,
        })
    }

    /// Whether CDN redirection is switched off for the current request
    pub fn cdn_disabled(&self, evaluator: &dyn ExpressionEvaluator) -> bool {
        match &self.cdn_disabled {
            Toggle::Fixed(disabled) => *disabled,
            Toggle::Template(template) => evaluator
                .evaluate(template)
                .trim()
                .eq_ignore_ascii_case("true"),
        }
    }

    /// Whether an identifier is kept out of bundles, by rule or by CDN mapping
    pub fn is_excluded(&self, id: &ResourceIdentifier) -> bool {
        self.exclude.contains(id) || self.cdn.is_mapped(id)
    }

    pub fn is_suppressed(&self, id: &ResourceIdentifier) -> bool {
        self.suppress.contains(id)
    }

    /// Whether a resource name is page-like and therefore never version-stamped
    pub fn is_page(&self, name: &str) -> bool {
        self.page_suffixes
            .iter()
            .any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// Members of a vendor resource library, if it is configured
    pub fn library_members(&self, library: &ResourceIdentifier) -> Option<&[ResourceIdentifier]> {
        self.libraries.get(library).map(Vec::as_slice)
    }
}

fn parse_rule(key: &str, raw: &str) -> Result<ResourceIdentifier> {
    ResourceIdentifier::parse(raw.trim()).map_err(|e| config::invalid(format!("{key}: {e}")))
}

fn parse_set(key: &str, raw: &[String]) -> Result<IdentifierSet> {
    let entries = raw
        .iter()
        .map(|entry| parse_rule(key, entry))
        .collect::<Result<Vec<_>>>()?;
    Ok(IdentifierSet::new(entries))
}
