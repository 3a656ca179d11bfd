//! CDN redirection table
//!
//! Entries map an identifier to an external URL. A wildcard entry `library:*=prefix/*`
//! covers every resource of a library; the requested name replaces the URL's last `*`.

use std::collections::HashMap;

use crate::error::{Result, config};
use crate::expression::ExpressionEvaluator;
use crate::resource::ResourceIdentifier;
use crate::resource::identifier::WILDCARD;

/// Compiled CDN entries keyed by identifier, wildcards keyed as `{library, "*"}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdnTable {
    entries: HashMap<ResourceIdentifier, String>,
}

impl CdnTable {
    /// Parse `library:name=URL` entries, failing on the first malformed one
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut table = HashMap::new();

        for raw in entries {
            let raw = raw.as_ref();
            let (id, url) = parse_entry(raw)?;
            if id.is_wildcard() && table.contains_key(&id) {
                return Err(config::invalid_cdn_entry(
                    raw,
                    format!(
                        "library '{}' already has a wildcard entry",
                        id.library().unwrap_or_default()
                    ),
                ));
            }
            table.insert(id, url);
        }

        Ok(Self { entries: table })
    }

    /// Whether the identifier is redirected, directly or through its library's wildcard
    pub fn is_mapped(&self, id: &ResourceIdentifier) -> bool {
        self.entry_for(id).is_some()
    }

    /// The CDN URL for an identifier, with templates evaluated
    pub fn url_for(
        &self,
        id: &ResourceIdentifier,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Option<String> {
        let (template, wildcard) = self.entry_for(id)?;
        let url = evaluator.evaluate(template);
        if !wildcard {
            return Some(url);
        }

        match url.rsplit_once(WILDCARD) {
            Some((before, after)) => Some(format!("{before}{}{after}", id.name())),
            None => {
                tracing::warn!(
                    resource = %id,
                    url = %url,
                    "evaluated wildcard CDN URL has no '*', ignoring"
                );
                None
            }
        }
    }

    fn entry_for(&self, id: &ResourceIdentifier) -> Option<(&str, bool)> {
        if let Some(url) = self.entries.get(id) {
            return Some((url.as_str(), id.is_wildcard()));
        }
        let wildcard = ResourceIdentifier::wildcard(id.library()?).ok()?;
        self.entries.get(&wildcard).map(|url| (url.as_str(), true))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entry(raw: &str) -> Result<(ResourceIdentifier, String)> {
    let Some((id, url)) = raw.split_once('=') else {
        return Err(config::invalid_cdn_entry(raw, "missing '=' between identifier and URL"));
    };
    let url = url.trim();
    if url.is_empty() {
        return Err(config::invalid_cdn_entry(raw, "URL is empty"));
    }

    let id = ResourceIdentifier::parse(id.trim())
        .map_err(|e| config::invalid_cdn_entry(raw, e.to_string()))?;

    if id.is_wildcard() {
        if id.library().is_none() {
            return Err(config::invalid_cdn_entry(
                raw,
                "a wildcard entry needs a library",
            ));
        }
        if !url.contains(WILDCARD) {
            return Err(config::invalid_cdn_entry(
                raw,
                "the URL of a wildcard entry must contain '*'",
            ));
        }
    } else if url.contains(WILDCARD) {
        return Err(config::invalid_cdn_entry(
            raw,
            "only wildcard entries may use '*' in the URL",
        ));
    }

    Ok((id, url.to_string()))
}
