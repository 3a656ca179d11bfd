//! Process-wide bundle registry
//!
//! Maps bundle ids to [`Bundle`]s. Lookups of ids that were never registered in this
//! process fall back to decoding the id, so bundle URLs keep working after a restart.

use std::sync::Arc;

use dashmap::DashMap;

use super::{BUNDLE_LIBRARY, Bundle, ResolvedBundle, ResolvedState, decode_id};
use crate::config::ProjectStage;
use crate::error::Result;
use crate::integrity::IntegrityCache;
use crate::resource::ResourceIdentifier;
use crate::store::ResourceStore;

/// Registry of every bundle seen by this process
pub struct BundleRegistry {
    bundles: DashMap<String, Arc<Bundle>>,
    store: Arc<dyn ResourceStore>,
    integrity: Arc<IntegrityCache>,
    stage: ProjectStage,
}

impl BundleRegistry {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        integrity: Arc<IntegrityCache>,
        stage: ProjectStage,
    ) -> Self {
        Self {
            bundles: DashMap::new(),
            store,
            integrity,
            stage,
        }
    }

    /// Return the registered bundle for these members, registering it if needed
    ///
    /// Concurrent calls with the same members may both build a bundle; the entry that ends
    /// up registered is equivalent either way.
    pub fn get_or_create(
        &self,
        members: impl IntoIterator<Item = ResourceIdentifier>,
    ) -> Result<Arc<Bundle>> {
        let bundle = Bundle::new(members)?;
        if let Some(existing) = self.bundles.get(bundle.id()) {
            return Ok(Arc::clone(existing.value()));
        }

        let entry = self
            .bundles
            .entry(bundle.id().to_string())
            .or_insert_with(|| Arc::new(bundle));
        Ok(Arc::clone(entry.value()))
    }

    /// Look up a bundle by id, reconstructing it from the id when not registered
    ///
    /// Returns `None` for ids that do not decode, e.g. forged or truncated ones.
    pub fn get(&self, id: &str) -> Option<Arc<Bundle>> {
        if let Some(existing) = self.bundles.get(id) {
            return Some(Arc::clone(existing.value()));
        }

        let members = match decode_id(id) {
            Ok(members) => members,
            Err(e) => {
                tracing::debug!(bundle = id, error = %e, "rejecting undecodable bundle id");
                return None;
            }
        };

        // Register under the canonical id of the decoded members, and also under the
        // requested id, so equivalent spellings resolve to one bundle.
        let bundle = self.get_or_create(members).ok()?;
        if bundle.id() != id {
            self.bundles.insert(id.to_string(), Arc::clone(&bundle));
        }
        Some(bundle)
    }

    /// Resolved metadata of a bundle, resolving its members when needed
    ///
    /// Members are resolved once per bundle in production and on every access in
    /// development. `None` means at least one member could not be found.
    pub fn resolve(&self, bundle: &Bundle) -> Option<ResolvedBundle> {
        let mut state = bundle.state.lock();
        if !state.resolved || self.stage.is_development() {
            self.resolve_members(bundle, &mut state);
        }
        state.snapshot()
    }

    fn resolve_members(&self, bundle: &Bundle, state: &mut ResolvedState) {
        let previous = state.last_modified;
        let mut resources = Vec::with_capacity(bundle.members().len());
        let mut total_length = 0u64;
        let mut last_modified = None;

        for member in bundle.members() {
            let Some(resource) = self.store.resolve(member) else {
                tracing::warn!(
                    bundle = bundle.id(),
                    member = %member,
                    "bundle member not found, serving bundle as not found"
                );
                state.resources.clear();
                state.total_length = 0;
                state.resolved = false;
                return;
            };

            total_length += resource.content_length;
            last_modified = last_modified.max(Some(resource.last_modified));
            resources.push(resource);
        }

        if previous.is_some() && previous != last_modified {
            let removed = self
                .integrity
                .invalidate_prefix(&format!("{}:{}", BUNDLE_LIBRARY, bundle.id()));
            tracing::debug!(
                bundle = bundle.id(),
                invalidated = removed,
                "bundle content changed"
            );
        }

        state.resources = resources;
        state.total_length = total_length;
        state.last_modified = last_modified;
        state.resolved = true;
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Forget every registered bundle
    pub fn clear(&self) {
        self.bundles.clear();
    }
}
