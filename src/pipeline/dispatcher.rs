//! Terminal stage: bundles from the registry, everything else from the store

use std::sync::Arc;

use super::{ResourceRequest, Terminal};
use crate::bundle::{BUNDLE_LIBRARY, BundleKind, BundleRegistry};
use crate::config::{CompiledConfig, Routing};
use crate::resource::{Resource, ResourceIdentifier};
use crate::store::ResourceStore;

/// Builds and recognizes the URLs under which resources are served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPaths {
    resource_prefix: String,
    routing: Routing,
}

impl RequestPaths {
    pub fn new(resource_prefix: impl Into<String>, routing: Routing) -> Self {
        Self {
            resource_prefix: resource_prefix.into(),
            routing,
        }
    }

    pub fn from_config(config: &CompiledConfig) -> Self {
        Self::new(config.resource_prefix.clone(), config.routing.clone())
    }

    pub fn has_routing(&self) -> bool {
        self.routing.prefix.is_some() || self.routing.suffix.is_some()
    }

    /// `{routing prefix}{resource prefix}/{name}{routing suffix}?ln={library}`
    pub fn request_path(&self, id: &ResourceIdentifier) -> String {
        let mut path = format!(
            "{}{}/{}{}",
            self.routing.prefix.as_deref().unwrap_or_default(),
            self.resource_prefix,
            id.name(),
            self.routing.suffix.as_deref().unwrap_or_default(),
        );
        if let Some(library) = id.library() {
            path.push_str("?ln=");
            path.push_str(library);
        }
        path
    }

    /// Whether a path points at this server's resource handler
    pub fn is_internal(&self, path: &str) -> bool {
        !path.contains("://")
            && !path.starts_with("//")
            && path.contains(&format!("{}/", self.resource_prefix))
    }

    /// Remove the routing prefix or suffix from an internal path, keeping its query
    pub fn unmap(&self, path: &str) -> String {
        if !self.is_internal(path) {
            return path.to_string();
        }

        let (mut location, query) = match path.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (path, None),
        };
        if let Some(prefix) = self.routing.prefix.as_deref() {
            location = location.strip_prefix(prefix).unwrap_or(location);
        }
        if let Some(suffix) = self.routing.suffix.as_deref() {
            location = location.strip_suffix(suffix).unwrap_or(location);
        }

        match query {
            Some(query) => format!("{location}?{query}"),
            None => location.to_string(),
        }
    }
}

/// Produces resources from the bundle registry or the resource store
pub struct Dispatcher {
    store: Arc<dyn ResourceStore>,
    registry: Arc<BundleRegistry>,
    paths: RequestPaths,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        registry: Arc<BundleRegistry>,
        paths: RequestPaths,
    ) -> Self {
        Self {
            store,
            registry,
            paths,
        }
    }

    fn resolve_bundle(&self, id: &ResourceIdentifier) -> Option<Resource> {
        let (bundle_id, kind) = BundleKind::split_name(id.name())?;
        let bundle = self.registry.get(bundle_id)?;
        let resolved = self.registry.resolve(&bundle)?;
        Some(Resource::bundle(
            id.clone(),
            self.paths.request_path(id),
            bundle,
            kind,
            resolved,
        ))
    }
}

impl Terminal for Dispatcher {
    fn resolve(&self, request: ResourceRequest<'_>) -> Option<Resource> {
        let id = request.identifier;
        if id.is_wildcard() {
            return None;
        }
        if id.library() == Some(BUNDLE_LIBRARY) {
            return self.resolve_bundle(id);
        }

        let stored = self.store.resolve(id)?;
        Some(Resource::stored(stored, self.paths.request_path(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ResourceIdentifier {
        ResourceIdentifier::parse(s).unwrap()
    }

    fn routed(prefix: Option<&str>, suffix: Option<&str>) -> RequestPaths {
        RequestPaths::new(
            "/resources",
            Routing {
                prefix: prefix.map(str::to_string),
                suffix: suffix.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_request_path() {
        let paths = routed(None, None);
        assert_eq!(paths.request_path(&id("lib:a.js")), "/resources/a.js?ln=lib");
        assert_eq!(paths.request_path(&id("a.js")), "/resources/a.js");
        assert_eq!(
            routed(Some("/faces"), None).request_path(&id("lib:sub/a.css")),
            "/faces/resources/sub/a.css?ln=lib"
        );
        assert_eq!(
            routed(None, Some(".xhtml")).request_path(&id("lib:a.css")),
            "/resources/a.css.xhtml?ln=lib"
        );
    }

    #[test]
    fn test_is_internal() {
        let paths = routed(None, None);
        assert!(paths.is_internal("/resources/a.js?ln=lib"));
        assert!(!paths.is_internal("https://cdn.example/resources/a.js"));
        assert!(!paths.is_internal("//cdn.example/resources/a.js"));
        assert!(!paths.is_internal("/static/a.js"));
    }

    #[test]
    fn test_unmap_strips_routing() {
        let prefixed = routed(Some("/faces"), None);
        assert_eq!(
            prefixed.unmap("/faces/resources/a.js?ln=lib"),
            "/resources/a.js?ln=lib"
        );
        let suffixed = routed(None, Some(".xhtml"));
        assert_eq!(
            suffixed.unmap("/resources/a.js.xhtml?ln=lib&v=1"),
            "/resources/a.js?ln=lib&v=1"
        );
        assert_eq!(
            suffixed.unmap("https://cdn.example/a.js.xhtml"),
            "https://cdn.example/a.js.xhtml"
        );
    }
}
