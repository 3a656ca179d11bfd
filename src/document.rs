//! Document tree contract and an in-memory implementation
//!
//! The bundle builder never sees a real UI component tree. It works against
//! [`DocumentTree`]: per region, an ordered list of [`ResourceNode`]s that can be replaced,
//! inserted and removed by index. [`Document`] implements the contract over plain data and
//! loads from YAML:
//!
//! ```yaml
//! head:
//!   - { kind: stylesheet, library: libA, name: a.css }
//!   - { kind: script, library: libA, name: a.js, on_success: "init()" }
//! body:
//!   - { kind: deferred-script, name: late.js, group: analytics }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, document, fs};
use crate::resource::ResourceIdentifier;

/// How a node takes part in bundling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Stylesheet,
    Script,
    DeferredScript,
    /// A reference to a vendor resource library that expands into several resources
    Library,
    /// Anything else; never touched
    Foreign,
}

/// Lifecycle script hooks of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callbacks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_begin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<String>,
}

impl Callbacks {
    pub fn is_empty(&self) -> bool {
        self.on_begin.is_none() && self.on_success.is_none() && self.on_error.is_none()
    }

    /// Append another node's hooks, joining scripts with `;`
    pub fn merge(&mut self, other: &Callbacks) {
        join_script(&mut self.on_begin, other.on_begin.as_deref());
        join_script(&mut self.on_success, other.on_success.as_deref());
        join_script(&mut self.on_error, other.on_error.as_deref());
    }
}

fn join_script(target: &mut Option<String>, addition: Option<&str>) {
    let Some(addition) = addition.map(str::trim).filter(|s| !s.is_empty()) else {
        return;
    };
    match target {
        Some(existing) if !existing.trim().is_empty() => {
            let trimmed = existing.trim_end().trim_end_matches(';').to_string();
            *existing = format!("{trimmed};{addition}");
        }
        _ => *target = Some(addition.to_string()),
    }
}

fn default_rendered() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_true(value: &bool) -> bool {
    *value
}

/// One resource reference in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Nodes that are not rendered are ignored by the builder
    #[serde(default = "default_rendered", skip_serializing_if = "is_true")]
    pub rendered: bool,

    /// Deferred scripts are bundled per group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(flatten)]
    pub callbacks: Callbacks,

    /// Render the content inline instead of linking to it
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

impl ResourceNode {
    pub fn new(kind: NodeKind, id: &ResourceIdentifier) -> Self {
        Self {
            kind,
            library: id.library().map(str::to_string),
            name: Some(id.name().to_string()),
            rendered: true,
            group: None,
            callbacks: Callbacks::default(),
            inline: false,
        }
    }

    /// The referenced identifier; `None` for nameless nodes or unparsable references
    pub fn identifier(&self) -> Option<ResourceIdentifier> {
        let name = self.name.as_deref()?;
        match ResourceIdentifier::new(self.library.as_deref(), name) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring node with invalid resource reference");
                None
            }
        }
    }

    /// Point the node at another identifier
    pub fn set_identifier(&mut self, id: &ResourceIdentifier) {
        self.library = id.library().map(str::to_string);
        self.name = Some(id.name().to_string());
    }
}

/// Regions of ordered resource nodes that the builder can rewrite
pub trait DocumentTree {
    /// Region names in document order
    fn regions(&self) -> Vec<String>;

    /// Snapshot of a region's nodes
    fn nodes(&self, region: &str) -> Vec<ResourceNode>;

    fn replace(&mut self, region: &str, index: usize, node: ResourceNode);

    /// Insert before the node currently at `index`
    fn insert(&mut self, region: &str, index: usize, node: ResourceNode);

    fn remove(&mut self, region: &str, index: usize);

    fn append(&mut self, region: &str, node: ResourceNode) {
        let len = self.nodes(region).len();
        self.insert(region, len, node);
    }
}

/// Plain in-memory document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    regions: IndexMap<String, Vec<ResourceNode>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| document::parse_failed("<string>", e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(fs::not_found(path.display().to_string()));
        }
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| fs::read_failed(path.display().to_string(), e.to_string()))?;
        serde_yaml::from_str(&yaml)
            .map_err(|e| document::parse_failed(path.display().to_string(), e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Add a node at the end of a region, creating the region when needed
    pub fn push(&mut self, region: &str, node: ResourceNode) {
        self.regions.entry(region.to_string()).or_default().push(node);
    }

    pub fn region(&self, region: &str) -> &[ResourceNode] {
        self.regions.get(region).map_or(&[], Vec::as_slice)
    }
}

impl DocumentTree for Document {
    fn regions(&self) -> Vec<String> {
        self.regions.keys().cloned().collect()
    }

    fn nodes(&self, region: &str) -> Vec<ResourceNode> {
        self.region(region).to_vec()
    }

    fn replace(&mut self, region: &str, index: usize, node: ResourceNode) {
        if let Some(slot) = self
            .regions
            .get_mut(region)
            .and_then(|nodes| nodes.get_mut(index))
        {
            *slot = node;
        }
    }

    fn insert(&mut self, region: &str, index: usize, node: ResourceNode) {
        let nodes = self.regions.entry(region.to_string()).or_default();
        let index = index.min(nodes.len());
        nodes.insert(index, node);
    }

    fn remove(&mut self, region: &str, index: usize) {
        if let Some(nodes) = self.regions.get_mut(region) {
            if index < nodes.len() {
                nodes.remove(index);
            }
        }
    }
}
