//! Bundle builder
//!
//! Scans each region of a document, groups mergeable resource nodes by kind (and deferred
//! scripts by group), registers one bundle per group and rewrites the region so that a
//! single anchor node references the bundle:
//!
//! 1. References to earlier bundles are decoded and their members re-enter grouping.
//! 2. Excluded or CDN-mapped identifiers are left as they are.
//! 3. Suppressed identifiers are removed.
//! 4. Everything else joins its group. The first node of a group becomes the anchor; later
//!    nodes are removed and their callbacks appended to the anchor's.
//!
//! Library nodes expand into their members first, as if the members had been declared at
//! the library node's position.

mod plan;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::bundle::{BUNDLE_LIBRARY, BundleKind, BundleRegistry, decode_id};
use crate::config::CompiledConfig;
use crate::document::{Callbacks, DocumentTree, NodeKind, ResourceNode};
use crate::error::Result;
use crate::resource::ResourceIdentifier;

use plan::{MutationPlan, Pending};

/// How many bundle references deep flattening follows
pub const MAX_FLATTEN_DEPTH: usize = 8;

/// Resolves a library node into the identifiers it stands for
pub trait LibraryExpander {
    /// `None` when the library is unknown; such nodes are left alone
    fn expand(&self, library: &ResourceIdentifier) -> Option<Vec<ResourceIdentifier>>;
}

impl LibraryExpander for CompiledConfig {
    fn expand(&self, library: &ResourceIdentifier) -> Option<Vec<ResourceIdentifier>> {
        self.library_members(library).map(<[_]>::to_vec)
    }
}

/// The group a mergeable node belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Stylesheet,
    Script,
    Deferred(Option<String>),
}

impl GroupKey {
    fn for_node(kind: NodeKind, group: Option<&str>) -> Option<Self> {
        match kind {
            NodeKind::Stylesheet => Some(GroupKey::Stylesheet),
            NodeKind::Script => Some(GroupKey::Script),
            NodeKind::DeferredScript => Some(GroupKey::Deferred(group.map(str::to_string))),
            NodeKind::Library | NodeKind::Foreign => None,
        }
    }

    fn node_kind(&self) -> NodeKind {
        match self {
            GroupKey::Stylesheet => NodeKind::Stylesheet,
            GroupKey::Script => NodeKind::Script,
            GroupKey::Deferred(_) => NodeKind::DeferredScript,
        }
    }

    fn bundle_kind(&self) -> BundleKind {
        match self {
            GroupKey::Stylesheet => BundleKind::Stylesheet,
            GroupKey::Script | GroupKey::Deferred(_) => BundleKind::Script,
        }
    }

    fn group(&self) -> Option<String> {
        match self {
            GroupKey::Deferred(group) => group.clone(),
            _ => None,
        }
    }
}

/// A bundle created while rewriting a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltBundle {
    pub region: String,
    /// Identifier the anchor node references
    pub identifier: ResourceIdentifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub members: Vec<ResourceIdentifier>,
}

/// What a build changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub bundles: Vec<BuiltBundle>,
    /// Identifiers removed by suppression rules
    pub suppressed: Vec<ResourceIdentifier>,
    /// Identifiers kept out of bundles by exclusion rules or CDN mapping
    pub excluded: Vec<ResourceIdentifier>,
}

/// Rewrites documents to reference bundles
pub struct BundleBuilder<'a> {
    registry: &'a BundleRegistry,
    config: &'a CompiledConfig,
    expander: &'a dyn LibraryExpander,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(
        registry: &'a BundleRegistry,
        config: &'a CompiledConfig,
        expander: &'a dyn LibraryExpander,
    ) -> Self {
        Self {
            registry,
            config,
            expander,
        }
    }

    /// Rewrite every region of `tree`
    pub fn build(&self, tree: &mut dyn DocumentTree) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        for region in tree.regions() {
            let nodes = tree.nodes(&region);
            let mut scan = RegionScan::new(self, &nodes);
            scan.run();
            scan.finish(tree, &region, &mut report)?;
        }
        Ok(report)
    }
}

/// Where an identifier came from in the original region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Declared by the node at this index, which stays in place unless merged away
    Node(usize),
    /// Produced by the node at this index, which is removed; survivors are inserted there
    Consumed(usize),
}

impl Origin {
    fn index(self) -> usize {
        match self {
            Origin::Node(index) | Origin::Consumed(index) => index,
        }
    }
}

#[derive(Debug)]
struct Accumulator {
    members: IndexSet<ResourceIdentifier>,
    anchor: Origin,
    template: ResourceNode,
    callbacks: Callbacks,
    /// Original indices whose callbacks are already merged
    merged: HashSet<usize>,
}

struct RegionScan<'b, 'a> {
    builder: &'b BundleBuilder<'a>,
    nodes: &'b [ResourceNode],
    groups: IndexMap<GroupKey, Accumulator>,
    plan: MutationPlan,
    suppressed: Vec<ResourceIdentifier>,
    excluded: Vec<ResourceIdentifier>,
}

impl<'b, 'a> RegionScan<'b, 'a> {
    fn new(builder: &'b BundleBuilder<'a>, nodes: &'b [ResourceNode]) -> Self {
        Self {
            builder,
            nodes,
            groups: IndexMap::new(),
            plan: MutationPlan::default(),
            suppressed: Vec::new(),
            excluded: Vec::new(),
        }
    }

    fn run(&mut self) {
        let nodes = self.nodes;
        for (index, node) in nodes.iter().enumerate() {
            if !node.rendered || node.kind == NodeKind::Foreign {
                continue;
            }
            let Some(id) = node.identifier() else {
                continue;
            };

            if node.kind == NodeKind::Library {
                self.expand_library(index, &id);
            } else {
                let mut visited = Vec::new();
                self.handle(
                    id,
                    Origin::Node(index),
                    node.kind,
                    node.group.as_deref(),
                    &mut visited,
                );
            }
        }
    }

    fn expand_library(&mut self, index: usize, library: &ResourceIdentifier) {
        let Some(members) = self.builder.expander.expand(library) else {
            tracing::debug!(library = %library, "unknown resource library, leaving node as is");
            return;
        };

        self.plan.remove(index);
        for member in members {
            let kind = kind_for_name(member.name());
            let mut visited = Vec::new();
            self.handle(member, Origin::Consumed(index), kind, None, &mut visited);
        }
    }

    fn handle(
        &mut self,
        id: ResourceIdentifier,
        origin: Origin,
        kind: NodeKind,
        group: Option<&str>,
        visited: &mut Vec<String>,
    ) {
        if id.library() == Some(BUNDLE_LIBRARY) {
            self.flatten(id, origin, kind, group, visited);
            return;
        }

        let config = self.builder.config;
        if config.is_excluded(&id) {
            self.keep_standalone(&id, origin, kind, group);
            self.excluded.push(id);
            return;
        }
        if config.is_suppressed(&id) {
            if let Origin::Node(index) = origin {
                self.plan.remove(index);
            }
            self.suppressed.push(id);
            return;
        }

        match GroupKey::for_node(kind, group) {
            Some(key) => self.accumulate(key, id, origin),
            None => self.keep_standalone(&id, origin, kind, group),
        }
    }

    /// Feed the members of an earlier bundle back into grouping
    fn flatten(
        &mut self,
        id: ResourceIdentifier,
        origin: Origin,
        kind: NodeKind,
        group: Option<&str>,
        visited: &mut Vec<String>,
    ) {
        let Some((bundle_id, bundle_kind)) = BundleKind::split_name(id.name()) else {
            tracing::warn!(resource = %id, "bundle reference without a bundle extension");
            self.keep_standalone(&id, origin, kind, group);
            return;
        };

        if visited.iter().any(|seen| seen == bundle_id) || visited.len() >= MAX_FLATTEN_DEPTH {
            tracing::warn!(
                bundle = bundle_id,
                depth = visited.len(),
                "bundle reference cycle or nesting too deep, dropping it"
            );
            if let Origin::Node(index) = origin {
                self.plan.remove(index);
            }
            return;
        }

        let members = match decode_id(bundle_id) {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(
                    bundle = bundle_id,
                    error = %e,
                    "cannot flatten undecodable bundle reference"
                );
                self.keep_standalone(&id, origin, kind, group);
                return;
            }
        };

        let origin = match origin {
            Origin::Node(index) => {
                self.plan.remove(index);
                Origin::Consumed(index)
            }
            consumed @ Origin::Consumed(_) => consumed,
        };
        let kind = match (bundle_kind, kind) {
            (BundleKind::Stylesheet, _) => NodeKind::Stylesheet,
            (BundleKind::Script, NodeKind::DeferredScript) => NodeKind::DeferredScript,
            (BundleKind::Script, _) => NodeKind::Script,
        };

        visited.push(bundle_id.to_string());
        for member in members {
            self.handle(member, origin, kind, group, visited);
        }
        visited.pop();
    }

    /// Keep an identifier out of any bundle
    ///
    /// A declaring node simply stays; an identifier produced by a consumed node gets a node
    /// of its own at that position.
    fn keep_standalone(
        &mut self,
        id: &ResourceIdentifier,
        origin: Origin,
        kind: NodeKind,
        group: Option<&str>,
    ) {
        let Origin::Consumed(index) = origin else {
            return;
        };
        let mut node = ResourceNode::new(kind, id);
        node.group = group.map(str::to_string);
        self.plan.insert(index, Pending::Node(node));
    }

    fn accumulate(&mut self, key: GroupKey, id: ResourceIdentifier, origin: Origin) {
        let index = origin.index();
        let nodes = self.nodes;
        let source = &nodes[index];

        let Some(acc) = self.groups.get_mut(&key) else {
            if let Origin::Consumed(at) = origin {
                self.plan.insert(at, Pending::Anchor(key.clone()));
            }
            self.groups.insert(
                key,
                Accumulator {
                    members: IndexSet::from([id]),
                    anchor: origin,
                    template: source.clone(),
                    callbacks: source.callbacks.clone(),
                    merged: HashSet::from([index]),
                },
            );
            return;
        };

        // First occurrence wins; duplicates change neither order nor size
        acc.members.insert(id);
        if acc.anchor == origin {
            return;
        }
        if let Origin::Node(at) = origin {
            self.plan.remove(at);
        }
        if acc.merged.insert(index) {
            acc.callbacks.merge(&source.callbacks);
        }
    }

    fn finish(
        self,
        tree: &mut dyn DocumentTree,
        region: &str,
        report: &mut BuildReport,
    ) -> Result<()> {
        let Self {
            builder,
            groups,
            mut plan,
            suppressed,
            excluded,
            ..
        } = self;

        let mut anchors = HashMap::new();
        for (key, acc) in groups {
            let bundle = builder.registry.get_or_create(acc.members.iter().cloned())?;
            let identifier = key.bundle_kind().identifier(bundle.id())?;

            let mut node = acc.template;
            node.kind = key.node_kind();
            node.set_identifier(&identifier);
            node.group = key.group();
            node.callbacks = acc.callbacks;
            node.rendered = true;
            node.inline = match key {
                GroupKey::Stylesheet => builder.config.inline_css,
                GroupKey::Script => builder.config.inline_js,
                GroupKey::Deferred(_) => false,
            };

            tracing::debug!(
                region,
                bundle = %identifier,
                members = acc.members.len(),
                "built bundle"
            );
            report.bundles.push(BuiltBundle {
                region: region.to_string(),
                identifier,
                group: key.group(),
                members: acc.members.into_iter().collect(),
            });

            match acc.anchor {
                Origin::Node(index) => plan.replace(index, node),
                Origin::Consumed(_) => {
                    anchors.insert(key, node);
                }
            }
        }

        report.suppressed.extend(suppressed);
        report.excluded.extend(excluded);
        if !plan.is_empty() {
            plan.apply(tree, region, &anchors);
        }
        Ok(())
    }
}

/// Node kind implied by a resource name
fn kind_for_name(name: &str) -> NodeKind {
    if name.ends_with(BundleKind::Stylesheet.extension()) {
        NodeKind::Stylesheet
    } else if name.ends_with(BundleKind::Script.extension()) {
        NodeKind::Script
    } else {
        NodeKind::Foreign
    }
}
