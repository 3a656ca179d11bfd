//! Deferred document mutations
//!
//! The builder scans a region by original node index and records what should change;
//! nothing is mutated until the scan is over. Applying the plan walks indices from the back
//! so that earlier indices stay valid.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::GroupKey;
use crate::document::{DocumentTree, ResourceNode};

/// Something to insert before an original node
#[derive(Debug, Clone)]
pub(crate) enum Pending {
    Node(ResourceNode),
    /// Placeholder for the anchor of a group, known only after the scan
    Anchor(GroupKey),
}

#[derive(Debug, Default)]
pub(crate) struct MutationPlan {
    replaces: BTreeMap<usize, ResourceNode>,
    removes: BTreeSet<usize>,
    inserts: BTreeMap<usize, Vec<Pending>>,
}

impl MutationPlan {
    pub(crate) fn replace(&mut self, index: usize, node: ResourceNode) {
        self.replaces.insert(index, node);
    }

    pub(crate) fn remove(&mut self, index: usize) {
        self.removes.insert(index);
    }

    /// Queue an insertion before original node `index`, after earlier queued ones
    pub(crate) fn insert(&mut self, index: usize, pending: Pending) {
        self.inserts.entry(index).or_default().push(pending);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.replaces.is_empty() && self.removes.is_empty() && self.inserts.is_empty()
    }

    /// Apply the plan to one region; a replaced node is never removed
    pub(crate) fn apply(
        self,
        tree: &mut dyn DocumentTree,
        region: &str,
        anchors: &HashMap<GroupKey, ResourceNode>,
    ) {
        let Self {
            replaces,
            removes,
            mut inserts,
        } = self;

        let mut indices: BTreeSet<usize> = removes
            .iter()
            .copied()
            .filter(|index| !replaces.contains_key(index))
            .collect();
        indices.extend(inserts.keys().copied());

        for (index, node) in replaces {
            tree.replace(region, index, node);
        }

        for index in indices.into_iter().rev() {
            if removes.contains(&index) {
                tree.remove(region, index);
            }
            let Some(pending) = inserts.remove(&index) else {
                continue;
            };
            for item in pending.into_iter().rev() {
                let node = match item {
                    Pending::Node(node) => node,
                    Pending::Anchor(key) => match anchors.get(&key) {
                        Some(node) => node.clone(),
                        None => continue,
                    },
                };
                tree.insert(region, index, node);
            }
        }
    }
}
