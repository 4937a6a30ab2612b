//! Transitive reduction over the committed edge set
//!
//! Construction happily gives a node several direct parents when different
//! evidence chains each reach it. This pass keeps only the most specific
//! parentage: a direct edge is dropped when the same parent is already an
//! ancestor of another direct parent of the node.

use crate::entity::EntityId;
use crate::error::{Error, Result};
use crate::store::EdgeStore;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Statistics from one reduction pass
#[derive(Debug, Default, Serialize)]
pub struct ReduceStats {
    /// Nodes that had more than one direct parent
    pub multi_parent_nodes: usize,
    /// Redundant direct edges removed
    pub edges_removed: usize,
}

/// Remove redundant multi-hop direct edges.
///
/// Deterministic given a fixed edge order. Two direct parents that are
/// mutually reachable are a [`Error::CycleAnomaly`]: the pass refuses to
/// guess which edge to drop and leaves the store untouched.
pub fn reduce(store: &mut EdgeStore) -> Result<ReduceStats> {
    let mut parents_by_child: HashMap<&EntityId, Vec<&EntityId>> = HashMap::new();
    let mut child_order: Vec<&EntityId> = Vec::new();
    for edge in store.edges() {
        let parents = parents_by_child.entry(&edge.child).or_default();
        if parents.is_empty() {
            child_order.push(&edge.child);
        }
        parents.push(&edge.parent);
    }

    let mut stats = ReduceStats::default();
    let mut redundant: HashSet<(EntityId, EntityId)> = HashSet::new();
    for child in child_order {
        let parents = &parents_by_child[child];
        if parents.len() < 2 {
            continue;
        }
        stats.multi_parent_nodes += 1;

        let ancestor_sets: Vec<HashSet<&EntityId>> = parents
            .iter()
            .map(|p| ancestors_of(store, p))
            .collect();

        for (i, a) in parents.iter().enumerate() {
            for (j, b) in parents.iter().enumerate().skip(i + 1) {
                let a_above_b = ancestor_sets[j].contains(a);
                let b_above_a = ancestor_sets[i].contains(b);
                if a_above_b && b_above_a {
                    return Err(Error::CycleAnomaly {
                        child: child.clone(),
                        a: (*a).clone(),
                        b: (*b).clone(),
                    });
                }
                if a_above_b {
                    redundant.insert(((*a).clone(), child.clone()));
                } else if b_above_a {
                    redundant.insert(((*b).clone(), child.clone()));
                }
            }
        }
    }

    if !redundant.is_empty() {
        stats.edges_removed = redundant.len();
        store.retain(|e| !redundant.contains(&(e.parent.clone(), e.child.clone())));
    }
    tracing::info!(
        multi_parent_nodes = stats.multi_parent_nodes,
        edges_removed = stats.edges_removed,
        "transitive reduction finished"
    );
    Ok(stats)
}

/// Strict transitive ancestors of `start`, walking committed edges upward.
/// The visited set guards against cycles in the walk itself.
fn ancestors_of<'a>(store: &'a EdgeStore, start: &EntityId) -> HashSet<&'a EntityId> {
    let mut up: HashMap<&EntityId, Vec<&EntityId>> = HashMap::new();
    for edge in store.edges() {
        up.entry(&edge.child).or_default().push(&edge.parent);
    }
    let mut seen: HashSet<&EntityId> = HashSet::new();
    let mut queue: VecDeque<&EntityId> = VecDeque::new();
    if let Some(parents) = up.get(start) {
        queue.extend(parents.iter().copied());
    }
    while let Some(node) = queue.pop_front() {
        if seen.insert(node) {
            if let Some(parents) = up.get(node) {
                queue.extend(parents.iter().copied());
            }
        }
    }
    seen
}
