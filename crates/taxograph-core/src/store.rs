//! Graph accumulator: the growing, deduplicated edge set
//!
//! Edges are kept in insertion order (the persisted table is ordered) with
//! secondary indexes for the two membership tests construction performs
//! constantly: "does this (parent, child) pair exist" and "is this entity
//! already anchored as somebody's child".

use crate::edge::Edge;
use crate::entity::EntityId;
use crate::error::{Error, Result};
use crate::oracle::LabelLookup;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

const HEADER: &str = "parent,child,parentLabel,childLabel";

/// Ordered, deduplicated set of committed edges
#[derive(Debug, Default)]
pub struct EdgeStore {
    edges: Vec<Edge>,
    pairs: HashSet<(EntityId, EntityId)>,
    children: HashMap<EntityId, usize>,
    labels: HashMap<EntityId, String>,
}

impl EdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// True iff some committed edge has this entity as its child.
    ///
    /// Anchoring is structural: an entity appearing only as a parent is
    /// still unanchored.
    pub fn child_exists(&self, id: &EntityId) -> bool {
        self.children.contains_key(id)
    }

    /// True iff an edge exists between these two entities in either direction
    pub fn contains_pair(&self, parent: &EntityId, child: &EntityId) -> bool {
        self.pairs.contains(&pair_key(parent, child))
    }

    /// A label already recorded anywhere in the store for this entity
    pub fn label_of(&self, id: &EntityId) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Insert an edge unless it would be a self-loop or a duplicate pair.
    /// The pair identity is unordered: an edge between the same two entities
    /// in the opposite direction also counts as a duplicate.
    ///
    /// Missing labels are backfilled first from labels already recorded in
    /// the store, then from the label collaborator. Returns whether an edge
    /// was actually appended.
    pub async fn insert_unique(
        &mut self,
        parent: EntityId,
        child: EntityId,
        parent_label: Option<String>,
        child_label: Option<String>,
        lookup: &dyn LabelLookup,
    ) -> Result<bool> {
        if parent == child {
            tracing::debug!(entity = %parent, "rejecting self-loop");
            return Ok(false);
        }
        if self.contains_pair(&parent, &child) {
            return Ok(false);
        }
        let parent_label = match parent_label {
            Some(label) => Some(label),
            None => self.resolve_label(&parent, lookup).await?,
        };
        let child_label = match child_label {
            Some(label) => Some(label),
            None => self.resolve_label(&child, lookup).await?,
        };
        self.push(Edge {
            parent,
            child,
            parent_label,
            child_label,
        });
        Ok(true)
    }

    async fn resolve_label(
        &self,
        id: &EntityId,
        lookup: &dyn LabelLookup,
    ) -> Result<Option<String>> {
        if let Some(label) = self.labels.get(id) {
            return Ok(Some(label.clone()));
        }
        let found = lookup.labels_of(std::slice::from_ref(id)).await?;
        Ok(found.into_iter().next().and_then(|e| e.label))
    }

    fn push(&mut self, edge: Edge) {
        self.pairs.insert(pair_key(&edge.parent, &edge.child));
        *self.children.entry(edge.child.clone()).or_insert(0) += 1;
        if let Some(label) = &edge.parent_label {
            self.labels.insert(edge.parent.clone(), label.clone());
        }
        if let Some(label) = &edge.child_label {
            self.labels.insert(edge.child.clone(), label.clone());
        }
        self.edges.push(edge);
    }

    /// Keep only edges matching the predicate, rebuilding all indexes.
    /// Used by the transitive reducer.
    pub fn retain<F: FnMut(&Edge) -> bool>(&mut self, mut f: F) {
        let edges = std::mem::take(&mut self.edges);
        self.pairs.clear();
        self.children.clear();
        self.labels.clear();
        for edge in edges {
            if f(&edge) {
                self.push(edge);
            }
        }
    }

    /// Load a persisted edge table, tolerating a partially-built table from
    /// a prior interrupted run. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no edge table yet, starting empty");
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let mut store = Self::new();
        for (index, line) in content.lines().enumerate() {
            if index == 0 || line.is_empty() {
                continue;
            }
            let fields = parse_row(line).ok_or_else(|| Error::MalformedEdgeRow {
                line: index + 1,
                reason: "unterminated quote".to_string(),
            })?;
            if fields.len() < 2 {
                return Err(Error::MalformedEdgeRow {
                    line: index + 1,
                    reason: format!("expected at least 2 columns, got {}", fields.len()),
                });
            }
            let non_empty = |s: &String| {
                if s.is_empty() {
                    None
                } else {
                    Some(s.clone())
                }
            };
            let edge = Edge {
                parent: EntityId::from(fields[0].clone()),
                child: EntityId::from(fields[1].clone()),
                parent_label: fields.get(2).and_then(non_empty),
                child_label: fields.get(3).and_then(non_empty),
            };
            // duplicates in a partial table are collapsed, not errors
            if edge.parent != edge.child && !store.contains_pair(&edge.parent, &edge.child) {
                store.push(edge);
            }
        }
        tracing::info!(path = %path.display(), edges = store.len(), "loaded edge table");
        Ok(store)
    }

    /// Persist the full ordered edge table
    pub fn flush(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let mut out = std::fs::File::create(path)?;
        writeln!(out, "{HEADER}")?;
        for edge in &self.edges {
            writeln!(
                out,
                "{},{},{},{}",
                escape(edge.parent.as_str()),
                escape(edge.child.as_str()),
                escape(edge.parent_label.as_deref().unwrap_or("")),
                escape(edge.child_label.as_deref().unwrap_or(""))
            )?;
        }
        out.flush()?;
        tracing::debug!(path = %path.display(), edges = self.edges.len(), "flushed edge table");
        Ok(())
    }
}

fn pair_key(a: &EntityId, b: &EntityId) -> (EntityId, EntityId) {
    if a.as_str() <= b.as_str() {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn parse_row(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if current.is_empty() => quoted = true,
            ',' if !quoted => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    if quoted {
        return None;
    }
    fields.push(current);
    Some(fields)
}
