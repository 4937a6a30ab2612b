//! Taxon path integrator: folds candidate chains into the accumulator
//!
//! The construction loop is ordering-sensitive: taxonomic parent chains from
//! the external graph are not guaranteed acyclic or root-terminating, so a
//! node wired in discovery order can end up on a dead branch before a better
//! one is tried. Candidate links are therefore reordered before insertion,
//! proven-dead parents are memoized in an exclusion set scoped to one
//! top-level object, and recursion is depth-bounded.

use crate::config::BuildConfig;
use crate::edge::CandidateLink;
use crate::entity::EntityId;
use crate::error::{Error, Result};
use crate::oracle::LabelLookup;
use crate::pattern::{ObjectRecord, PathEvidence};
use crate::resolver::ChainSource;
use crate::store::EdgeStore;
use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Outcome of one construction run
#[derive(Debug, Default, Serialize)]
pub struct BuildReport {
    /// Objects examined in this run
    pub processed: usize,
    /// Objects newly anchored to the root
    pub anchored: usize,
    /// Objects that were already anchored and needed no work
    pub skipped: usize,
    /// Objects no candidate link could anchor; surfaced for manual review
    pub unreachable: Vec<EntityId>,
}

/// Run a full construction pass over the object list.
///
/// The accumulated edge set is flushed to `graph_path` on every exit path,
/// success or failure, so an aborted run can resume from the failing
/// object's offset.
pub async fn construct(
    store: &mut EdgeStore,
    chains: &dyn ChainSource,
    labels: &dyn LabelLookup,
    config: &BuildConfig,
    objects: &[ObjectRecord],
    start: usize,
    graph_path: &Path,
) -> Result<BuildReport> {
    let mut builder = GraphBuilder::new(store, chains, labels, config);
    let result = builder.build(objects, start).await;
    match store.flush(graph_path) {
        Ok(()) => result,
        Err(flush_err) => match result {
            Ok(_) => Err(flush_err),
            // the build error is the actionable one; don't let the flush
            // failure shadow it
            Err(build_err) => {
                tracing::error!(error = %flush_err, "failed to flush edge table after build error");
                Err(build_err)
            }
        },
    }
}

/// Incrementally builds the parent/child hierarchy from the root down to
/// every anchorable object
pub struct GraphBuilder<'a> {
    store: &'a mut EdgeStore,
    chains: &'a dyn ChainSource,
    labels: &'a dyn LabelLookup,
    config: &'a BuildConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        store: &'a mut EdgeStore,
        chains: &'a dyn ChainSource,
        labels: &'a dyn LabelLookup,
        config: &'a BuildConfig,
    ) -> Self {
        Self {
            store,
            chains,
            labels,
            config,
        }
    }

    /// Process every object from `start` onward, one at a time
    pub async fn build(&mut self, objects: &[ObjectRecord], start: usize) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        for record in objects.iter().skip(start) {
            if self.store.child_exists(&record.identifier) {
                report.skipped += 1;
                continue;
            }
            report.processed += 1;
            if self.integrate_object(record).await? {
                report.anchored += 1;
            } else {
                tracing::warn!(object = %record.identifier, label = %record.label,
                    "no candidate link anchored the object; needs manual review");
                report.unreachable.push(record.identifier.clone());
            }
        }
        tracing::info!(
            processed = report.processed,
            anchored = report.anchored,
            skipped = report.skipped,
            unreachable = report.unreachable.len(),
            "construction pass finished"
        );
        Ok(report)
    }

    /// Fold one object into the graph; the exclusion set lives and dies here
    async fn integrate_object(&mut self, record: &ObjectRecord) -> Result<bool> {
        let mut exclusion: HashSet<EntityId> = HashSet::new();
        let label = Some(record.label.as_str());
        match record.evidence()? {
            PathEvidence::DirectInstance { superclass } => {
                self.attach_through(&superclass, record, &mut exclusion).await
            }
            PathEvidence::DirectSubclass { superclasses } => {
                let mut anchored = false;
                for superclass in &superclasses {
                    anchored |= self.attach_through(superclass, record, &mut exclusion).await?;
                }
                Ok(anchored)
            }
            PathEvidence::TaxonChain { links } => {
                self.integrate_chain(&record.identifier, label, links, &mut exclusion, 0)
                    .await
            }
            PathEvidence::SubclassThenTaxonChain { superclass, links } => {
                let anchored = self.store.child_exists(&superclass)
                    || self
                        .integrate_chain(&superclass, None, links, &mut exclusion, 0)
                        .await?;
                if !anchored {
                    return Ok(false);
                }
                self.store
                    .insert_unique(
                        superclass,
                        record.identifier.clone(),
                        None,
                        Some(record.label.clone()),
                        self.labels,
                    )
                    .await?;
                Ok(true)
            }
        }
    }

    /// Anchor `superclass` toward the root, then commit the edge down to the
    /// object. A superclass that cannot reach the root commits nothing.
    async fn attach_through(
        &mut self,
        superclass: &EntityId,
        record: &ObjectRecord,
        exclusion: &mut HashSet<EntityId>,
    ) -> Result<bool> {
        if !self.resolve_toward_root(superclass, exclusion, 0).await? {
            tracing::debug!(superclass = %superclass, object = %record.identifier,
                "superclass cannot reach the root");
            return Ok(false);
        }
        self.store
            .insert_unique(
                superclass.clone(),
                record.identifier.clone(),
                None,
                Some(record.label.clone()),
                self.labels,
            )
            .await?;
        Ok(true)
    }

    /// Resolve one entity toward the root: already anchored, the root
    /// itself, a direct subclass chain, or its own taxon chain, in that
    /// order of preference.
    fn resolve_toward_root<'b>(
        &'b mut self,
        entity: &'b EntityId,
        exclusion: &'b mut HashSet<EntityId>,
        depth: u32,
    ) -> BoxFuture<'b, Result<bool>> {
        Box::pin(async move {
            if self.store.child_exists(entity) || *entity == self.config.root {
                return Ok(true);
            }
            if depth > self.config.max_depth {
                return Err(Error::RecursionLimit {
                    object: entity.clone(),
                    depth,
                });
            }
            // exact subclass evidence is cheaper and preferred
            let arcs = self.chains.subclass_path(entity).await?;
            for arc in &arcs {
                self.commit_link(arc).await?;
            }
            if self.store.child_exists(entity) {
                return Ok(true);
            }
            let links = self.chains.taxon_links(entity).await?;
            self.integrate_chain(entity, None, links, exclusion, depth)
                .await
        })
    }

    /// Walk a reordered candidate chain, anchoring each link's parent and
    /// finally attaching `target` below the chain terminals.
    async fn integrate_chain(
        &mut self,
        target: &EntityId,
        target_label: Option<&str>,
        links: Vec<CandidateLink>,
        exclusion: &mut HashSet<EntityId>,
        depth: u32,
    ) -> Result<bool> {
        let links = reorder_links(links);
        let parents: HashSet<EntityId> = links.iter().map(|l| l.parent.clone()).collect();
        let mut success = false;
        for link in &links {
            // a root child would wire the hierarchy above its own root
            if link.child == self.config.root {
                continue;
            }
            let terminal = !parents.contains(&link.child);
            if self.store.child_exists(&link.child) {
                if terminal {
                    self.attach(target, target_label, link).await?;
                    success = true;
                }
                continue;
            }
            let parent_ok = if self.store.child_exists(&link.parent)
                || link.parent == self.config.root
            {
                true
            } else if exclusion.contains(&link.parent) {
                tracing::debug!(parent = %link.parent, "skipping excluded branch");
                false
            } else if self
                .resolve_toward_root(&link.parent, exclusion, depth + 1)
                .await?
            {
                true
            } else {
                exclusion.insert(link.parent.clone());
                false
            };
            if parent_ok {
                self.commit_link(link).await?;
                if terminal {
                    self.attach(target, target_label, link).await?;
                    success = true;
                }
            }
        }
        Ok(success || self.store.child_exists(target))
    }

    async fn commit_link(&mut self, link: &CandidateLink) -> Result<()> {
        self.store
            .insert_unique(
                link.parent.clone(),
                link.child.clone(),
                link.parent_label.clone(),
                link.child_label.clone(),
                self.labels,
            )
            .await?;
        Ok(())
    }

    /// Commit the edge from a chain terminal down to the resolution target
    async fn attach(
        &mut self,
        target: &EntityId,
        target_label: Option<&str>,
        link: &CandidateLink,
    ) -> Result<()> {
        self.store
            .insert_unique(
                link.child.clone(),
                target.clone(),
                link.child_label.clone(),
                target_label.map(String::from),
                self.labels,
            )
            .await?;
        Ok(())
    }
}

/// Stable bubble-to-end reordering of candidate links.
///
/// A link whose parent is produced (appears as a child) by a later link is
/// moved to the end of the sequence; scanning repeats until a full pass
/// finds nothing to move, so every chained dependency is attempted after the
/// link that anchors it. A cycle among the links themselves can never settle,
/// so moves are capped at len^2 and the sequence is returned as-is beyond
/// that point.
pub fn reorder_links(mut links: Vec<CandidateLink>) -> Vec<CandidateLink> {
    let cap = links.len() * links.len();
    let mut moves = 0;
    'scan: loop {
        for i in 0..links.len() {
            let parent = &links[i].parent;
            if links[i + 1..].iter().any(|l| l.child == *parent) {
                if moves >= cap {
                    tracing::warn!("candidate links contain a dependency cycle; order left as-is");
                    break 'scan;
                }
                let link = links.remove(i);
                links.push(link);
                moves += 1;
                continue 'scan;
            }
        }
        break;
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::LabeledEntity;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Chain fixture serving fixed subclass paths and taxon links, counting
    /// how often each entity is queried
    #[derive(Default)]
    struct FixedChains {
        subclass_paths: HashMap<EntityId, Vec<CandidateLink>>,
        taxon_links: HashMap<EntityId, Vec<CandidateLink>>,
        taxon_queries: Mutex<Vec<EntityId>>,
    }

    impl FixedChains {
        fn with_subclass_path(mut self, id: &str, links: Vec<CandidateLink>) -> Self {
            self.subclass_paths.insert(id.into(), links);
            self
        }

        fn with_taxon_links(mut self, id: &str, links: Vec<CandidateLink>) -> Self {
            self.taxon_links.insert(id.into(), links);
            self
        }

        fn taxon_queries_for(&self, id: &str) -> usize {
            let id = EntityId::from(id);
            self.taxon_queries
                .lock()
                .unwrap()
                .iter()
                .filter(|q| **q == id)
                .count()
        }
    }

    #[async_trait]
    impl ChainSource for FixedChains {
        async fn subclass_path(&self, id: &EntityId) -> Result<Vec<CandidateLink>> {
            Ok(self.subclass_paths.get(id).cloned().unwrap_or_default())
        }

        async fn taxon_links(&self, id: &EntityId) -> Result<Vec<CandidateLink>> {
            self.taxon_queries.lock().unwrap().push(id.clone());
            Ok(self.taxon_links.get(id).cloned().unwrap_or_default())
        }
    }

    /// Label collaborator that never knows a label
    struct NoLabels;

    #[async_trait]
    impl LabelLookup for NoLabels {
        async fn labels_of(&self, ids: &[EntityId]) -> Result<Vec<LabeledEntity>> {
            Ok(ids
                .iter()
                .map(|id| LabeledEntity::new(id.clone(), None))
                .collect())
        }
    }

    fn link(parent: &str, child: &str) -> CandidateLink {
        CandidateLink::new(parent, child)
    }

    fn pairs(store: &EdgeStore) -> Vec<(String, String)> {
        store
            .edges()
            .iter()
            .map(|e| (e.parent.to_string(), e.child.to_string()))
            .collect()
    }

    async fn seed(store: &mut EdgeStore, parent: &str, child: &str) {
        store
            .insert_unique(parent.into(), child.into(), None, None, &NoLabels)
            .await
            .unwrap();
    }

    fn taxon_record(id: &str, label: &str, links: Vec<CandidateLink>) -> ObjectRecord {
        let mut record = ObjectRecord::new(id, label);
        record.pattern = Some("taxon_chain".to_string());
        record.taxon_superclasses = Some(links);
        record
    }

    #[test]
    fn test_reorder_keeps_ordered_sequence() {
        let links = vec![link("A", "B"), link("B", "C"), link("C", "D")];
        assert_eq!(reorder_links(links.clone()), links);
    }

    #[test]
    fn test_reorder_moves_dependent_link_behind_producer() {
        let links = vec![link("B", "C"), link("A", "B")];
        let ordered = reorder_links(links);
        assert_eq!(ordered, vec![link("A", "B"), link("B", "C")]);
    }

    #[test]
    fn test_reorder_postcondition_on_shuffled_chain() {
        let links = vec![
            link("C", "D"),
            link("A", "B"),
            link("D", "E"),
            link("B", "C"),
        ];
        let ordered = reorder_links(links);
        for (i, l) in ordered.iter().enumerate() {
            assert!(
                !ordered[i + 1..].iter().any(|m| m.child == l.parent),
                "parent {} appears as a child after its link",
                l.parent
            );
        }
    }

    #[test]
    fn test_reorder_terminates_on_cyclic_links() {
        let links = vec![link("A", "B"), link("B", "A")];
        let ordered = reorder_links(links);
        assert_eq!(ordered.len(), 2);
    }

    #[tokio::test]
    async fn test_seeded_chain_walk() {
        // root R; O's chain is D->C->B->A with only A independently known
        let chains = FixedChains::default();
        let config = BuildConfig::default().with_root("R");
        let mut store = EdgeStore::new();
        seed(&mut store, "R", "A").await;

        let record = taxon_record(
            "O",
            "Object",
            vec![link("A", "B"), link("B", "C"), link("C", "D")],
        );
        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let report = builder.build(&[record], 0).await.unwrap();

        assert_eq!(report.anchored, 1);
        assert_eq!(
            pairs(&store),
            vec![
                ("R".into(), "A".into()),
                ("A".into(), "B".into()),
                ("B".into(), "C".into()),
                ("C".into(), "D".into()),
                ("D".into(), "O".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_direct_subclass_with_one_dead_branch() {
        // P1 reaches the root through its subclass path; P2 exhausts its
        // candidates and must never become a parent of the object
        let chains = FixedChains::default()
            .with_subclass_path("P1", vec![link("R", "P1")]);
        let config = BuildConfig::default().with_root("R");
        let mut store = EdgeStore::new();

        let mut record = ObjectRecord::new("O2", "Object Two");
        record.pattern = Some("direct_subclass".to_string());
        record.superclasses = Some(vec!["P1".into(), "P2".into()]);

        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let report = builder.build(&[record], 0).await.unwrap();

        assert_eq!(report.anchored, 1);
        assert!(report.unreachable.is_empty());
        assert_eq!(
            pairs(&store),
            vec![("R".into(), "P1".into()), ("P1".into(), "O2".into())]
        );
    }

    #[tokio::test]
    async fn test_excluded_parent_explored_once() {
        // X cannot reach the root and backs two links; the second attempt
        // must hit the exclusion set instead of re-deriving the dead branch
        let chains = FixedChains::default();
        let config = BuildConfig::default().with_root("R");
        let mut store = EdgeStore::new();

        let record = taxon_record("O", "Object", vec![link("X", "B"), link("X", "C")]);
        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let report = builder.build(&[record], 0).await.unwrap();

        assert_eq!(report.unreachable, vec![EntityId::from("O")]);
        assert_eq!(chains.taxon_queries_for("X"), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_recursive_parent_resolution() {
        // O's chain parent A is unknown, but A's own taxon chain reaches a
        // node anchored under the root
        let chains = FixedChains::default()
            .with_taxon_links("A", vec![link("K", "A0")])
            .with_subclass_path("K", vec![link("R", "K")]);
        let config = BuildConfig::default().with_root("R");
        let mut store = EdgeStore::new();

        let record = taxon_record("O", "Object", vec![link("A", "B")]);
        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let report = builder.build(&[record], 0).await.unwrap();

        assert_eq!(report.anchored, 1);
        assert_eq!(
            pairs(&store),
            vec![
                ("R".into(), "K".into()),
                ("K".into(), "A0".into()),
                ("A0".into(), "A".into()),
                ("A".into(), "B".into()),
                ("B".into(), "O".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_root_child_link_skipped() {
        // a candidate link proposing the root as a child is a dead giveaway
        // for an inverted chain; it must never be committed
        let chains = FixedChains::default();
        let config = BuildConfig::default().with_root("R");
        let mut store = EdgeStore::new();
        seed(&mut store, "R", "A").await;

        let record = taxon_record("O", "Object", vec![link("A", "R"), link("A", "B")]);
        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let report = builder.build(&[record], 0).await.unwrap();

        assert_eq!(report.anchored, 1);
        assert_eq!(
            pairs(&store),
            vec![
                ("R".into(), "A".into()),
                ("A".into(), "B".into()),
                ("B".into(), "O".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_recursion_limit_is_diagnosable() {
        // every level invents a fresh unanchorable parent
        let mut chains = FixedChains::default();
        for i in 0..64 {
            chains = chains.with_taxon_links(
                &format!("X{i}"),
                vec![link(&format!("X{}", i + 1), &format!("Y{i}"))],
            );
        }
        let config = BuildConfig::default().with_root("R").with_max_depth(8);
        let mut store = EdgeStore::new();

        let record = taxon_record("O", "Object", vec![link("X0", "M")]);
        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let err = builder.build(&[record], 0).await.unwrap_err();
        assert!(matches!(err, Error::RecursionLimit { .. }));
    }

    #[tokio::test]
    async fn test_already_anchored_object_skipped() {
        let chains = FixedChains::default();
        let config = BuildConfig::default().with_root("R");
        let mut store = EdgeStore::new();
        seed(&mut store, "R", "O").await;

        let record = taxon_record("O", "Object", vec![]);
        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let report = builder.build(&[record], 0).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed, 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_subclass_then_taxon_chain_attaches_superclass() {
        let chains = FixedChains::default();
        let config = BuildConfig::default().with_root("R");
        let mut store = EdgeStore::new();
        seed(&mut store, "R", "A").await;

        let mut record = ObjectRecord::new("O", "Object");
        record.pattern = Some("subclass_then_taxon_chain".to_string());
        record.superclass = Some("S".into());
        record.taxon_superclasses = Some(vec![link("A", "B")]);

        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let report = builder.build(&[record], 0).await.unwrap();

        assert_eq!(report.anchored, 1);
        assert_eq!(
            pairs(&store),
            vec![
                ("R".into(), "A".into()),
                ("A".into(), "B".into()),
                ("B".into(), "S".into()),
                ("S".into(), "O".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_pattern_aborts_batch() {
        let chains = FixedChains::default();
        let config = BuildConfig::default().with_root("R");
        let mut store = EdgeStore::new();

        let mut record = ObjectRecord::new("O", "Object");
        record.pattern = Some("instance_of".to_string());

        let mut builder = GraphBuilder::new(&mut store, &chains, &NoLabels, &config);
        let err = builder.build(&[record], 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
