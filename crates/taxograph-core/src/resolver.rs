//! Path resolver: per-pattern evidence queries against the oracle
//!
//! All query text is built here from the configured root and property
//! constants; execution happens behind [`ClassificationOracle`]. Entity URIs
//! in results are trimmed to bare identifiers and labels are title-cased
//! before anything leaves this module.

use crate::config::BuildConfig;
use crate::edge::CandidateLink;
use crate::entity::{title_case, EntityId};
use crate::error::{Error, Result};
use crate::oracle::{ClassificationOracle, Record};
use crate::pattern::{PathEvidence, Pattern};
use async_trait::async_trait;

/// Chain discovery operations the integrator depends on.
///
/// Split from [`PathResolver`] so the construction algorithm can be tested
/// against fixed chains without an oracle.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Arcs of the subclass chain from `id` up to the root (may be empty)
    async fn subclass_path(&self, id: &EntityId) -> Result<Vec<CandidateLink>>;

    /// Taxonomic-parent candidate links strictly above `id`, bounded above
    /// by subclass reachability of the root
    async fn taxon_links(&self, id: &EntityId) -> Result<Vec<CandidateLink>>;
}

/// Resolves the evidence connecting one object to the root class
pub struct PathResolver<'a> {
    oracle: &'a dyn ClassificationOracle,
    config: &'a BuildConfig,
}

impl<'a> PathResolver<'a> {
    pub fn new(oracle: &'a dyn ClassificationOracle, config: &'a BuildConfig) -> Self {
        Self { oracle, config }
    }

    /// Probe the four evidence shapes in order and return the first that
    /// holds, or `None` when the object does not connect to the root at all.
    pub async fn classify(&self, id: &EntityId) -> Result<Option<Pattern>> {
        for pattern in Pattern::ALL {
            let probe = self.probe_query(id, pattern);
            if self.oracle.ask(&format!("ASK WHERE {{ {probe} }}")).await? {
                tracing::debug!(object = %id, pattern = %pattern, "pattern probe matched");
                return Ok(Some(pattern));
            }
        }
        Ok(None)
    }

    fn probe_query(&self, id: &EntityId, pattern: Pattern) -> String {
        let c = self.config;
        match pattern {
            Pattern::DirectSubclass => {
                format!("wd:{id} {prop}* wd:{root}", prop = c.subclass_property, root = c.root)
            }
            Pattern::DirectInstance => format!(
                "wd:{id} {inst} ?class. ?class {sub}* wd:{root}. FILTER (?class != wd:{noise})",
                inst = c.instance_property,
                sub = c.subclass_property,
                root = c.root,
                noise = c.noise_class,
            ),
            Pattern::TaxonChain => format!(
                "wd:{id} {taxon}* ?taxon_class. ?taxon_class {sub}* wd:{root}",
                taxon = c.taxon_property,
                sub = c.subclass_property,
                root = c.root,
            ),
            Pattern::SubclassThenTaxonChain => format!(
                "wd:{id} {sub} ?super. ?super {taxon}* ?taxon_class. ?taxon_class {sub}* wd:{root}",
                sub = c.subclass_property,
                taxon = c.taxon_property,
                root = c.root,
            ),
        }
    }

    /// Resolve the pattern-specific evidence fields for one object
    pub async fn map_evidence(&self, id: &EntityId, pattern: Pattern) -> Result<PathEvidence> {
        let c = self.config;
        match pattern {
            Pattern::DirectInstance => {
                let query = format!(
                    "SELECT ?class WHERE {{ wd:{id} {inst} ?class. FILTER (?class != wd:{noise}) }}",
                    inst = c.instance_property,
                    noise = c.noise_class,
                );
                let result = self.oracle.select(&query, &["class"]).await?;
                let superclass = self
                    .entity_field(result.first(), "class")
                    .ok_or_else(|| Error::Oracle(format!("object {id}: no instance class")))?;
                Ok(PathEvidence::DirectInstance { superclass })
            }
            Pattern::DirectSubclass => {
                let query = format!(
                    "SELECT ?class WHERE {{ wd:{id} {sub} ?class }}",
                    sub = c.subclass_property,
                );
                let result = self.oracle.select(&query, &["class"]).await?;
                let superclasses = result
                    .iter()
                    .filter_map(|r| self.entity_field(Some(r), "class"))
                    .collect();
                Ok(PathEvidence::DirectSubclass { superclasses })
            }
            Pattern::TaxonChain => Ok(PathEvidence::TaxonChain {
                links: self.taxon_links(id).await?,
            }),
            Pattern::SubclassThenTaxonChain => {
                let query = format!(
                    "SELECT ?class WHERE {{ wd:{id} {sub} ?class }}",
                    sub = c.subclass_property,
                );
                let result = self.oracle.select(&query, &["class"]).await?;
                let superclass = self
                    .entity_field(result.first(), "class")
                    .ok_or_else(|| Error::Oracle(format!("object {id}: no direct superclass")))?;
                let links = self.taxon_links(&superclass).await?;
                Ok(PathEvidence::SubclassThenTaxonChain { superclass, links })
            }
        }
    }

    fn entity_field(&self, record: Option<&Record>, field: &str) -> Option<EntityId> {
        record
            .and_then(|r| r.get(field))
            .map(|uri| EntityId::from_uri(uri, &self.config.entity_uri_prefix))
    }

    fn link_from_record(&self, record: &Record) -> Option<CandidateLink> {
        Some(CandidateLink {
            parent: self.entity_field(Some(record), "parent")?,
            child: self.entity_field(Some(record), "child")?,
            parent_label: record.get("parentLabel").map(|l| title_case(l)),
            child_label: record.get("childLabel").map(|l| title_case(l)),
        })
    }
}

#[async_trait]
impl ChainSource for PathResolver<'_> {
    async fn subclass_path(&self, id: &EntityId) -> Result<Vec<CandidateLink>> {
        let c = self.config;
        let query = format!(
            "SELECT ?parent ?child ?parentLabel ?childLabel \
             WHERE {{ \
                 wd:{id} {sub}* ?child. \
                 ?child {sub} ?parent; \
                        rdfs:label ?childLabel. \
                 ?parent {sub}* wd:{root}; \
                         rdfs:label ?parentLabel \
                 FILTER (LANG(?parentLabel) = 'en' && LANG(?childLabel) = 'en') \
             }}",
            sub = c.subclass_property,
            root = c.root,
        );
        let result = self
            .oracle
            .select(&query, &["parent", "child", "parentLabel", "childLabel"])
            .await?;
        Ok(result
            .iter()
            .filter_map(|r| self.link_from_record(r))
            .collect())
    }

    async fn taxon_links(&self, id: &EntityId) -> Result<Vec<CandidateLink>> {
        let c = self.config;
        // ?child != id keeps the chain strictly above the queried entity;
        // the integrator attaches the entity to the chain terminal itself
        let query = format!(
            "SELECT ?parent ?child ?parentLabel ?childLabel \
             WHERE {{ \
                 wd:{id} {taxon}* ?child. \
                 ?child {taxon} ?parent; \
                        rdfs:label ?childLabel. \
                 ?parent {sub}* wd:{root}; \
                         rdfs:label ?parentLabel \
                 FILTER (LANG(?parentLabel) = 'en' && LANG(?childLabel) = 'en' \
                         && ?child != wd:{id}) \
             }}",
            taxon = c.taxon_property,
            sub = c.subclass_property,
            root = c.root,
        );
        let result = self
            .oracle
            .select(&query, &["parent", "child", "parentLabel", "childLabel"])
            .await?;
        Ok(result
            .iter()
            .filter_map(|r| self.link_from_record(r))
            .collect())
    }
}
