//! Construction configuration
//!
//! Everything the engine needs to know about the external graph is carried
//! here explicitly and passed into the construction entry point; there is no
//! ambient global state.

use crate::entity::EntityId;
use serde::{Deserialize, Serialize};

/// Configuration for one construction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Distinguished root class every object must transitively connect to
    pub root: EntityId,

    /// URI prefix stripped from entity URIs returned by the oracle
    pub entity_uri_prefix: String,

    /// Subclass-of property path (e.g. "wdt:P279")
    pub subclass_property: String,

    /// Taxonomic-parent property path (e.g. "wdt:P171")
    pub taxon_property: String,

    /// Instance-of property path (e.g. "wdt:P31")
    pub instance_property: String,

    /// Class excluded from instance-of enumeration (breed-like noise)
    pub noise_class: EntityId,

    /// Chunk size for batched VALUES selects
    pub batch_size: usize,

    /// Depth bound for recursive parent resolution
    pub max_depth: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: EntityId::from("Q729"),
            entity_uri_prefix: "http://www.wikidata.org/entity/".to_string(),
            subclass_property: "wdt:P279".to_string(),
            taxon_property: "wdt:P171".to_string(),
            instance_property: "wdt:P31".to_string(),
            noise_class: EntityId::from("Q16521"),
            batch_size: 400,
            max_depth: 32,
        }
    }
}

impl BuildConfig {
    pub fn with_root(mut self, root: impl Into<EntityId>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_entity_uri_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entity_uri_prefix = prefix.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}
