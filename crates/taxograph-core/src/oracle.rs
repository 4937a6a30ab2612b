//! Oracle and label-lookup traits
//!
//! The classification oracle is the I/O boundary to the external entity
//! graph. The engine only builds query text and consumes structured records;
//! query execution lives behind these traits.

use crate::entity::{EntityId, LabeledEntity};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// One row of a SELECT result: requested field name -> string value.
///
/// Entity values come back as full URIs and are trimmed to bare identifiers
/// by the caller.
pub type Record = HashMap<String, String>;

/// Boolean and enumeration queries over the external entity graph
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    /// ASK whether a graph pattern holds
    async fn ask(&self, query: &str) -> Result<bool>;

    /// SELECT records; each record maps every requested field to a value
    async fn select(&self, query: &str, fields: &[&str]) -> Result<Vec<Record>>;
}

/// English-label lookup for entity identifiers
#[async_trait]
pub trait LabelLookup: Send + Sync {
    /// Labels for the given identifiers; entities without an English label
    /// come back with `label: None`
    async fn labels_of(&self, ids: &[EntityId]) -> Result<Vec<LabeledEntity>>;
}
