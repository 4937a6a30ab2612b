//! Taxograph Oracle - SPARQL client backing the construction engine
//!
//! Provides [`SparqlClient`], an HTTP client for a SPARQL endpoint serving
//! JSON results, implementing the core crate's `ClassificationOracle` and
//! `LabelLookup` traits. Response parsing is pure and tested offline.

pub mod error;
pub mod response;
pub mod sparql;

pub use error::{OracleError, OracleResult};
pub use sparql::{SparqlClient, WIKIDATA_ENDPOINT, WIKIDATA_ENTITY_PREFIX};
