//! Taxograph Core - taxonomic graph construction engine
//!
//! Given per-object classification patterns and an external graph-query
//! oracle, this crate incrementally builds a single-rooted parent/child
//! hierarchy from the root class down to every anchorable object, then
//! removes redundant multi-hop edges in a transitive-reduction pass.

pub mod config;
pub mod edge;
pub mod entity;
pub mod error;
pub mod integrate;
pub mod oracle;
pub mod pattern;
pub mod reduce;
pub mod resolver;
pub mod store;

pub use config::BuildConfig;
pub use edge::{CandidateLink, Edge};
pub use entity::{title_case, EntityId, LabeledEntity};
pub use error::{Error, RerunStage, Result};
pub use integrate::{construct, BuildReport, GraphBuilder};
pub use oracle::{ClassificationOracle, LabelLookup, Record};
pub use pattern::{ObjectRecord, PathEvidence, Pattern};
pub use reduce::{reduce, ReduceStats};
pub use resolver::{ChainSource, PathResolver};
pub use store::EdgeStore;
