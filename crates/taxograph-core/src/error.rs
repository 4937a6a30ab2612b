//! Error types for the Taxograph core

use crate::entity::EntityId;
use thiserror::Error;

/// Result type alias using the core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Upstream pipeline stage that must be rerun to repair an input record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerunStage {
    /// Pattern tags are assigned by the `classify` stage
    PatternAssignment,
    /// Pattern-specific evidence fields are filled by the `map` stage
    PathMapping,
}

impl std::fmt::Display for RerunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PatternAssignment => write!(f, "pattern assignment (run the `classify` stage)"),
            Self::PathMapping => write!(f, "path mapping (run the `map` stage)"),
        }
    }
}

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("object {object}: \"{pattern}\" is not a recognized path pattern \
             (direct_instance, direct_subclass, taxon_chain, subclass_then_taxon_chain)")]
    InvalidPattern { object: EntityId, pattern: String },

    #[error("object {object}: field \"{field}\" not set; rerun {rerun}")]
    MissingField {
        object: EntityId,
        field: &'static str,
        rerun: RerunStage,
    },

    #[error("resolution of {object} exceeded depth {depth} without reaching the root")]
    RecursionLimit { object: EntityId, depth: u32 },

    #[error("parents {a} and {b} of {child} are mutually reachable; refusing to reduce")]
    CycleAnomaly {
        child: EntityId,
        a: EntityId,
        b: EntityId,
    },

    #[error("oracle failure: {0}")]
    Oracle(String),

    #[error("malformed edge row {line}: {reason}")]
    MalformedEdgeRow { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
