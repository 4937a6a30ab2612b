//! Candidate links and committed edges

use crate::entity::EntityId;
use serde::{Deserialize, Serialize};

/// A provisional parent/child pair discovered by the path resolver.
///
/// Not yet committed to the accumulator; labels are carried when the query
/// that produced the link returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLink {
    pub parent: EntityId,
    pub child: EntityId,
    #[serde(rename = "parentLabel", default, skip_serializing_if = "Option::is_none")]
    pub parent_label: Option<String>,
    #[serde(rename = "childLabel", default, skip_serializing_if = "Option::is_none")]
    pub child_label: Option<String>,
}

impl CandidateLink {
    pub fn new(parent: impl Into<EntityId>, child: impl Into<EntityId>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            parent_label: None,
            child_label: None,
        }
    }

    pub fn with_labels(
        mut self,
        parent_label: impl Into<String>,
        child_label: impl Into<String>,
    ) -> Self {
        self.parent_label = Some(parent_label.into());
        self.child_label = Some(child_label.into());
        self
    }
}

/// A committed parent/child record in the accumulator.
///
/// Invariants held by [`crate::store::EdgeStore`]: `parent != child`, and at
/// most one edge exists per (parent, child) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub parent: EntityId,
    pub child: EntityId,
    #[serde(rename = "parentLabel", default, skip_serializing_if = "Option::is_none")]
    pub parent_label: Option<String>,
    #[serde(rename = "childLabel", default, skip_serializing_if = "Option::is_none")]
    pub child_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_with_labels() {
        let link = CandidateLink::new("Q144", "Q26972265").with_labels("Dog", "Labradoodle");
        assert_eq!(link.parent.as_str(), "Q144");
        assert_eq!(link.child_label.as_deref(), Some("Labradoodle"));
    }
}
