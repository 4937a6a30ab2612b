//! Classification patterns and per-pattern path evidence

use crate::edge::CandidateLink;
use crate::entity::EntityId;
use crate::error::{Error, RerunStage, Result};
use serde::{Deserialize, Serialize};

/// Evidence shape connecting an object to the root class.
///
/// Assigned once per object before construction begins; the engine treats
/// it as given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// The object is declared an instance of a class below the root
    DirectInstance,
    /// The object is declared a direct subclass of one or more classes
    DirectSubclass,
    /// The object connects through a chain of taxonomic parents
    TaxonChain,
    /// One subclass hop, then a taxonomic chain from the superclass
    SubclassThenTaxonChain,
}

impl Pattern {
    /// Probe order used when classifying an object
    pub const ALL: [Pattern; 4] = [
        Pattern::DirectSubclass,
        Pattern::DirectInstance,
        Pattern::TaxonChain,
        Pattern::SubclassThenTaxonChain,
    ];

    /// The tag stored in the object classification input
    pub fn tag(&self) -> &'static str {
        match self {
            Self::DirectInstance => "direct_instance",
            Self::DirectSubclass => "direct_subclass",
            Self::TaxonChain => "taxon_chain",
            Self::SubclassThenTaxonChain => "subclass_then_taxon_chain",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "direct_instance" => Some(Self::DirectInstance),
            "direct_subclass" => Some(Self::DirectSubclass),
            "taxon_chain" => Some(Self::TaxonChain),
            "subclass_then_taxon_chain" => Some(Self::SubclassThenTaxonChain),
            _ => None,
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The fields each pattern needs, checked exhaustively at dispatch time
#[derive(Debug, Clone, PartialEq)]
pub enum PathEvidence {
    DirectInstance {
        superclass: EntityId,
    },
    DirectSubclass {
        superclasses: Vec<EntityId>,
    },
    TaxonChain {
        links: Vec<CandidateLink>,
    },
    SubclassThenTaxonChain {
        superclass: EntityId,
        links: Vec<CandidateLink>,
    },
}

/// One row of the object classification input.
///
/// The pattern tag and the pattern-specific fields are produced by the
/// `classify` and `map` stages; [`ObjectRecord::evidence`] validates their
/// presence before construction touches the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub identifier: EntityId,
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclasses: Option<Vec<EntityId>>,

    #[serde(
        rename = "taxonSuperclasses",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub taxon_superclasses: Option<Vec<CandidateLink>>,
}

impl ObjectRecord {
    pub fn new(identifier: impl Into<EntityId>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            pattern: None,
            superclass: None,
            superclasses: None,
            taxon_superclasses: None,
        }
    }

    /// The declared pattern, or an error if absent or unrecognized
    pub fn pattern(&self) -> Result<Pattern> {
        let tag = self.pattern.as_deref().ok_or(Error::MissingField {
            object: self.identifier.clone(),
            field: "pattern",
            rerun: RerunStage::PatternAssignment,
        })?;
        Pattern::parse(tag).ok_or_else(|| Error::InvalidPattern {
            object: self.identifier.clone(),
            pattern: tag.to_string(),
        })
    }

    /// Materialize the evidence variant for this record's pattern
    pub fn evidence(&self) -> Result<PathEvidence> {
        match self.pattern()? {
            Pattern::DirectInstance => Ok(PathEvidence::DirectInstance {
                superclass: self
                    .superclass
                    .clone()
                    .ok_or_else(|| self.missing("superclass"))?,
            }),
            Pattern::DirectSubclass => Ok(PathEvidence::DirectSubclass {
                superclasses: self
                    .superclasses
                    .clone()
                    .ok_or_else(|| self.missing("superclasses"))?,
            }),
            Pattern::TaxonChain => Ok(PathEvidence::TaxonChain {
                links: self
                    .taxon_superclasses
                    .clone()
                    .ok_or_else(|| self.missing("taxonSuperclasses"))?,
            }),
            Pattern::SubclassThenTaxonChain => Ok(PathEvidence::SubclassThenTaxonChain {
                superclass: self
                    .superclass
                    .clone()
                    .ok_or_else(|| self.missing("superclass"))?,
                links: self
                    .taxon_superclasses
                    .clone()
                    .ok_or_else(|| self.missing("taxonSuperclasses"))?,
            }),
        }
    }

    fn missing(&self, field: &'static str) -> Error {
        Error::MissingField {
            object: self.identifier.clone(),
            field,
            rerun: RerunStage::PathMapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_tags_round_trip() {
        for pattern in Pattern::ALL {
            assert_eq!(Pattern::parse(pattern.tag()), Some(pattern));
        }
        assert_eq!(Pattern::parse("subclass_of"), None);
    }

    #[test]
    fn test_missing_pattern_names_classify_stage() {
        let record = ObjectRecord::new("Q144", "Dog");
        let err = record.pattern().unwrap_err();
        match err {
            Error::MissingField { field, rerun, .. } => {
                assert_eq!(field, "pattern");
                assert_eq!(rerun, RerunStage::PatternAssignment);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unrecognized_pattern_is_fatal() {
        let mut record = ObjectRecord::new("Q144", "Dog");
        record.pattern = Some("instance_of".to_string());
        assert!(matches!(
            record.pattern(),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_evidence_requires_pattern_fields() {
        let mut record = ObjectRecord::new("Q144", "Dog");
        record.pattern = Some("taxon_chain".to_string());
        let err = record.evidence().unwrap_err();
        match err {
            Error::MissingField { field, rerun, .. } => {
                assert_eq!(field, "taxonSuperclasses");
                assert_eq!(rerun, RerunStage::PathMapping);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_evidence_materializes_variant() {
        let mut record = ObjectRecord::new("Q26972265", "Labradoodle");
        record.pattern = Some("direct_instance".to_string());
        record.superclass = Some(EntityId::from("Q144"));
        assert_eq!(
            record.evidence().unwrap(),
            PathEvidence::DirectInstance {
                superclass: EntityId::from("Q144")
            }
        );
    }
}
