//! Entity identifiers and labels

use serde::{Deserialize, Serialize};

/// Identifier of a node in the external entity graph (e.g. "Q729").
///
/// Entities are never owned by the engine; they are only referenced by
/// identifier. Labels travel separately because most query results omit them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Build an identifier from a full URI by stripping a known prefix.
    ///
    /// URIs without the prefix are kept verbatim, so identifiers that are
    /// already bare pass through unchanged.
    pub fn from_uri(uri: &str, prefix: &str) -> Self {
        Self(uri.strip_prefix(prefix).unwrap_or(uri).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An entity together with its optional English label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledEntity {
    pub id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LabeledEntity {
    pub fn new(id: impl Into<EntityId>, label: Option<String>) -> Self {
        Self {
            id: id.into(),
            label,
        }
    }
}

/// Title-case a label: first letter of each word upper, rest lower.
///
/// Labels coming back from the external graph are lowercase by convention;
/// the persisted hierarchy stores them title-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut start_of_word = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if start_of_word {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            start_of_word = false;
        } else {
            out.push(c);
            start_of_word = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri_strips_prefix() {
        let id = EntityId::from_uri("http://www.wikidata.org/entity/Q729", "http://www.wikidata.org/entity/");
        assert_eq!(id.as_str(), "Q729");
    }

    #[test]
    fn test_from_uri_keeps_bare_identifier() {
        let id = EntityId::from_uri("Q729", "http://www.wikidata.org/entity/");
        assert_eq!(id.as_str(), "Q729");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("domestic cat"), "Domestic Cat");
        assert_eq!(title_case("DOG"), "Dog");
        assert_eq!(title_case("bird-of-paradise"), "Bird-Of-Paradise");
        assert_eq!(title_case(""), "");
    }
}
