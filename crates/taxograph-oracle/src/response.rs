//! SPARQL JSON results parsing
//!
//! Pure functions over the response body so the wire format is testable
//! without a network.

use crate::error::{OracleError, OracleResult};
use serde_json::Value;
use taxograph_core::Record;

/// Extract the boolean of an ASK response
pub fn parse_ask(body: &Value) -> OracleResult<bool> {
    body.get("boolean")
        .and_then(Value::as_bool)
        .ok_or_else(|| OracleError::MalformedResponse("ASK response without boolean".to_string()))
}

/// Flatten SELECT bindings into records keyed by the requested fields.
///
/// Every requested field must be bound in every row; a partial binding is a
/// malformed response rather than a silent hole.
pub fn parse_bindings(body: &Value, fields: &[&str]) -> OracleResult<Vec<Record>> {
    let bindings = body
        .pointer("/results/bindings")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            OracleError::MalformedResponse("SELECT response without bindings".to_string())
        })?;
    let mut records = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let mut record = Record::new();
        for field in fields {
            let value = binding
                .pointer(&format!("/{field}/value"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    OracleError::MalformedResponse(format!("binding missing field \"{field}\""))
                })?;
            record.insert(field.to_string(), value.to_string());
        }
        records.push(record);
    }
    Ok(records)
}

/// Join a chunk of VALUES, optionally prefixing each one.
///
/// The `"str"` prefix quotes values instead, matching plain-literal VALUES
/// lists.
pub fn join_values(values: &[String], prefix: Option<&str>) -> String {
    match prefix {
        None => values.join(" "),
        Some("str") => values
            .iter()
            .map(|v| format!("\"{v}\""))
            .collect::<Vec<_>>()
            .join(" "),
        Some(p) => values
            .iter()
            .map(|v| format!("{p}{v}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ask() {
        assert!(parse_ask(&json!({"head": {}, "boolean": true})).unwrap());
        assert!(!parse_ask(&json!({"boolean": false})).unwrap());
        assert!(parse_ask(&json!({"results": {}})).is_err());
    }

    #[test]
    fn test_parse_bindings() {
        let body = json!({
            "results": {
                "bindings": [
                    {
                        "class": {"type": "uri", "value": "http://www.wikidata.org/entity/Q144"},
                        "classLabel": {"type": "literal", "xml:lang": "en", "value": "dog"}
                    }
                ]
            }
        });
        let records = parse_bindings(&body, &["class", "classLabel"]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0]["class"],
            "http://www.wikidata.org/entity/Q144"
        );
        assert_eq!(records[0]["classLabel"], "dog");
    }

    #[test]
    fn test_parse_bindings_missing_field() {
        let body = json!({"results": {"bindings": [{"class": {"value": "Q144"}}]}});
        assert!(matches!(
            parse_bindings(&body, &["class", "classLabel"]),
            Err(OracleError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_join_values() {
        let values = vec!["Q144".to_string(), "Q146".to_string()];
        assert_eq!(join_values(&values, Some("wd:")), "wd:Q144 wd:Q146");
        assert_eq!(join_values(&values, Some("str")), "\"Q144\" \"Q146\"");
        assert_eq!(join_values(&values, None), "Q144 Q146");
    }
}
