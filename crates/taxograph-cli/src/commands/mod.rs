//! Command implementations

pub mod build;
pub mod classify;
pub mod map;
pub mod reduce;

use std::path::Path;

use anyhow::Context;
use taxograph_core::ObjectRecord;

/// Load the object classification input from a JSON file
pub fn load_objects(path: &Path) -> anyhow::Result<Vec<ObjectRecord>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading objects from {}", path.display()))?;
    let objects: Vec<ObjectRecord> = serde_json::from_str(&data)
        .with_context(|| format!("parsing objects from {}", path.display()))?;
    tracing::debug!("Loaded {} objects from {}", objects.len(), path.display());
    Ok(objects)
}

/// Write the object classification input back to disk.
///
/// Classification and mapping progress lives in this file, so it is rewritten
/// even when a stage aborts partway.
pub fn save_objects(path: &Path, objects: &[ObjectRecord]) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(objects)?;
    std::fs::write(path, data)
        .with_context(|| format!("writing objects to {}", path.display()))?;
    tracing::debug!("Saved {} objects to {}", objects.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxograph_core::EntityId;

    #[test]
    fn test_objects_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.json");

        let mut record = ObjectRecord::new("Q144", "Dog");
        record.pattern = Some("direct_subclass".to_string());
        record.superclasses = Some(vec!["Q39201".into()]);
        save_objects(&path, &[record]).unwrap();

        let loaded = load_objects(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].identifier.as_str(), "Q144");
        assert_eq!(loaded[0].pattern.as_deref(), Some("direct_subclass"));
        assert_eq!(
            loaded[0].superclasses,
            Some(vec![EntityId::from("Q39201")])
        );
    }

    #[test]
    fn test_load_objects_names_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = load_objects(&path).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
