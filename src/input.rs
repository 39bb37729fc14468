//! Loading subject inputs from JSON files

use crate::error::{InputError, NutriError, Result};
use crate::models::SubjectInput;
use std::fs;
use std::path::Path;
use tracing::info;

fn read(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(InputError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(fs::read_to_string(path)?)
}

fn malformed(path: &Path, err: serde_json::Error) -> NutriError {
    InputError::Malformed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
    .into()
}

/// Reject inputs no analysis can be reported for
pub fn validate_subject(input: &SubjectInput) -> Result<()> {
    if input.subject_id.trim().is_empty() {
        return Err(NutriError::Validation(
            "subject_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Load one subject from a JSON object
pub fn load_subject(path: &Path) -> Result<SubjectInput> {
    let content = read(path)?;
    let input: SubjectInput = serde_json::from_str(&content).map_err(|e| malformed(path, e))?;
    validate_subject(&input)?;
    Ok(input)
}

/// Load subjects from a JSON array
pub fn load_batch(path: &Path) -> Result<Vec<SubjectInput>> {
    let content = read(path)?;
    let inputs: Vec<SubjectInput> =
        serde_json::from_str(&content).map_err(|e| malformed(path, e))?;

    if inputs.is_empty() {
        return Err(InputError::EmptyBatch {
            path: path.to_path_buf(),
        }
        .into());
    }
    for input in &inputs {
        validate_subject(input)?;
    }

    info!(subjects = inputs.len(), path = %path.display(), "Loaded batch");
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SUBJECT: &str = r#"{
        "subject_id": "alice",
        "today": "2024-03-10",
        "profile": { "weight_kg": 68.0, "height_cm": 165.0 },
        "weight_logs": [
            { "date": "2024-03-09", "value": 68.4 },
            { "date": "2024-03-10", "value": 68.0 }
        ]
    }"#;

    #[test]
    fn test_load_subject_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alice.json");
        fs::write(&path, SUBJECT).unwrap();

        let input = load_subject(&path).unwrap();
        assert_eq!(input.subject_id, "alice");
        assert_eq!(input.weight_logs.len(), 2);
        assert!(input.water_logs.is_empty());
        assert_eq!(input.manual_goals.weight_kg, None);
    }

    #[test]
    fn test_missing_file() {
        let err = load_subject(Path::new("/nonexistent/subject.json")).unwrap_err();
        assert!(matches!(
            err,
            NutriError::Input(InputError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_and_empty_batch() {
        let dir = tempdir().unwrap();

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            load_subject(&bad).unwrap_err(),
            NutriError::Input(InputError::Malformed { .. })
        ));

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "[]").unwrap();
        assert!(matches!(
            load_batch(&empty).unwrap_err(),
            NutriError::Input(InputError::EmptyBatch { .. })
        ));
    }

    #[test]
    fn test_blank_subject_id_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(&path, r#"[{ "subject_id": " ", "today": "2024-03-10" }]"#).unwrap();

        assert!(matches!(
            load_batch(&path).unwrap_err(),
            NutriError::Validation(_)
        ));
    }
}
