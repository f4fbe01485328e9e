//! Artifact import from JSON or YAML files
//!
//! A file holds a single artifact, a list of artifacts, or a bundle with
//! `artifacts` and `assessments`. Everything in one file is committed as one
//! transaction batch.

#![allow(clippy::result_large_err)]

use std::path::Path;

use knowlex_core::batch::{new_placeholder, BatchBuilder, WriteMethod};
use knowlex_core::errors::{ExError, ExErrorKind};
use knowlex_core::model::{Artifact, Assessment};
use knowlex_core::{ArtifactRepository, BatchReceipt, BatchType, TransactionBatch};
use knowlex_core::{log_op_end, log_op_error, log_op_start};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Yaml,
}

impl ImportFormat {
    /// `.json` is JSON; anything else is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ImportFormat::Json,
            _ => ImportFormat::Yaml,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportBundle {
    pub artifacts: Vec<Artifact>,
    pub assessments: Vec<Assessment>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImportDocument {
    Single(Box<Artifact>),
    List(Vec<Artifact>),
    Bundle(ImportBundle),
}

impl ImportDocument {
    pub fn into_bundle(self) -> ImportBundle {
        match self {
            ImportDocument::Single(artifact) => ImportBundle {
                artifacts: vec![*artifact],
                assessments: Vec::new(),
            },
            ImportDocument::List(artifacts) => ImportBundle {
                artifacts,
                assessments: Vec::new(),
            },
            ImportDocument::Bundle(bundle) => bundle,
        }
    }
}

fn invalid(message: String) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("import")
        .with_message(message)
}

/// # Errors
///
/// `InvalidInput` when the content does not parse as an import document.
pub fn parse_import(content: &str, format: ImportFormat) -> Result<ImportBundle, ExError> {
    let document: ImportDocument = match format {
        ImportFormat::Json => serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?,
        ImportFormat::Yaml => serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))?,
    };
    Ok(document.into_bundle())
}

/// Build the write batch for an import
///
/// Artifacts without an id are created under a fresh identifier; the rest
/// are written by id, creating or replacing.
///
/// # Errors
///
/// `InvalidInput` for an artifact without a url.
pub fn import_batch(bundle: ImportBundle) -> Result<TransactionBatch, ExError> {
    let mut builder = BatchBuilder::new();
    for mut artifact in bundle.artifacts {
        if artifact.url.trim().is_empty() {
            return Err(invalid(format!("artifact '{}' has no url", artifact.id)));
        }
        if artifact.id.is_empty() {
            artifact.id = new_placeholder();
        }
        builder = builder.upsert(artifact);
    }
    for mut assessment in bundle.assessments {
        let method = if assessment.id.is_empty() {
            assessment.id = new_placeholder();
            WriteMethod::Post
        } else {
            WriteMethod::Put
        };
        builder = builder.assessment(assessment, method);
    }
    Ok(builder.build(BatchType::Transaction))
}

/// Read, parse and commit an import file
///
/// # Errors
///
/// `Io` when the file cannot be read, `InvalidInput` for malformed content,
/// and any commit failure.
pub fn import_file<R: ArtifactRepository + ?Sized>(
    repo: &mut R,
    path: &Path,
) -> Result<BatchReceipt, ExError> {
    log_op_start!("import", path = %path.display());
    let start = std::time::Instant::now();

    let result = import_file_impl(repo, path).map_err(|e| {
        log_op_error!("import", e.clone(), duration_ms = start.elapsed().as_millis() as u64);
        e
    })?;

    log_op_end!(
        "import",
        duration_ms = start.elapsed().as_millis() as u64,
        batch_len = result.entries.len()
    );
    Ok(result)
}

fn import_file_impl<R: ArtifactRepository + ?Sized>(
    repo: &mut R,
    path: &Path,
) -> Result<BatchReceipt, ExError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ExError::new(ExErrorKind::Io)
            .with_op("import")
            .with_message(format!("{}: {}", path.display(), e))
    })?;
    let bundle = parse_import(&content, ImportFormat::from_path(path))?;
    let batch = import_batch(bundle)?;
    repo.commit_batch(&batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowlex_core::model::{ArtifactKind, Status};
    use knowlex_core::MemoryRepository;

    const YAML_LIST: &str = r#"
- id: spec
  url: http://example.org/spec
  version: 1.0.0
  status: active
  kind: specification
- id: ""
  url: http://example.org/list
  version: 2.0.0
  status: draft
  kind: code-list
"#;

    #[test]
    fn test_parse_yaml_list() {
        let bundle = parse_import(YAML_LIST, ImportFormat::Yaml).unwrap();
        assert_eq!(bundle.artifacts.len(), 2);
        assert_eq!(bundle.artifacts[0].kind, ArtifactKind::Specification);
        assert_eq!(bundle.artifacts[1].status, Status::Draft);
    }

    #[test]
    fn test_parse_single_json_artifact() {
        let json = r#"{"id":"a","url":"http://example.org/a","status":"active","kind":"library"}"#;
        let bundle = parse_import(json, ImportFormat::Json).unwrap();
        assert_eq!(bundle.artifacts.len(), 1);
        assert!(bundle.assessments.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_import("artifacts: 3", ImportFormat::Yaml).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_import_assigns_ids_and_commits() {
        let mut repo = MemoryRepository::new();
        let batch = import_batch(parse_import(YAML_LIST, ImportFormat::Yaml).unwrap()).unwrap();
        let receipt = repo.commit_batch(&batch).unwrap();
        assert_eq!(receipt.created(), 2);
        assert!(repo.read("spec").unwrap().is_some());
        assert_eq!(repo.artifact_count(), 2);
    }

    #[test]
    fn test_import_requires_url() {
        let bundle = ImportBundle {
            artifacts: vec![Artifact::new("a", " ", ArtifactKind::Library)],
            assessments: Vec::new(),
        };
        assert_eq!(
            import_batch(bundle).unwrap_err().kind(),
            ExErrorKind::InvalidInput
        );
    }
}
