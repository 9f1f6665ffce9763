//! Selecting and loading the operation under test.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use apiprobe_schema::{HttpMethod, OperationKey, SchemaDocument, SchemaIndex};

use crate::request::DEFAULT_ENDPOINT;

/// OpenAPI document and the operation within it.
#[derive(Args, Debug, Clone)]
pub struct OperationArgs {
    /// OpenAPI document (JSON, or YAML by `.yaml`/`.yml` extension).
    #[arg(long, default_value = "venus.json")]
    pub spec: PathBuf,

    /// Path template of the operation, exactly as listed under `paths`.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub path: String,

    /// Operation method.
    #[arg(long, default_value = "post")]
    pub method: HttpMethod,
}

impl OperationArgs {
    pub fn key(&self) -> OperationKey {
        OperationKey::new(self.path.clone(), self.method)
    }

    /// Read the document and index the operation's responses.
    pub fn load(&self) -> Result<SchemaIndex> {
        let document = SchemaDocument::from_path(&self.spec)
            .with_context(|| format!("failed to load {}", self.spec.display()))?;
        let key = self.key();
        let index = SchemaIndex::load(&document, &key)
            .with_context(|| format!("failed to index {key} in {}", self.spec.display()))?;
        tracing::info!(operation = %key, labels = index.len(), "loaded response schemas");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(spec: PathBuf, path: &str) -> OperationArgs {
        OperationArgs {
            spec,
            path: path.to_string(),
            method: HttpMethod::Post,
        }
    }

    #[test]
    fn load_indexes_operation() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("api.json");
        std::fs::write(
            &spec,
            r#"{"paths": {"/r": {"post": {"responses": {"200": {}, "default": {}}}}}}"#,
        )
        .unwrap();
        let index = args(spec, "/r").load().unwrap();
        assert_eq!(index.labels().collect::<Vec<_>>(), ["200", "default"]);
    }

    #[test]
    fn load_reports_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let err = args(dir.path().join("absent.json"), "/r").load().unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[test]
    fn load_reports_missing_operation() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("api.json");
        std::fs::write(&spec, r#"{"paths": {}}"#).unwrap();
        let err = args(spec, "/nonexistent").load().unwrap_err();
        assert!(format!("{err:#}").contains("POST /nonexistent"));
    }
}
