//! # Schema Documents
//!
//! An OpenAPI document held as a JSON value tree. Documents are read once
//! and never mutated; [`crate::SchemaIndex::load`] pulls a single
//! operation's responses and the components they reference out of it.
//!
//! YAML documents are converted to the JSON value model on load. Object key
//! order is preserved in both formats, so response labels keep the order
//! in which the document lists them.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::SchemaLoadError;

/// The eight operation verbs an OpenAPI path item may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// All methods, in the order OpenAPI lists them in a path item.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// The lower-case key used inside an OpenAPI path item.
    pub fn as_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key().to_ascii_uppercase())
    }
}

/// Error parsing an [`HttpMethod`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown HTTP method '{0}'")]
pub struct ParseMethodError(pub String);

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_key() == lower)
            .ok_or_else(|| ParseMethodError(s.to_string()))
    }
}

/// Identifies one operation: a path template plus a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    /// Path template exactly as it appears under `paths`.
    pub path: String,
    /// Operation method.
    pub method: HttpMethod,
}

impl OperationKey {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A parsed OpenAPI document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    root: Value,
    source: String,
}

impl SchemaDocument {
    /// Wrap an already-parsed value.
    pub fn from_value(root: Value) -> Self {
        Self {
            root,
            source: "<memory>".to_string(),
        }
    }

    /// Parse a JSON document from a string.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaLoadError> {
        parse_json(content, "<inline>").map(Self::from_value)
    }

    /// Parse a YAML document from a string.
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaLoadError> {
        parse_yaml(content, "<inline>").map(Self::from_value)
    }

    /// Load a document from disk.
    ///
    /// `.yaml` and `.yml` files are parsed as YAML, everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::DocumentLoad`] if the file cannot be read
    /// or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaLoadError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| SchemaLoadError::DocumentLoad {
                path: source.clone(),
                reason: format!("cannot read file: {e}"),
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let root = match ext {
            "yaml" | "yml" => parse_yaml(&content, &source)?,
            _ => parse_json(&content, &source)?,
        };

        tracing::debug!(path = %source, "loaded schema document");
        Ok(Self { root, source })
    }

    /// Where the document came from (a file path, or a placeholder).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The raw document tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Every operation the document declares, in document order.
    pub fn operations(&self) -> Vec<OperationKey> {
        let Some(paths) = self.root.get("paths").and_then(Value::as_object) else {
            return Vec::new();
        };
        paths
            .iter()
            .flat_map(|(path, item)| {
                HttpMethod::ALL
                    .into_iter()
                    .filter(move |m| item.get(m.as_key()).is_some_and(Value::is_object))
                    .map(move |m| OperationKey::new(path.clone(), m))
            })
            .collect()
    }

    /// The `responses` object of one operation.
    pub(crate) fn responses(
        &self,
        key: &OperationKey,
    ) -> Result<&Map<String, Value>, SchemaLoadError> {
        let item = self
            .root
            .get("paths")
            .and_then(|p| p.get(&key.path))
            .ok_or_else(|| SchemaLoadError::OperationNotFound {
                path: key.path.clone(),
            })?;

        let operation =
            item.get(key.method.as_key())
                .ok_or_else(|| SchemaLoadError::MethodNotFound {
                    path: key.path.clone(),
                    method: key.method.to_string(),
                })?;

        match operation.get("responses") {
            None => Err(SchemaLoadError::EmptyResponses {
                operation: key.to_string(),
            }),
            Some(Value::Object(map)) => Ok(map),
            Some(_) => Err(SchemaLoadError::InvalidSchema {
                location: format!("{key} responses"),
                reason: "responses must be an object".to_string(),
            }),
        }
    }

    /// A named schema: `components.schemas` first, then Swagger 2
    /// `definitions`.
    pub(crate) fn component_schema(&self, name: &str) -> Option<&Value> {
        self.root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get(name))
            .or_else(|| self.root.get("definitions").and_then(|d| d.get(name)))
    }

    /// A response under `components.responses`.
    pub(crate) fn component_response(&self, name: &str) -> Option<&Value> {
        self.root
            .get("components")
            .and_then(|c| c.get("responses"))
            .and_then(|s| s.get(name))
    }
}

fn parse_json(content: &str, path: &str) -> Result<Value, SchemaLoadError> {
    serde_json::from_str(content).map_err(|e| SchemaLoadError::DocumentLoad {
        path: path.to_string(),
        reason: format!("invalid JSON: {e}"),
    })
}

fn parse_yaml(content: &str, path: &str) -> Result<Value, SchemaLoadError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| SchemaLoadError::DocumentLoad {
            path: path.to_string(),
            reason: format!("invalid YAML: {e}"),
        })?;
    yaml_to_json_value(&yaml).map_err(|reason| SchemaLoadError::DocumentLoad {
        path: path.to_string(),
        reason: format!("YAML-to-JSON conversion failed: {reason}"),
    })
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Response maps are commonly written with unquoted status codes
/// (`200:`), which YAML reads as integers; map keys are therefore
/// stringified rather than rejected.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(u.into()))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> SchemaDocument {
        SchemaDocument::from_value(json!({
            "openapi": "3.0.3",
            "paths": {
                "/things": {
                    "get": {"responses": {"200": {"description": "ok"}}},
                    "post": {"responses": {"201": {"description": "created"}}},
                    "parameters": []
                },
                "/empty": {"get": {}}
            }
        }))
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!(" get ".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert!("fetch".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn operation_key_display() {
        let key = OperationKey::new("/a/b", HttpMethod::Patch);
        assert_eq!(key.to_string(), "PATCH /a/b");
    }

    #[test]
    fn operations_lists_methods_in_document_order() {
        let ops = doc().operations();
        let rendered: Vec<String> = ops.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["GET /things", "POST /things", "GET /empty"]);
    }

    #[test]
    fn responses_reports_missing_path_and_method() {
        let d = doc();
        let err = d
            .responses(&OperationKey::new("/nope", HttpMethod::Get))
            .unwrap_err();
        assert!(matches!(err, SchemaLoadError::OperationNotFound { .. }));

        let err = d
            .responses(&OperationKey::new("/things", HttpMethod::Delete))
            .unwrap_err();
        assert!(matches!(err, SchemaLoadError::MethodNotFound { .. }));

        let err = d
            .responses(&OperationKey::new("/empty", HttpMethod::Get))
            .unwrap_err();
        assert!(matches!(err, SchemaLoadError::EmptyResponses { .. }));
    }

    #[test]
    fn yaml_integer_keys_become_strings() {
        let d = SchemaDocument::from_yaml_str(
            r#"
paths:
  /x:
    get:
      responses:
        200:
          description: ok
        "404":
          description: missing
"#,
        )
        .unwrap();
        let responses = d
            .responses(&OperationKey::new("/x", HttpMethod::Get))
            .unwrap();
        let keys: Vec<&str> = responses.keys().map(String::as_str).collect();
        assert_eq!(keys, ["200", "404"]);
    }

    #[test]
    fn invalid_json_is_a_load_error() {
        let err = SchemaDocument::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, SchemaLoadError::DocumentLoad { .. }));
    }

    #[test]
    fn from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("api.yaml");
        std::fs::write(&yaml_path, "paths: {}\n").unwrap();
        let d = SchemaDocument::from_path(&yaml_path).unwrap();
        assert_eq!(d.root()["paths"], json!({}));
        assert!(d.source().ends_with("api.yaml"));

        let json_path = dir.path().join("api.json");
        std::fs::write(&json_path, r#"{"paths": {}}"#).unwrap();
        let d = SchemaDocument::from_path(&json_path).unwrap();
        assert_eq!(d.source(), json_path.display().to_string());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();
        match SchemaDocument::from_path(&broken).unwrap_err() {
            SchemaLoadError::DocumentLoad { path, .. } => assert!(path.ends_with("broken.json")),
            other => panic!("unexpected error {other}"),
        }

        let missing = dir.path().join("missing.json");
        let err = SchemaDocument::from_path(&missing).unwrap_err();
        assert!(matches!(err, SchemaLoadError::DocumentLoad { .. }));
    }

    #[test]
    fn component_schema_falls_back_to_definitions() {
        let d = SchemaDocument::from_value(json!({
            "swagger": "2.0",
            "definitions": {"Firm": {"type": "object"}},
            "components": {"schemas": {"Page": {"type": "integer"}}}
        }));
        assert_eq!(d.component_schema("Firm"), Some(&json!({"type": "object"})));
        assert_eq!(d.component_schema("Page"), Some(&json!({"type": "integer"})));
        assert_eq!(d.component_schema("Missing"), None);
    }
}
