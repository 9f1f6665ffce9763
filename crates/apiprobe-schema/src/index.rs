//! # Schema Index
//!
//! The decoded response set of one operation plus the component schemas it
//! reaches. Built once by [`SchemaIndex::load`]; read-only afterwards and
//! safe to share across threads.
//!
//! Loading is where every structural problem surfaces: a missing operation,
//! an empty response set, a malformed schema or a `$ref` that does not
//! resolve. Only components reachable from the operation's responses are
//! decoded, so unrelated breakage elsewhere in a large document does not
//! block validation of this operation.

use std::collections::HashMap;

use serde_json::Value;

use crate::document::{OperationKey, SchemaDocument};
use crate::error::{SchemaLoadError, UnknownLabelError};
use crate::node::{self, component_name, PrimitiveKind, RefSite, SchemaNode, RESPONSE_REF_PREFIX};

static ANY: SchemaNode = SchemaNode::Any;

/// Media type preferred when a response declares several.
const JSON_MEDIA_TYPE: &str = "application/json";

/// Response schemas for a single operation, keyed by response label.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    operation: OperationKey,
    /// Labels in document order.
    responses: Vec<(String, SchemaNode)>,
    /// Reachable named schemas (`components.schemas` or `definitions`).
    components: HashMap<String, SchemaNode>,
}

impl SchemaIndex {
    /// Build the index for `operation`.
    ///
    /// # Errors
    ///
    /// - [`SchemaLoadError::OperationNotFound`] / [`SchemaLoadError::MethodNotFound`]
    ///   if the document does not declare the operation.
    /// - [`SchemaLoadError::EmptyResponses`] if it declares no response labels.
    /// - [`SchemaLoadError::InvalidLabel`] for a key that is not a status code,
    ///   status class or `default`.
    /// - [`SchemaLoadError::InvalidSchema`], [`SchemaLoadError::UnresolvedReference`],
    ///   [`SchemaLoadError::UnsupportedReference`] for broken schemas.
    pub fn load(
        document: &SchemaDocument,
        operation: &OperationKey,
    ) -> Result<Self, SchemaLoadError> {
        let raw = document.responses(operation)?;
        let mut refs: Vec<RefSite> = Vec::new();
        let mut responses = Vec::with_capacity(raw.len());

        for (label, response) in raw {
            // Specification extensions, not responses.
            if label.starts_with("x-") {
                continue;
            }
            if !is_valid_label(label) {
                return Err(SchemaLoadError::InvalidLabel {
                    label: label.clone(),
                    operation: operation.to_string(),
                });
            }

            let location = format!("{operation} responses/{label}");
            let response = follow_response_ref(document, response, &location)?;
            let node = match body_schema(response) {
                Body::Schema(schema) => {
                    node::decode(schema, &format!("{location}/schema"), &mut refs)?
                }
                Body::Unconstrained => SchemaNode::Any,
                Body::Empty => SchemaNode::Primitive {
                    kind: PrimitiveKind::Null,
                    allowed: Vec::new(),
                },
            };
            responses.push((label.clone(), node));
        }

        if responses.is_empty() {
            return Err(SchemaLoadError::EmptyResponses {
                operation: operation.to_string(),
            });
        }

        let mut components = HashMap::new();
        while let Some(site) = refs.pop() {
            if components.contains_key(&site.name) {
                continue;
            }
            let Some(schema) = document.component_schema(&site.name) else {
                return Err(SchemaLoadError::UnresolvedReference {
                    reference: site.reference,
                    location: site.location,
                });
            };
            let location = site.reference.trim_start_matches("#/").to_string();
            let decoded = node::decode(schema, &location, &mut refs)?;
            components.insert(site.name, decoded);
        }

        tracing::debug!(
            operation = %operation,
            labels = responses.len(),
            components = components.len(),
            "schema index loaded"
        );

        Ok(Self {
            operation: operation.clone(),
            responses,
            components,
        })
    }

    /// The operation this index describes.
    pub fn operation(&self) -> &OperationKey {
        &self.operation
    }

    /// Declared response labels in document order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.responses.iter().map(|(label, _)| label.as_str())
    }

    /// Number of declared labels.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Always false for a loaded index; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// The schema for `label` with top-level references followed.
    ///
    /// A chain of references that loops without reaching a concrete node
    /// resolves to [`SchemaNode::Any`].
    pub fn resolve(&self, label: &str) -> Result<&SchemaNode, UnknownLabelError> {
        let mut node = self.declared(label)?;
        let mut seen: Vec<&str> = Vec::new();
        while let SchemaNode::Reference(name) = node {
            if seen.contains(&name.as_str()) {
                return Ok(&ANY);
            }
            seen.push(name);
            node = self.component(name).unwrap_or(&ANY);
        }
        Ok(node)
    }

    /// A decoded component schema, if it is reachable from this operation.
    pub fn component(&self, name: &str) -> Option<&SchemaNode> {
        self.components.get(name)
    }

    /// The schema for `label` exactly as declared (references not followed).
    pub(crate) fn declared(&self, label: &str) -> Result<&SchemaNode, UnknownLabelError> {
        self.responses
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, node)| node)
            .ok_or_else(|| UnknownLabelError {
                label: label.to_string(),
                operation: self.operation.to_string(),
            })
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &SchemaNode)> + '_ {
        self.responses.iter().map(|(l, n)| (l.as_str(), n))
    }
}

/// `default`, a three-digit status code, or a status class such as `4XX`.
pub(crate) fn is_valid_label(label: &str) -> bool {
    if label == "default" {
        return true;
    }
    let b = label.as_bytes();
    if b.len() != 3 || !(b'1'..=b'5').contains(&b[0]) {
        return false;
    }
    let digits = b[1].is_ascii_digit() && b[2].is_ascii_digit();
    let class = b[1].eq_ignore_ascii_case(&b'x') && b[2].eq_ignore_ascii_case(&b'x');
    digits || class
}

/// Follow `$ref`s between response objects until a concrete one is reached.
fn follow_response_ref<'a>(
    document: &'a SchemaDocument,
    mut response: &'a Value,
    location: &str,
) -> Result<&'a Value, SchemaLoadError> {
    let mut seen: Vec<String> = Vec::new();
    while let Some(reference) = response.get("$ref") {
        let reference = reference.as_str().ok_or_else(|| SchemaLoadError::InvalidSchema {
            location: location.to_string(),
            reason: "$ref must be a string".to_string(),
        })?;
        let name = component_name(reference, RESPONSE_REF_PREFIX).ok_or_else(|| {
            SchemaLoadError::UnsupportedReference {
                reference: reference.to_string(),
                location: location.to_string(),
            }
        })?;
        if seen.contains(&name) {
            return Err(SchemaLoadError::InvalidSchema {
                location: location.to_string(),
                reason: format!("response reference cycle through '{name}'"),
            });
        }
        response = document.component_response(&name).ok_or_else(|| {
            SchemaLoadError::UnresolvedReference {
                reference: reference.to_string(),
                location: location.to_string(),
            }
        })?;
        seen.push(name);
    }
    Ok(response)
}

/// What a response object says about its body.
#[derive(Debug, PartialEq)]
enum Body<'a> {
    Schema(&'a Value),
    /// A media type without a schema: any body.
    Unconstrained,
    /// Neither `content` nor `schema`: no body at all.
    Empty,
}

/// The body schema of a response object.
///
/// OpenAPI 3 responses carry it under `content.<media type>.schema`,
/// preferring `application/json` and otherwise taking the first media type
/// in document order. Swagger 2 responses carry it directly under `schema`.
fn body_schema(response: &Value) -> Body<'_> {
    if let Some(content) = response.get("content").and_then(Value::as_object) {
        let media = content
            .get(JSON_MEDIA_TYPE)
            .or_else(|| content.values().next());
        return match media {
            Some(media) => media.get("schema").map_or(Body::Unconstrained, Body::Schema),
            None => Body::Empty,
        };
    }
    response.get("schema").map_or(Body::Empty, Body::Schema)
}
