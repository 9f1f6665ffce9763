//! # Schema Nodes
//!
//! The expected shape of a response body, decoded once from the document's
//! duck-typed schema objects into a closed set of variants. Validation then
//! matches exhaustively on [`SchemaNode`] instead of probing keywords.
//!
//! ## Decoding rules
//!
//! - `$ref: "#/components/schemas/<Name>"` (or Swagger 2
//!   `"#/definitions/<Name>"`) → [`SchemaNode::Reference`]; sibling keywords
//!   are ignored (OpenAPI 3.0 semantics). Any other `$ref` form is rejected
//!   at load time.
//! - `type: object`, or no `type` with `properties`/`required`/
//!   `additionalProperties` → [`SchemaNode::Object`].
//! - `type: array`, or no `type` with `items` → [`SchemaNode::Array`].
//! - `string`, `number`, `integer`, `boolean`, `null` →
//!   [`SchemaNode::Primitive`], carrying `enum` values if present.
//! - `enum` without `type` → [`SchemaNode::Enum`].
//! - `allOf`/`anyOf`/`oneOf` → [`SchemaNode::Composite`]. A schema with both
//!   a shape and composites becomes an `allOf` over all of them.
//! - `nullable: true`, or `"null"` inside a `type` array →
//!   [`SchemaNode::Nullable`].
//! - `false` → [`SchemaNode::Never`].
//! - Anything else (`{}`, `true`, keyword-only schemas) → [`SchemaNode::Any`].

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SchemaLoadError;

/// `$ref` prefixes resolved for schemas: OpenAPI 3, then Swagger 2.
pub(crate) const SCHEMA_REF_PREFIXES: [&str; 2] = ["#/components/schemas/", "#/definitions/"];

/// Prefix of the only `$ref` form resolved for response objects.
pub(crate) const RESPONSE_REF_PREFIX: &str = "#/components/responses/";

/// A JSON primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl PrimitiveKind {
    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// The JSON Schema type name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }

    /// Whether `value` has this runtime type.
    ///
    /// Integral floats (`1.0`) count as integers, as in JSON Schema.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => match value {
                Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
                }
                _ => false,
            },
            Self::Boolean => value.is_boolean(),
            Self::Null => value.is_null(),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the branches of a composite schema combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompositeMode {
    /// Every branch must conform.
    AllOf,
    /// At least one branch must conform.
    AnyOf,
    /// Exactly one branch must conform.
    OneOf,
}

impl CompositeMode {
    const ALL: [CompositeMode; 3] = [Self::AllOf, Self::AnyOf, Self::OneOf];

    /// The schema keyword for this mode.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::AllOf => "allOf",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
        }
    }
}

impl fmt::Display for CompositeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Treatment of object fields not listed under `properties`.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// Undeclared fields are ignored.
    Allowed,
    /// Undeclared fields are violations (`additionalProperties: false`).
    Forbidden,
    /// Undeclared fields must conform to this schema.
    Schema(Box<SchemaNode>),
}

/// One node of an expected-shape description.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Accepts every value.
    Any,
    /// Accepts no value (the `false` schema).
    Never,
    /// One of the listed values, whatever their type.
    Enum(Vec<Value>),
    /// A JSON primitive, optionally restricted to `allowed` values.
    Primitive {
        kind: PrimitiveKind,
        /// `enum` values; empty means unrestricted.
        allowed: Vec<Value>,
    },
    /// A JSON object.
    Object {
        /// Declared fields in document order.
        properties: Vec<(String, SchemaNode)>,
        /// Names of fields that must be present.
        required: Vec<String>,
        additional: AdditionalProperties,
    },
    /// A JSON array whose elements all conform to `items`.
    Array { items: Box<SchemaNode> },
    /// A named entry of `components.schemas`.
    Reference(String),
    /// `null`, or a value conforming to the inner node.
    Nullable(Box<SchemaNode>),
    /// `allOf` / `anyOf` / `oneOf`.
    Composite {
        mode: CompositeMode,
        branches: Vec<SchemaNode>,
    },
}

impl SchemaNode {
    /// Short description of the expected shape, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Never => "nothing".to_string(),
            Self::Enum(values) => format!("enum of {}", values.len()),
            Self::Primitive { kind, .. } => kind.name().to_string(),
            Self::Object { .. } => "object".to_string(),
            Self::Array { .. } => "array".to_string(),
            Self::Reference(name) => format!("#{name}"),
            Self::Nullable(inner) => format!("{} or null", inner.describe()),
            Self::Composite { mode, branches } => format!("{mode} of {}", branches.len()),
        }
    }

    fn into_nullable(self) -> Self {
        match self {
            Self::Any | Self::Nullable(_) => self,
            Self::Primitive {
                kind: PrimitiveKind::Null,
                ..
            } => self,
            other => Self::Nullable(Box::new(other)),
        }
    }
}

/// A component reference found while decoding.
#[derive(Debug, Clone)]
pub(crate) struct RefSite {
    /// Component name.
    pub name: String,
    /// The raw `$ref` string.
    pub reference: String,
    /// Where the `$ref` appeared.
    pub location: String,
}

/// Extract a component name from a local `$ref`, undoing JSON-pointer escapes.
pub(crate) fn component_name(reference: &str, prefix: &str) -> Option<String> {
    let rest = reference.strip_prefix(prefix)?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(rest.replace("~1", "/").replace("~0", "~"))
}

/// Decode one schema value. Component references are appended to `refs`.
pub(crate) fn decode(
    value: &Value,
    location: &str,
    refs: &mut Vec<RefSite>,
) -> Result<SchemaNode, SchemaLoadError> {
    let obj = match value {
        Value::Bool(true) => return Ok(SchemaNode::Any),
        Value::Bool(false) => return Ok(SchemaNode::Never),
        Value::Object(obj) => obj,
        _ => return Err(invalid(location, "schema must be an object or a boolean")),
    };

    if let Some(reference) = obj.get("$ref") {
        let reference = reference
            .as_str()
            .ok_or_else(|| invalid(location, "$ref must be a string"))?;
        let name = SCHEMA_REF_PREFIXES
            .iter()
            .find_map(|prefix| component_name(reference, prefix))
            .ok_or_else(|| SchemaLoadError::UnsupportedReference {
                reference: reference.to_string(),
                location: location.to_string(),
            })?;
        refs.push(RefSite {
            name: name.clone(),
            reference: reference.to_string(),
            location: location.to_string(),
        });
        return Ok(SchemaNode::Reference(name));
    }

    let mut parts = Vec::new();
    if let Some(shape) = decode_shape(obj, location, refs)? {
        parts.push(shape);
    }
    for mode in CompositeMode::ALL {
        let Some(list) = obj.get(mode.keyword()) else {
            continue;
        };
        let list = match list {
            Value::Array(items) if !items.is_empty() => items,
            _ => {
                return Err(invalid(
                    location,
                    &format!("{mode} must be a non-empty array"),
                ))
            }
        };
        let branches = list
            .iter()
            .enumerate()
            .map(|(i, branch)| decode(branch, &format!("{location}/{mode}/{i}"), refs))
            .collect::<Result<Vec<_>, _>>()?;
        parts.push(SchemaNode::Composite { mode, branches });
    }

    let node = if parts.len() > 1 {
        SchemaNode::Composite {
            mode: CompositeMode::AllOf,
            branches: parts,
        }
    } else {
        parts.pop().unwrap_or(SchemaNode::Any)
    };

    let nullable = obj.get("nullable").and_then(Value::as_bool).unwrap_or(false);
    Ok(if nullable { node.into_nullable() } else { node })
}

fn decode_shape(
    obj: &Map<String, Value>,
    location: &str,
    refs: &mut Vec<RefSite>,
) -> Result<Option<SchemaNode>, SchemaLoadError> {
    match obj.get("type") {
        None => {
            let looks_like_object = ["properties", "required", "additionalProperties"]
                .iter()
                .any(|k| obj.contains_key(*k));
            if looks_like_object {
                decode_object(obj, location, refs).map(Some)
            } else if obj.contains_key("items") {
                decode_array(obj, location, refs).map(Some)
            } else if obj.contains_key("enum") {
                Ok(Some(SchemaNode::Enum(enum_values(obj, location)?)))
            } else {
                Ok(None)
            }
        }
        Some(Value::String(ty)) => decode_typed(ty, obj, location, refs).map(Some),
        Some(Value::Array(types)) => {
            let mut nullable = false;
            let mut nodes = Vec::new();
            for ty in types {
                let ty = ty
                    .as_str()
                    .ok_or_else(|| invalid(location, "type entries must be strings"))?;
                if ty == "null" {
                    nullable = true;
                } else {
                    nodes.push(decode_typed(ty, obj, location, refs)?);
                }
            }
            let node = match nodes.len() {
                0 => SchemaNode::Primitive {
                    kind: PrimitiveKind::Null,
                    allowed: enum_values(obj, location)?,
                },
                1 => nodes.remove(0),
                _ => SchemaNode::Composite {
                    mode: CompositeMode::AnyOf,
                    branches: nodes,
                },
            };
            Ok(Some(if nullable { node.into_nullable() } else { node }))
        }
        Some(_) => Err(invalid(
            location,
            "type must be a string or an array of strings",
        )),
    }
}

fn decode_typed(
    ty: &str,
    obj: &Map<String, Value>,
    location: &str,
    refs: &mut Vec<RefSite>,
) -> Result<SchemaNode, SchemaLoadError> {
    match ty {
        "object" => decode_object(obj, location, refs),
        "array" => decode_array(obj, location, refs),
        other => {
            let kind = PrimitiveKind::from_type_name(other)
                .ok_or_else(|| invalid(location, &format!("unknown type '{other}'")))?;
            Ok(SchemaNode::Primitive {
                kind,
                allowed: enum_values(obj, location)?,
            })
        }
    }
}

fn decode_object(
    obj: &Map<String, Value>,
    location: &str,
    refs: &mut Vec<RefSite>,
) -> Result<SchemaNode, SchemaLoadError> {
    let mut properties = Vec::new();
    match obj.get("properties") {
        None => {}
        Some(Value::Object(props)) => {
            for (name, schema) in props {
                let node = decode(schema, &format!("{location}/properties/{name}"), refs)?;
                properties.push((name.clone(), node));
            }
        }
        Some(_) => return Err(invalid(location, "properties must be an object")),
    }

    let required = match obj.get("required") {
        None => Vec::new(),
        Some(Value::Array(names)) => names
            .iter()
            .map(|n| {
                n.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(location, "required entries must be strings"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(invalid(location, "required must be an array")),
    };

    let additional = match obj.get("additionalProperties") {
        None | Some(Value::Bool(true)) => AdditionalProperties::Allowed,
        Some(Value::Bool(false)) => AdditionalProperties::Forbidden,
        Some(schema) => AdditionalProperties::Schema(Box::new(decode(
            schema,
            &format!("{location}/additionalProperties"),
            refs,
        )?)),
    };

    Ok(SchemaNode::Object {
        properties,
        required,
        additional,
    })
}

fn decode_array(
    obj: &Map<String, Value>,
    location: &str,
    refs: &mut Vec<RefSite>,
) -> Result<SchemaNode, SchemaLoadError> {
    let items = match obj.get("items") {
        None => SchemaNode::Any,
        Some(schema) => decode(schema, &format!("{location}/items"), refs)?,
    };
    Ok(SchemaNode::Array {
        items: Box::new(items),
    })
}

fn enum_values(obj: &Map<String, Value>, location: &str) -> Result<Vec<Value>, SchemaLoadError> {
    match obj.get("enum") {
        None => Ok(Vec::new()),
        Some(Value::Array(values)) => Ok(values.clone()),
        Some(_) => Err(invalid(location, "enum must be an array")),
    }
}

fn invalid(location: &str, reason: &str) -> SchemaLoadError {
    SchemaLoadError::InvalidSchema {
        location: location.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_ok(value: Value) -> (SchemaNode, Vec<RefSite>) {
        let mut refs = Vec::new();
        let node = decode(&value, "test", &mut refs).unwrap();
        (node, refs)
    }

    #[test]
    fn decodes_object_with_ordered_properties() {
        let (node, _) = decode_ok(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "zeta": {"type": "string"},
                "id": {"type": "integer"},
                "alpha": {"type": "boolean"}
            }
        }));
        let SchemaNode::Object {
            properties,
            required,
            additional,
        } = node
        else {
            panic!("expected object");
        };
        let names: Vec<&str> = properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["zeta", "id", "alpha"]);
        assert_eq!(required, ["id"]);
        assert_eq!(additional, AdditionalProperties::Allowed);
    }

    #[test]
    fn untyped_schema_with_properties_is_an_object() {
        let (node, _) = decode_ok(json!({"properties": {"a": {}}}));
        assert!(matches!(node, SchemaNode::Object { .. }));
    }

    #[test]
    fn additional_properties_variants() {
        let (node, _) = decode_ok(json!({"type": "object", "additionalProperties": false}));
        assert!(matches!(
            node,
            SchemaNode::Object {
                additional: AdditionalProperties::Forbidden,
                ..
            }
        ));

        let (node, _) =
            decode_ok(json!({"type": "object", "additionalProperties": {"type": "string"}}));
        let SchemaNode::Object {
            additional: AdditionalProperties::Schema(inner),
            ..
        } = node
        else {
            panic!("expected schema for additional properties");
        };
        assert_eq!(inner.describe(), "string");
    }

    #[test]
    fn reference_is_recorded() {
        let (node, refs) = decode_ok(json!({
            "type": "array",
            "items": {"$ref": "#/components/schemas/Investor~1Firm"}
        }));
        let SchemaNode::Array { items } = node else {
            panic!("expected array");
        };
        assert_eq!(*items, SchemaNode::Reference("Investor/Firm".into()));
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].location, "test/items");
    }

    #[test]
    fn remote_reference_is_rejected() {
        let mut refs = Vec::new();
        let err = decode(
            &json!({"$ref": "https://example.com/schemas/x.json"}),
            "loc",
            &mut refs,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaLoadError::UnsupportedReference { .. }));
    }

    #[test]
    fn nullable_forms() {
        let (node, _) = decode_ok(json!({"type": "string", "nullable": true}));
        assert_eq!(node.describe(), "string or null");

        let (node, _) = decode_ok(json!({"type": ["integer", "null"]}));
        assert_eq!(node.describe(), "integer or null");

        let (node, _) = decode_ok(json!({"type": ["string", "integer"]}));
        assert_eq!(node.describe(), "anyOf of 2");
    }

    #[test]
    fn shape_and_composite_combine_into_all_of() {
        let (node, refs) = decode_ok(json!({
            "type": "object",
            "required": ["id"],
            "oneOf": [
                {"$ref": "#/components/schemas/A"},
                {"$ref": "#/components/schemas/B"}
            ]
        }));
        let SchemaNode::Composite { mode, branches } = node else {
            panic!("expected composite");
        };
        assert_eq!(mode, CompositeMode::AllOf);
        assert_eq!(branches.len(), 2);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn empty_and_true_schemas_accept_anything() {
        assert_eq!(decode_ok(json!({})).0, SchemaNode::Any);
        assert_eq!(decode_ok(json!(true)).0, SchemaNode::Any);
        assert_eq!(decode_ok(json!({"description": "free-form"})).0, SchemaNode::Any);
    }

    #[test]
    fn false_schema_accepts_nothing() {
        assert_eq!(decode_ok(json!(false)).0, SchemaNode::Never);
        let (node, _) = decode_ok(json!({"type": "array", "items": false}));
        assert_eq!(
            node,
            SchemaNode::Array {
                items: Box::new(SchemaNode::Never)
            }
        );
    }

    #[test]
    fn untyped_enum_keeps_its_values() {
        let (node, _) = decode_ok(json!({"enum": ["ASC", "DESC", 1]}));
        assert_eq!(
            node,
            SchemaNode::Enum(vec![json!("ASC"), json!("DESC"), json!(1)])
        );
        let (node, _) = decode_ok(json!({"enum": ["ASC"], "nullable": true}));
        assert_eq!(node.describe(), "enum of 1 or null");
    }

    #[test]
    fn swagger2_definitions_reference() {
        let (node, refs) = decode_ok(json!({"$ref": "#/definitions/Firm"}));
        assert_eq!(node, SchemaNode::Reference("Firm".into()));
        assert_eq!(refs[0].reference, "#/definitions/Firm");
    }

    #[test]
    fn malformed_schemas_are_rejected() {
        for bad in [
            json!("string"),
            json!({"type": "decimal"}),
            json!({"type": 7}),
            json!({"type": "object", "required": "id"}),
            json!({"type": "string", "enum": "a"}),
            json!({"anyOf": []}),
        ] {
            let mut refs = Vec::new();
            let err = decode(&bad, "loc", &mut refs).unwrap_err();
            assert!(
                matches!(err, SchemaLoadError::InvalidSchema { .. }),
                "expected InvalidSchema for {bad}, got {err}"
            );
        }
    }

    #[test]
    fn integer_accepts_integral_floats() {
        assert!(PrimitiveKind::Integer.matches(&json!(3)));
        assert!(PrimitiveKind::Integer.matches(&json!(3.0)));
        assert!(!PrimitiveKind::Integer.matches(&json!(3.5)));
        assert!(PrimitiveKind::Number.matches(&json!(3.5)));
        assert!(!PrimitiveKind::Number.matches(&json!("3")));
    }

    #[test]
    fn component_name_unescapes_pointer() {
        assert_eq!(
            component_name("#/components/schemas/a~0b~1c", SCHEMA_REF_PREFIXES[0]).as_deref(),
            Some("a~b/c")
        );
        assert_eq!(component_name("#/components/schemas/", SCHEMA_REF_PREFIXES[0]), None);
        assert_eq!(
            component_name("#/components/schemas/A/properties/x", SCHEMA_REF_PREFIXES[0]),
            None
        );
        assert_eq!(
            component_name("#/definitions/Firm", SCHEMA_REF_PREFIXES[1]).as_deref(),
            Some("Firm")
        );
    }
}
