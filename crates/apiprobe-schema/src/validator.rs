//! # Response Validation
//!
//! Checks a captured response body against the schema declared for one
//! response label.
//!
//! ## Semantics
//!
//! - Every violation is collected; validation never stops at the first.
//! - Objects are open: undeclared fields are ignored unless the schema sets
//!   `additionalProperties: false` or gives a schema for them.
//! - Declared fields are checked whenever present; `required` only adds the
//!   presence check.
//! - A `$ref` that is already being expanded at the same body location is
//!   treated as satisfied. Descending into a field or array element starts
//!   afresh, so recursive component schemas are still enforced at every
//!   depth of a (necessarily finite) body.
//!
//! The label is never compared with the actual status code here. Callers
//! that care about the matching label use
//! [`crate::ValidationReport::matching_label`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UnknownLabelError;
use crate::index::SchemaIndex;
use crate::node::{AdditionalProperties, CompositeMode, SchemaNode};

/// A response captured from the service under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body.
    pub body: Value,
}

impl ActualResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// What went wrong at a [`Violation`]'s location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field is absent.
    MissingField,
    /// The value has the wrong JSON type.
    TypeMismatch { expected: String, actual: String },
    /// The value is not one of the schema's `enum` values.
    NotInEnum { allowed: Vec<Value>, actual: Value },
    /// A field not permitted by `additionalProperties: false`.
    UnexpectedField,
    /// A value where the schema is `false`.
    NoValueAllowed { actual: String },
    /// No `anyOf`/`oneOf` branch accepted the value.
    NoMatchingBranch { mode: CompositeMode, branches: usize },
    /// More than one `oneOf` branch accepted the value.
    AmbiguousMatch { matched: usize },
}

/// One mismatch between the body and the expected shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Dot-delimited field path with `[i]` array indices; empty for the root.
    pub path: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl Violation {
    /// The expected shape at this location.
    pub fn expected(&self) -> String {
        match &self.kind {
            ViolationKind::MissingField => "present".to_string(),
            ViolationKind::TypeMismatch { expected, .. } => expected.clone(),
            ViolationKind::NotInEnum { allowed, .. } => format!("one of {}", render_values(allowed)),
            ViolationKind::UnexpectedField => "absent".to_string(),
            ViolationKind::NoValueAllowed { .. } => "nothing".to_string(),
            ViolationKind::NoMatchingBranch { mode, branches } => {
                format!("{mode} of {branches} schemas")
            }
            ViolationKind::AmbiguousMatch { .. } => "exactly one oneOf branch".to_string(),
        }
    }

    /// The actual value, or its type.
    pub fn actual(&self) -> String {
        match &self.kind {
            ViolationKind::MissingField => "absent".to_string(),
            ViolationKind::TypeMismatch { actual, .. } => actual.clone(),
            ViolationKind::NotInEnum { actual, .. } => actual.to_string(),
            ViolationKind::UnexpectedField => "present".to_string(),
            ViolationKind::NoValueAllowed { actual } => actual.clone(),
            ViolationKind::NoMatchingBranch { .. } => "no branch matched".to_string(),
            ViolationKind::AmbiguousMatch { matched } => format!("{matched} branches matched"),
        }
    }

    fn location(&self) -> &str {
        if self.path.is_empty() {
            "(root)"
        } else {
            &self.path
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.location();
        match &self.kind {
            ViolationKind::MissingField => write!(f, "missing field {at}"),
            ViolationKind::UnexpectedField => write!(f, "unexpected field {at}"),
            ViolationKind::NoValueAllowed { actual } => {
                write!(f, "{at}: no value is allowed, found {actual}")
            }
            ViolationKind::TypeMismatch { expected, actual } => {
                write!(f, "{at}: expected {expected}, found {actual}")
            }
            ViolationKind::NotInEnum { allowed, actual } => {
                write!(f, "{at}: {actual} is not one of {}", render_values(allowed))
            }
            ViolationKind::NoMatchingBranch { mode, branches } => {
                write!(f, "{at}: value matches none of the {branches} {mode} branches")
            }
            ViolationKind::AmbiguousMatch { matched } => {
                write!(f, "{at}: value matches {matched} oneOf branches, expected exactly one")
            }
        }
    }
}

/// Outcome of checking a body against one response label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "violations", rename_all = "snake_case")]
pub enum ValidationResult {
    Conformant,
    /// Always carries at least one violation.
    NonConformant(Vec<Violation>),
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Self::Conformant
        } else {
            Self::NonConformant(violations)
        }
    }

    pub fn is_conformant(&self) -> bool {
        matches!(self, Self::Conformant)
    }

    /// The violations found; empty when conformant.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Conformant => &[],
            Self::NonConformant(v) => v,
        }
    }
}

/// Check `actual.body` against the schema declared for `label`.
///
/// # Errors
///
/// Returns [`UnknownLabelError`] if the index does not declare `label`.
pub fn validate(
    index: &SchemaIndex,
    label: &str,
    actual: &ActualResponse,
) -> Result<ValidationResult, UnknownLabelError> {
    let node = index.declared(label)?;
    Ok(check_body(index, node, &actual.body))
}

pub(crate) fn check_body<'a>(
    index: &'a SchemaIndex,
    node: &'a SchemaNode,
    body: &Value,
) -> ValidationResult {
    let mut walker = Walker {
        index,
        violations: Vec::new(),
    };
    walker.check(node, body, "", &mut Vec::new());
    ValidationResult::from_violations(walker.violations)
}

struct Walker<'a> {
    index: &'a SchemaIndex,
    violations: Vec<Violation>,
}

impl<'a> Walker<'a> {
    /// `open` holds the references being expanded at this body location.
    fn check(
        &mut self,
        node: &'a SchemaNode,
        value: &Value,
        path: &str,
        open: &mut Vec<&'a str>,
    ) {
        match node {
            SchemaNode::Any => {}
            SchemaNode::Never => {
                self.push(
                    path,
                    ViolationKind::NoValueAllowed {
                        actual: json_type(value).to_string(),
                    },
                );
            }
            SchemaNode::Enum(allowed) => {
                if !allowed.contains(value) {
                    self.push(
                        path,
                        ViolationKind::NotInEnum {
                            allowed: allowed.clone(),
                            actual: value.clone(),
                        },
                    );
                }
            }
            SchemaNode::Primitive { kind, allowed } => {
                if !kind.matches(value) {
                    self.type_mismatch(path, kind.name(), value);
                } else if !allowed.is_empty() && !allowed.contains(value) {
                    self.push(
                        path,
                        ViolationKind::NotInEnum {
                            allowed: allowed.clone(),
                            actual: value.clone(),
                        },
                    );
                }
            }
            SchemaNode::Nullable(inner) => {
                if !value.is_null() {
                    self.check(inner, value, path, open);
                }
            }
            SchemaNode::Object {
                properties,
                required,
                additional,
            } => {
                let Some(fields) = value.as_object() else {
                    self.type_mismatch(path, "object", value);
                    return;
                };
                for name in required {
                    if !fields.contains_key(name) {
                        self.push(&child(path, name), ViolationKind::MissingField);
                    }
                }
                for (name, schema) in properties {
                    if let Some(field) = fields.get(name) {
                        self.check(schema, field, &child(path, name), &mut Vec::new());
                    }
                }
                let declared = |name: &str| properties.iter().any(|(p, _)| p == name);
                match additional {
                    AdditionalProperties::Allowed => {}
                    AdditionalProperties::Forbidden => {
                        for name in fields.keys().filter(|n| !declared(n.as_str())) {
                            self.push(&child(path, name), ViolationKind::UnexpectedField);
                        }
                    }
                    AdditionalProperties::Schema(schema) => {
                        for (name, field) in fields.iter().filter(|(n, _)| !declared(n.as_str())) {
                            self.check(schema, field, &child(path, name), &mut Vec::new());
                        }
                    }
                }
            }
            SchemaNode::Array { items } => {
                let Some(elements) = value.as_array() else {
                    self.type_mismatch(path, "array", value);
                    return;
                };
                for (i, element) in elements.iter().enumerate() {
                    self.check(items, element, &format!("{path}[{i}]"), &mut Vec::new());
                }
            }
            SchemaNode::Reference(name) => {
                if open.contains(&name.as_str()) {
                    return;
                }
                // Every reachable reference was resolved when the index loaded.
                let Some(target) = self.index.component(name) else {
                    return;
                };
                open.push(name);
                self.check(target, value, path, open);
                open.pop();
            }
            SchemaNode::Composite { mode, branches } => {
                self.check_composite(*mode, branches, value, path, open);
            }
        }
    }

    fn check_composite(
        &mut self,
        mode: CompositeMode,
        branches: &'a [SchemaNode],
        value: &Value,
        path: &str,
        open: &mut Vec<&'a str>,
    ) {
        if mode == CompositeMode::AllOf {
            for branch in branches {
                self.check(branch, value, path, open);
            }
            return;
        }

        let outcomes: Vec<Vec<Violation>> = branches
            .iter()
            .map(|branch| self.trial(branch, value, path, open))
            .collect();
        let matched = outcomes.iter().filter(|o| o.is_empty()).count();

        if matched == 0 {
            self.push(
                path,
                ViolationKind::NoMatchingBranch {
                    mode,
                    branches: branches.len(),
                },
            );
            if let Some(closest) = outcomes.into_iter().min_by_key(Vec::len) {
                self.violations.extend(closest);
            }
        } else if mode == CompositeMode::OneOf && matched > 1 {
            self.push(path, ViolationKind::AmbiguousMatch { matched });
        }
    }

    /// Check a branch without committing its violations.
    fn trial(
        &mut self,
        node: &'a SchemaNode,
        value: &Value,
        path: &str,
        open: &mut Vec<&'a str>,
    ) -> Vec<Violation> {
        let saved = std::mem::take(&mut self.violations);
        self.check(node, value, path, open);
        std::mem::replace(&mut self.violations, saved)
    }

    fn type_mismatch(&mut self, path: &str, expected: &str, value: &Value) {
        self.push(
            path,
            ViolationKind::TypeMismatch {
                expected: expected.to_string(),
                actual: json_type(value).to_string(),
            },
        );
    }

    fn push(&mut self, path: &str, kind: ViolationKind) {
        self.violations.push(Violation {
            path: path.to_string(),
            kind,
        });
    }
}

fn child(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render_values(values: &[Value]) -> String {
    let rendered: Vec<String> = values.iter().map(Value::to_string).collect();
    format!("[{}]", rendered.join(", "))
}
