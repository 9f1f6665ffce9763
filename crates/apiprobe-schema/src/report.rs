//! # Validation Reports
//!
//! [`run`] checks one captured response against every label of a
//! [`SchemaIndex`] and records the outcome per label, in label order.
//! Each label is checked independently; a non-conforming label never stops
//! the others from being checked.

use serde::Serialize;

use crate::document::OperationKey;
use crate::index::SchemaIndex;
use crate::validator::{check_body, ActualResponse, ValidationResult};

/// How a response label relates to an actual status code.
///
/// Ordered from least to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    /// The `default` label.
    Default,
    /// A status class such as `4XX`.
    Class,
    /// The exact status code.
    Exact,
}

/// Whether `label` covers `status`, and how specifically.
pub fn label_matches(label: &str, status: u16) -> Option<LabelMatch> {
    if label == "default" {
        return Some(LabelMatch::Default);
    }
    let code = status.to_string();
    if label == code {
        return Some(LabelMatch::Exact);
    }
    let l = label.as_bytes();
    let c = code.as_bytes();
    let is_class = l.len() == 3
        && c.len() == 3
        && l[0] == c[0]
        && l[1].eq_ignore_ascii_case(&b'x')
        && l[2].eq_ignore_ascii_case(&b'x');
    is_class.then_some(LabelMatch::Class)
}

/// Outcome for one declared label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub label: String,
    pub result: ValidationResult,
}

/// Per-label outcomes of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    operation: OperationKey,
    status: u16,
    entries: Vec<ReportEntry>,
}

impl ValidationReport {
    pub fn operation(&self) -> &OperationKey {
        &self.operation
    }

    /// Status code of the response that was checked.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// One entry per declared label, in label order.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// The outcome for `label`, if declared.
    pub fn get(&self, label: &str) -> Option<&ValidationResult> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.result)
    }

    /// Labels the body conforms to, in label order.
    pub fn conformant_labels(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.result.is_conformant())
            .map(|e| e.label.as_str())
            .collect()
    }

    pub fn is_fully_conformant(&self) -> bool {
        self.entries.iter().all(|e| e.result.is_conformant())
    }

    /// The entry whose label the actual status selects: exact code first,
    /// then status class, then `default`.
    pub fn matching_entry(&self) -> Option<&ReportEntry> {
        self.entries
            .iter()
            .filter_map(|e| label_matches(&e.label, self.status).map(|m| (m, e)))
            .rev()
            .max_by_key(|(m, _)| *m)
            .map(|(_, e)| e)
    }

    /// Label of [`Self::matching_entry`].
    pub fn matching_label(&self) -> Option<&str> {
        self.matching_entry().map(|e| e.label.as_str())
    }
}

/// Check `actual` against every label of `index`.
pub fn run(index: &SchemaIndex, actual: &ActualResponse) -> ValidationReport {
    let entries = index
        .entries()
        .map(|(label, node)| {
            let result = check_body(index, node, &actual.body);
            tracing::debug!(
                label,
                conformant = result.is_conformant(),
                violations = result.violations().len(),
                "validated response label"
            );
            ReportEntry {
                label: label.to_string(),
                result,
            }
        })
        .collect();

    ValidationReport {
        operation: index.operation().clone(),
        status: actual.status,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{HttpMethod, SchemaDocument};
    use serde_json::{json, Value};

    fn index(responses: Value) -> SchemaIndex {
        let doc = SchemaDocument::from_value(json!({
            "paths": {"/r": {"post": {"responses": responses}}}
        }));
        SchemaIndex::load(&doc, &OperationKey::new("/r", HttpMethod::Post)).unwrap()
    }

    fn body(schema: Value) -> Value {
        json!({"content": {"application/json": {"schema": schema}}})
    }

    #[test]
    fn label_matching() {
        assert_eq!(label_matches("200", 200), Some(LabelMatch::Exact));
        assert_eq!(label_matches("2XX", 201), Some(LabelMatch::Class));
        assert_eq!(label_matches("4xx", 404), Some(LabelMatch::Class));
        assert_eq!(label_matches("default", 503), Some(LabelMatch::Default));
        assert_eq!(label_matches("201", 200), None);
        assert_eq!(label_matches("5XX", 404), None);
        assert!(LabelMatch::Exact > LabelMatch::Class);
        assert!(LabelMatch::Class > LabelMatch::Default);
    }

    #[test]
    fn matching_label_prefers_most_specific() {
        let idx = index(json!({
            "default": body(json!({})),
            "4XX": body(json!({})),
            "404": body(json!({})),
            "200": body(json!({}))
        }));
        let at = |status| run(&idx, &ActualResponse::new(status, json!({}))).matching_label().map(str::to_string);
        assert_eq!(at(404).as_deref(), Some("404"));
        assert_eq!(at(409).as_deref(), Some("4XX"));
        assert_eq!(at(500).as_deref(), Some("default"));
        assert_eq!(at(200).as_deref(), Some("200"));
    }

    #[test]
    fn matching_label_absent_without_default() {
        let idx = index(json!({"200": body(json!({}))}));
        let report = run(&idx, &ActualResponse::new(500, json!(null)));
        assert_eq!(report.matching_label(), None);
    }

    #[test]
    fn report_accessors() {
        let idx = index(json!({
            "200": body(json!({"type": "object", "required": ["id"]})),
            "400": body(json!({"type": "object", "required": ["message"]}))
        }));
        let report = run(&idx, &ActualResponse::new(200, json!({"id": 1})));
        assert_eq!(report.status(), 200);
        assert_eq!(report.operation().to_string(), "POST /r");
        assert_eq!(report.entries().len(), 2);
        assert_eq!(report.conformant_labels(), ["200"]);
        assert!(!report.is_fully_conformant());
        assert!(report.get("200").unwrap().is_conformant());
        assert!(report.get("302").is_none());
    }

    #[test]
    fn report_serializes_outcomes() {
        let idx = index(json!({
            "200": body(json!({"type": "object", "required": ["id"]}))
        }));
        let report = run(&idx, &ActualResponse::new(200, json!({})));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["operation"], json!({"path": "/r", "method": "POST"}));
        assert_eq!(value["entries"][0]["label"], "200");
        assert_eq!(value["entries"][0]["result"]["outcome"], "non_conformant");
        assert_eq!(
            value["entries"][0]["result"]["violations"][0],
            json!({"path": "id", "kind": "missing_field"})
        );
    }
}
