//! Exit status policy.

use clap::ValueEnum;

use apiprobe_schema::ValidationReport;

/// Which outcomes make the run exit non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    /// Exit 0 whenever the run completes.
    #[default]
    None,
    /// Exit 1 when the label selected by the actual status does not conform,
    /// or no declared label covers that status.
    Matching,
    /// Exit 1 when any label does not conform.
    All,
}

impl FailOn {
    pub fn exit_code(self, report: &ValidationReport) -> u8 {
        let failed = match self {
            Self::None => false,
            Self::Matching => !report
                .matching_entry()
                .is_some_and(|e| e.result.is_conformant()),
            Self::All => !report.is_fully_conformant(),
        };
        u8::from(failed)
    }

    /// Exit code when no response was captured.
    pub fn unverified_exit_code(self) -> u8 {
        u8::from(self != Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiprobe_schema::{run, ActualResponse, HttpMethod, OperationKey, SchemaDocument, SchemaIndex};
    use serde_json::json;

    fn index() -> SchemaIndex {
        let doc = SchemaDocument::from_value(json!({
            "paths": {"/r": {"get": {"responses": {
                "200": {"content": {"application/json": {"schema": {
                    "type": "object", "required": ["id"]
                }}}},
                "4XX": {"content": {"application/json": {"schema": {
                    "type": "object", "required": ["error"]
                }}}}
            }}}}
        }));
        SchemaIndex::load(&doc, &OperationKey::new("/r", HttpMethod::Get)).unwrap()
    }

    fn codes(status: u16, body: serde_json::Value) -> [u8; 3] {
        let report = run(&index(), &ActualResponse::new(status, body));
        [FailOn::None, FailOn::Matching, FailOn::All].map(|p| p.exit_code(&report))
    }

    #[test]
    fn matching_label_conforms() {
        assert_eq!(codes(200, json!({"id": 1})), [0, 0, 1]);
        assert_eq!(codes(404, json!({"error": "x"})), [0, 0, 1]);
    }

    #[test]
    fn matching_label_violated() {
        assert_eq!(codes(200, json!({"error": "x"})), [0, 1, 1]);
    }

    #[test]
    fn no_label_covers_status() {
        assert_eq!(codes(500, json!({"id": 1})), [0, 1, 1]);
    }

    #[test]
    fn every_label_conforms() {
        assert_eq!(codes(200, json!({"id": 1, "error": "x"})), [0, 0, 0]);
    }

    #[test]
    fn unverified_runs() {
        assert_eq!(FailOn::None.unverified_exit_code(), 0);
        assert_eq!(FailOn::Matching.unverified_exit_code(), 1);
        assert_eq!(FailOn::All.unverified_exit_code(), 1);
    }
}
