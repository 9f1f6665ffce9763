//! Rendering validation reports.
//!
//! A [`Reporter`] receives one call per declared label, in label order,
//! then a final call with the whole report.

use std::io::{self, Write};

use clap::{Args, ValueEnum};

use apiprobe_schema::{ValidationReport, ValidationResult};

use crate::policy::FailOn;

/// Report rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable block per label.
    #[default]
    Text,
    /// The whole report as pretty-printed JSON.
    Json,
}

/// Output and exit-status flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long, value_enum, default_value_t = FailOn::None)]
    pub fail_on: FailOn,
}

pub trait Reporter {
    /// Outcome for one label.
    fn report(&mut self, label: &str, result: &ValidationResult) -> io::Result<()>;

    /// Called once after every label has been reported.
    fn finish(&mut self, report: &ValidationReport) -> io::Result<()>;
}

/// Plain-text reporter.
pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, label: &str, result: &ValidationResult) -> io::Result<()> {
        writeln!(self.out, "Validating response for: {label}")?;
        match result {
            ValidationResult::Conformant => writeln!(self.out, "API response is valid!"),
            ValidationResult::NonConformant(violations) => {
                writeln!(
                    self.out,
                    "API response does not conform to '{label}' ({} violation(s))",
                    violations.len()
                )?;
                for violation in violations {
                    writeln!(self.out, "  - {violation}")?;
                }
                Ok(())
            }
        }
    }

    fn finish(&mut self, report: &ValidationReport) -> io::Result<()> {
        match report.matching_label() {
            Some(label) => writeln!(
                self.out,
                "Response status {} selects label '{label}'",
                report.status()
            )?,
            None => writeln!(
                self.out,
                "Response status {} matches no declared label",
                report.status()
            )?,
        }
        self.out.flush()
    }
}

/// JSON reporter; writes nothing until [`Reporter::finish`].
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, _label: &str, _result: &ValidationResult) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, report: &ValidationReport) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, report)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Feed `report` through `reporter`.
pub fn emit(report: &ValidationReport, reporter: &mut dyn Reporter) -> io::Result<()> {
    for entry in report.entries() {
        reporter.report(&entry.label, &entry.result)?;
    }
    reporter.finish(report)
}

/// Render `report` to `out` in `format`.
pub fn render<W: Write>(report: &ValidationReport, format: OutputFormat, out: W) -> io::Result<()> {
    match format {
        OutputFormat::Text => emit(report, &mut TextReporter::new(out)),
        OutputFormat::Json => emit(report, &mut JsonReporter::new(out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiprobe_schema::{run, ActualResponse, HttpMethod, OperationKey, SchemaDocument, SchemaIndex};
    use serde_json::json;

    fn report(status: u16, body: serde_json::Value) -> ValidationReport {
        let doc = SchemaDocument::from_value(json!({
            "paths": {"/r": {"post": {"responses": {
                "200": {"content": {"application/json": {"schema": {
                    "type": "object", "required": ["id"],
                    "properties": {"id": {"type": "string"}}
                }}}},
                "404": {"content": {"application/json": {"schema": {
                    "type": "object", "required": ["error"]
                }}}}
            }}}}
        }));
        let index = SchemaIndex::load(&doc, &OperationKey::new("/r", HttpMethod::Post)).unwrap();
        run(&index, &ActualResponse::new(status, body))
    }

    fn text(report: &ValidationReport) -> String {
        let mut reporter = TextReporter::new(Vec::new());
        emit(report, &mut reporter).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn text_lists_each_label() {
        let out = text(&report(200, json!({"id": "abc"})));
        assert_eq!(
            out,
            "Validating response for: 200\n\
             API response is valid!\n\
             Validating response for: 404\n\
             API response does not conform to '404' (1 violation(s))\n\
             \x20 - missing field error\n\
             Response status 200 selects label '200'\n"
        );
    }

    #[test]
    fn text_reports_every_violation() {
        let out = text(&report(500, json!({"id": 7})));
        assert!(out.contains("API response does not conform to '200' (1 violation(s))"));
        assert!(out.contains("  - id: expected string, found integer"));
        assert!(out.ends_with("Response status 500 matches no declared label\n"));
    }

    #[test]
    fn json_writes_whole_report() {
        let report = report(404, json!({"error": "gone"}));
        let mut reporter = JsonReporter::new(Vec::new());
        emit(&report, &mut reporter).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&reporter.into_inner()).unwrap();
        assert_eq!(value["status"], 404);
        assert_eq!(value["entries"][0]["result"]["outcome"], "non_conformant");
        assert_eq!(value["entries"][1]["result"]["outcome"], "conformant");
    }

    #[test]
    fn render_picks_reporter() {
        let report = report(200, json!({"id": "abc"}));
        let mut out = Vec::new();
        render(&report, OutputFormat::Json, &mut out).unwrap();
        assert!(out.starts_with(b"{"));
        let mut out = Vec::new();
        render(&report, OutputFormat::Text, &mut out).unwrap();
        assert!(out.starts_with(b"Validating response for: 200"));
    }
}
