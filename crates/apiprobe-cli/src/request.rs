//! Request payloads for the probed operation.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Investment-firm filter operation probed by default.
pub const DEFAULT_ENDPOINT: &str = "/database/investment-firm/filter";

/// Filter payload sent when no `--body` is given: every firm type and
/// sub-type, all stages from pre-seed to series C+, sorted by three-month
/// deal count, second page.
pub fn default_filters() -> Value {
    json!({
        "sort": {"direction": "DESC", "property": "threeMoDealCount"},
        "filter": {
            "general": {
                "firm": {
                    "type": [
                        {
                            "key": "accelerator-incubator",
                            "subTypes": [
                                "large-batches",
                                "regional-focus",
                                "international",
                                "sector-specialists",
                                "studios",
                                "other"
                            ]
                        },
                        {
                            "key": "angel",
                            "subTypes": [
                                "hyperactive",
                                "occasional",
                                "venture-scouts",
                                "angel-syndicates",
                                "active"
                            ]
                        },
                        {"key": "family-office", "subTypes": ["established", "emerging"]},
                        {
                            "key": "corporate-vc",
                            "subTypes": ["innovation-funds", "financial-funds", "other"]
                        },
                        {
                            "key": "vc-firm",
                            "subTypes": [
                                "sector-specialists",
                                "pre-seed-specialists",
                                "seed-specialists",
                                "series-a-specialists",
                                "micro-vcs",
                                "other"
                            ]
                        }
                    ]
                }
            },
            "stage": {
                "percentageInvestmentsByStage": {
                    "selectedStages": [
                        "Pre-Seed",
                        "Seed",
                        "Series A",
                        "Series B",
                        "Series C",
                        "Series C+"
                    ],
                    "portfolioInvestmentsPercentage": 1
                }
            }
        },
        "page": 2
    })
}

/// Read a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))
}

/// The request body from `path`, or [`default_filters`].
pub fn load_body(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => read_json(path),
        None => Ok(default_filters()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_shape() {
        let body = default_filters();
        assert_eq!(body["page"], 2);
        assert_eq!(body["sort"]["property"], "threeMoDealCount");
        let types = body["filter"]["general"]["firm"]["type"].as_array().unwrap();
        assert_eq!(types.len(), 5);
        assert_eq!(types[2]["key"], "family-office");
        assert_eq!(
            body["filter"]["stage"]["percentageInvestmentsByStage"]["selectedStages"]
                .as_array()
                .unwrap()
                .len(),
            6
        );
    }

    #[test]
    fn load_body_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, r#"{"page": 1}"#).unwrap();
        assert_eq!(load_body(Some(&path)).unwrap(), json!({"page": 1}));
        assert_eq!(load_body(None).unwrap(), default_filters());
    }

    #[test]
    fn read_json_rejects_invalid_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, "{page: 1").unwrap();
        let err = read_json(&path).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
