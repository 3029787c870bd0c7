use crate::error::LintError;
use clap::ValueEnum;
use openrpc_validator::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Outcome of linting one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the file is not JSON at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn valid(file: PathBuf) -> Self {
        Self {
            file,
            valid: true,
            diagnostics: Vec::new(),
            error: None,
        }
    }

    pub fn invalid(file: PathBuf, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            file,
            valid: false,
            diagnostics,
            error: None,
        }
    }

    pub fn unparsable(file: PathBuf, error: impl Into<String>) -> Self {
        Self {
            file,
            valid: false,
            diagnostics: Vec::new(),
            error: Some(error.into()),
        }
    }
}

pub fn render(reports: &[FileReport], format: OutputFormat) -> Result<String, LintError> {
    match format {
        OutputFormat::Text => Ok(render_text(reports)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
    }
}

fn render_text(reports: &[FileReport]) -> String {
    let mut out = String::new();
    let mut problems = 0;

    for report in reports {
        if let Some(error) = &report.error {
            problems += 1;
            let _ = writeln!(out, "{}: not valid JSON: {}", report.file.display(), error);
            continue;
        }
        if report.valid {
            continue;
        }
        let _ = writeln!(out, "{}:", report.file.display());
        for diagnostic in &report.diagnostics {
            problems += 1;
            let _ = writeln!(
                out,
                "  {}  {}({})  {}",
                diagnostic.path, diagnostic.kind, diagnostic.rule, diagnostic.message
            );
        }
    }

    let invalid = reports.iter().filter(|report| !report.valid).count();
    let _ = writeln!(
        out,
        "{} file(s) checked, {} invalid, {} problem(s)",
        reports.len(),
        invalid,
        problems
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use openrpc_validator::{DiagnosticKind, JsonPath};
    use serde_json::json;

    fn reports() -> Vec<FileReport> {
        vec![
            FileReport::valid("ok.json".into()),
            FileReport::invalid(
                "bad.json".into(),
                vec![Diagnostic::new(
                    DiagnosticKind::DuplicateIdentifier,
                    JsonPath::root().join("methods").join(1).join("name"),
                    "uniqueMethodNames",
                    "method name `subtract` is already used by methods[0]",
                )],
            ),
        ]
    }

    #[test]
    fn test_text_report() {
        let text = render(&reports(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "bad.json:\n  $.methods[1].name  DuplicateIdentifier(uniqueMethodNames)  \
             method name `subtract` is already used by methods[0]\n\
             2 file(s) checked, 1 invalid, 1 problem(s)\n"
        );
    }

    #[test]
    fn test_json_report() {
        let text = render(&reports(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0], json!({"file": "ok.json", "valid": true, "diagnostics": []}));
        assert_eq!(value[1]["valid"], json!(false));
        assert_eq!(
            value[1]["diagnostics"][0]["path"],
            json!(["methods", 1, "name"])
        );
        assert_eq!(value[1]["diagnostics"][0]["kind"], json!("DuplicateIdentifier"));
    }

    #[test]
    fn test_unparsable_file() {
        let report = FileReport::unparsable("x.json".into(), "expected value at line 1 column 1");
        let text = render(&[report], OutputFormat::Text).unwrap();
        assert!(text.starts_with("x.json: not valid JSON: expected value"));
        assert!(text.ends_with("1 file(s) checked, 1 invalid, 1 problem(s)\n"));
    }
}
