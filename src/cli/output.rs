//! Output formatting for credential-precheck.
//!
//! Provides terminal and JSON formatters for reports, rejections, and the
//! status table. Formatters only build strings; the caller decides between
//! stdout and stderr.

use serde_json::{json, Value};

use crate::checks::{CredentialCheck, StatusCode};
use crate::cli::args::OutputFormat;
use crate::engine::result::PrecheckReport;
use crate::PrecheckError;

const RULE: &str = "--------------------------------------------------------------------------------";

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a report of completed checks
    fn format(&self, report: &PrecheckReport) -> String;

    /// Format the error that ended a precheck
    fn format_rejection(&self, error: &PrecheckError) -> String;

    /// Format the table of every status code
    fn format_statuses(&self) -> String;
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool) -> Self {
        TerminalFormatter { color }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    fn yellow(&self, text: &str) -> String {
        self.colorize(text, "33")
    }

    fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    fn tag(&self, check: &CredentialCheck) -> String {
        if check.valid() {
            self.green("[PASS]")
        } else if check.status().is_transient() {
            self.yellow("[UNREACHABLE]")
        } else {
            self.red("[FAIL]")
        }
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &PrecheckReport) -> String {
        let mut output = String::new();

        output.push_str(RULE);
        output.push('\n');
        output.push_str("credential precheck\n");
        if let Some(ref round) = report.round {
            output.push_str(&format!("Round: {}\n", round));
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        for check in &report.checks {
            output.push_str(&format!(
                "  {} {}: {}\n",
                self.tag(check),
                check.credential(),
                check.status().label()
            ));
            if !check.valid() {
                output.push_str(&format!("         {}\n", check.status().remediation()));
            }
        }

        let summary = report.summary();
        output.push('\n');
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} valid, {} invalid\n",
            summary.valid, summary.invalid
        ));
        output.push_str(&format!(
            "Total time: {:.1}s\n",
            report.total_duration_ms as f64 / 1000.0
        ));
        output.push_str(RULE);

        output
    }

    fn format_rejection(&self, error: &PrecheckError) -> String {
        match error {
            PrecheckError::CredentialRejected { round, status } => {
                let check = CredentialCheck::new(*status);
                format!(
                    "{} {} (round {})\n{}\nAction: {}",
                    self.tag(&check),
                    status.label(),
                    round,
                    status.remediation(),
                    status.action()
                )
            }
            PrecheckError::Config(e) => format!("{} {}", self.red("[ERROR]"), e),
        }
    }

    fn format_statuses(&self) -> String {
        let mut output = String::new();
        output.push_str("Status codes:\n");

        let mut current = None;
        for status in StatusCode::ALL {
            if current != Some(status.credential()) {
                current = Some(status.credential());
                output.push_str(&format!("\n{} CHECKS:\n", status.credential().to_string().to_uppercase()));
            }
            output.push_str(&format!(
                "  {:<28} {:<38} [{}]\n",
                status.code(),
                status.label(),
                status.action()
            ));
        }

        output
    }
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }

    fn render(&self, value: &Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        // Serializing a Value cannot fail; keep the formatter infallible
        rendered.unwrap_or_else(|_| "{}".to_string())
    }
}

fn check_json(check: &CredentialCheck) -> Value {
    json!({
        "credential": check.credential(),
        "valid": check.valid(),
        "status": check.status(),
        "label": check.status().label(),
    })
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &PrecheckReport) -> String {
        let summary = report.summary();
        let value = json!({
            "round": report.round,
            "timestamp": report.timestamp,
            "valid": report.all_valid(),
            "checks": report.checks.iter().map(check_json).collect::<Vec<_>>(),
            "summary": summary,
            "total_duration_ms": report.total_duration_ms,
        });
        self.render(&value)
    }

    fn format_rejection(&self, error: &PrecheckError) -> String {
        let value = match error {
            PrecheckError::CredentialRejected { round, status } => json!({
                "round": round,
                "valid": false,
                "credential": status.credential(),
                "status": status,
                "label": status.label(),
                "remediation": status.remediation(),
                "action": status.action().as_str(),
                "transient": status.is_transient(),
            }),
            PrecheckError::Config(e) => json!({ "error": e.to_string() }),
        };
        self.render(&value)
    }

    fn format_statuses(&self) -> String {
        let statuses: Vec<Value> = StatusCode::ALL
            .iter()
            .map(|status| {
                json!({
                    "code": status,
                    "credential": status.credential(),
                    "success": status.is_success(),
                    "label": status.label(),
                    "remediation": status.remediation(),
                    "action": status.action().as_str(),
                })
            })
            .collect();
        self.render(&Value::Array(statuses))
    }
}

/// Get the formatter for the requested output format
pub fn get_formatter(format: OutputFormat, no_color: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TerminalFormatter::new(!no_color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
