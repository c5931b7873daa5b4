//! Output formatting for CLI commands.
//!
//! This module renders the deploy status stream and the final summary
//! in either human-readable text or JSON lines.

use colored::Colorize;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::deploy::DeployOutcome;
use crate::status::StatusEvent;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
    /// Whether verbose diagnostics are rendered.
    verbose: bool,
}

/// Deploy summary row for table display.
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Renders one status event, or `None` when the event produces no
    /// output in the selected format.
    #[must_use]
    pub fn format_event(&self, event: &StatusEvent) -> Option<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string(event).ok(),
            OutputFormat::Text => self.format_event_text(event),
        }
    }

    /// Renders one status event as a text line.
    fn format_event_text(&self, event: &StatusEvent) -> Option<String> {
        match event {
            StatusEvent::AppCreate { name } => {
                Some(format!("{} Creating application {name}", "→".blue()))
            }
            StatusEvent::AppEnd { application_id } => {
                Some(format!("{} Application {application_id} created", "✓".green()))
            }
            StatusEvent::BuildStart => Some(format!("{} Creating build", "→".blue())),
            StatusEvent::BuildEnd { build_id } => {
                Some(format!("{} Build {build_id} created", "✓".green()))
            }
            StatusEvent::HashingStart => Some(format!("{} Hashing files", "→".blue())),
            StatusEvent::FileCount { count } => {
                Some(format!("{} Synchronizing {count} files", "→".blue()))
            }
            StatusEvent::Retry { message } => {
                Some(format!("{} Retrying: {message}", "⚠".yellow()))
            }
            StatusEvent::UploadFailure { message } => {
                Some(format!("{} Upload failed: {message}", "✗".red()))
            }
            StatusEvent::FinalizeStart => Some(format!("{} Finalizing build", "→".blue())),
            StatusEvent::ReleaseStart { environment } => {
                Some(format!("{} Releasing to {environment}", "→".blue()))
            }
            StatusEvent::End { url, .. } => {
                Some(format!("{} Application deployed to {url}", "✓".green()))
            }
            StatusEvent::Error { message } => Some(format!("{} {message}", "✗".red())),
            StatusEvent::Verbose { message } => {
                self.verbose.then(|| format!("  {}", message.dimmed()))
            }
            // Per-file progress stays quiet in text mode.
            StatusEvent::HashingEnd
            | StatusEvent::FileFound { .. }
            | StatusEvent::FileCacheStart
            | StatusEvent::FileCacheSuccess
            | StatusEvent::UploadStart { .. }
            | StatusEvent::UploadProgress { .. }
            | StatusEvent::UploadSuccess
            | StatusEvent::UploadEnd
            | StatusEvent::FinalizeEnd
            | StatusEvent::ReleaseEnd => None,
        }
    }

    /// Renders the deploy summary.
    #[must_use]
    pub fn format_outcome(&self, outcome: &DeployOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => {
                let rows = vec![
                    SummaryRow {
                        field: "URL",
                        value: outcome.url.clone(),
                    },
                    SummaryRow {
                        field: "Environment",
                        value: outcome.environment.clone(),
                    },
                    SummaryRow {
                        field: "Build",
                        value: outcome.build_id.clone(),
                    },
                    SummaryRow {
                        field: "Files",
                        value: outcome.files.to_string(),
                    },
                    SummaryRow {
                        field: "Deployed at",
                        value: outcome.deployed_at.to_rfc3339(),
                    },
                ];
                format!("\n{}\n", Table::new(rows))
            }
        }
    }

    /// Renders a configuration validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "valid": result.is_valid(),
                "warnings": result.warnings,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!("{} Configuration is valid", "✓".green());
                if show_warnings && !result.warnings.is_empty() {
                    output.push_str("\n\nWarnings:");
                    for warning in &result.warnings {
                        output.push_str(&format!("\n  - {warning}"));
                    }
                }
                output
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn outcome() -> DeployOutcome {
        DeployOutcome {
            url: String::from("http://staging.demo.airlift.sh"),
            environment: String::from("staging"),
            build_id: String::from("b-1"),
            files: 3,
            deployed_at: Utc::now(),
        }
    }

    #[test]
    fn test_text_renders_terminal_events() {
        let formatter = OutputFormatter::new(OutputFormat::Text, false);

        let end = formatter
            .format_event(&StatusEvent::End {
                url: String::from("http://demo.airlift.sh"),
                environment: String::from("production"),
            })
            .unwrap();
        assert!(end.contains("http://demo.airlift.sh"));

        let error = formatter
            .format_event(&StatusEvent::Error {
                message: String::from("boom"),
            })
            .unwrap();
        assert!(error.contains("boom"));
    }

    #[test]
    fn test_text_suppresses_per_file_progress() {
        let formatter = OutputFormatter::new(OutputFormat::Text, false);
        assert!(formatter
            .format_event(&StatusEvent::UploadProgress { count: 1 })
            .is_none());
    }

    #[test]
    fn test_verbose_events_respect_verbose_flag() {
        let quiet = OutputFormatter::new(OutputFormat::Text, false);
        let loud = OutputFormatter::new(OutputFormat::Text, true);
        let event = StatusEvent::Verbose {
            message: String::from("200 index.html"),
        };

        assert!(quiet.format_event(&event).is_none());
        assert!(loud.format_event(&event).is_some());
    }

    #[test]
    fn test_json_renders_every_event() {
        let formatter = OutputFormatter::new(OutputFormat::Json, false);
        let line = formatter
            .format_event(&StatusEvent::UploadProgress { count: 1 })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "upload_progress");
    }

    #[test]
    fn test_outcome_summary_contains_url() {
        let formatter = OutputFormatter::new(OutputFormat::Text, false);
        let summary = formatter.format_outcome(&outcome());
        assert!(summary.contains("http://staging.demo.airlift.sh"));
        assert!(summary.contains("staging"));
    }
}
