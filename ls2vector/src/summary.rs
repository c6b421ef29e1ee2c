use std::path::Path;

use colored::Colorize;
use ls2vector::report::{BatchSummary, MigrationReport};
use serde::Serialize;

/// JSON payload printed by `convert --format json`.
#[derive(Debug, Serialize)]
pub struct ConvertJson<'a> {
    pub target: &'a Path,
    pub written: bool,
    pub success_rate: f64,
    pub report: &'a MigrationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

/// Colored terminal summary of one migrated file.
pub fn render_report(report: &MigrationReport, written: bool) -> String {
    let mut lines = Vec::new();
    let action = if written { "Converted" } else { "Translated" };
    lines.push(format!(
        "{} {} -> {}",
        action.bold(),
        report.source_path().display(),
        report.target_path().display()
    ));
    lines.push(format!(
        "  supported={} unsupported={} errors={} warnings={} success_rate={:.1}%",
        report.supported().len(),
        report.unsupported().len(),
        report.errors().len(),
        report.warnings().len(),
        report.success_rate() * 100.0
    ));
    for record in report.unsupported() {
        lines.push(format!(
            "  {} {} ({}) line {}: manual migration required",
            "!".yellow(),
            record.plugin_name,
            record.role,
            record.line
        ));
    }
    for warning in report.warnings() {
        lines.push(format!("  {} {warning}", "!".yellow()));
    }
    for error in report.errors() {
        lines.push(format!("  {} {error}", "x".red()));
    }
    lines.join("\n")
}

/// Colored one-line-per-file summary of a batch run.
pub fn render_batch(summary: &BatchSummary, quiet: bool) -> String {
    let mut lines = Vec::new();
    if !quiet {
        for report in &summary.reports {
            let status = if report.has_errors() {
                "FAIL".red().to_string()
            } else if report.unsupported().is_empty() {
                "OK".green().to_string()
            } else {
                "PARTIAL".yellow().to_string()
            };
            lines.push(format!(
                "{status} {} ({:.1}%)",
                report.source_path().display(),
                report.success_rate() * 100.0
            ));
        }
    }
    lines.push(format!(
        "migrate_summary files={} succeeded={} failed={}",
        summary.total, summary.succeeded, summary.failed
    ));
    lines.join("\n")
}
