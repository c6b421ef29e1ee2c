//! Per-document migration report and its markdown rendering.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use logstash_conf_core::{PluginDeclaration, Role};
use serde::Serialize;

use crate::validate::ValidationOutcome;

/// Category of a [`MigrationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ParseError,
    TransformationError,
    ValidationError,
    /// The generated file could not be written.
    WriteError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ParseError => "parse_error",
            Self::TransformationError => "transformation_error",
            Self::ValidationError => "validation_error",
            Self::WriteError => "write_error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: Option<usize>,
    pub path: PathBuf,
}

impl MigrationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, path: &Path) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            path: path.to_path_buf(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "[{}] {}:{}: {}",
                self.kind,
                self.path.display(),
                line,
                self.message
            ),
            None => write!(f, "[{}] {}: {}", self.kind, self.path.display(), self.message),
        }
    }
}

/// A plugin translated by a registered transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedRecord {
    /// `"<name> (<role>)"`.
    pub plugin: String,
    pub plugin_name: String,
    pub role: Role,
    pub line: usize,
    pub components: Vec<String>,
    pub note: Option<String>,
}

impl SupportedRecord {
    pub fn new(decl: &PluginDeclaration, components: Vec<String>, note: Option<String>) -> Self {
        Self {
            plugin: format!("{} ({})", decl.name(), decl.role()),
            plugin_name: decl.name().to_string(),
            role: decl.role(),
            line: decl.line(),
            components,
            note,
        }
    }
}

/// A plugin replaced by an annotated placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedRecord {
    pub plugin_name: String,
    pub role: Role,
    pub line: usize,
    pub original_text: String,
    pub guidance: String,
    pub alternatives: Vec<String>,
    pub placeholder_id: String,
}

/// Outcome of migrating one source document. Built with [`ReportBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    source_path: PathBuf,
    target_path: PathBuf,
    timestamp: DateTime<Utc>,
    supported: Vec<SupportedRecord>,
    unsupported: Vec<UnsupportedRecord>,
    errors: Vec<MigrationError>,
    warnings: Vec<String>,
}

/// Accumulates records while a document is translated.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    report: MigrationReport,
}

impl ReportBuilder {
    pub fn new(source_path: &Path, target_path: &Path) -> Self {
        Self {
            report: MigrationReport {
                source_path: source_path.to_path_buf(),
                target_path: target_path.to_path_buf(),
                timestamp: Utc::now(),
                supported: Vec::new(),
                unsupported: Vec::new(),
                errors: Vec::new(),
                warnings: Vec::new(),
            },
        }
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.report.timestamp = timestamp;
        self
    }

    pub fn supported(&mut self, record: SupportedRecord) {
        self.report.supported.push(record);
    }

    pub fn unsupported(&mut self, record: UnsupportedRecord) {
        self.report.unsupported.push(record);
    }

    pub fn error(&mut self, error: MigrationError) {
        self.report.errors.push(error);
    }

    pub fn warning(&mut self, warning: impl Into<String>) {
        self.report.warnings.push(warning.into());
    }

    pub fn build(self) -> MigrationReport {
        self.report
    }
}

/// Counts read back from a rendered report summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummaryCounts {
    pub supported: usize,
    pub unsupported: usize,
    pub errors: usize,
    pub warnings: usize,
}

const SUPPORTED_LABEL: &str = "- Supported plugins: ";
const UNSUPPORTED_LABEL: &str = "- Unsupported plugins: ";
const ERRORS_LABEL: &str = "- Errors: ";
const WARNINGS_LABEL: &str = "- Warnings: ";

impl MigrationReport {
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn supported(&self) -> &[SupportedRecord] {
        &self.supported
    }

    pub fn unsupported(&self) -> &[UnsupportedRecord] {
        &self.unsupported
    }

    pub fn errors(&self) -> &[MigrationError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `supported / (supported + unsupported)`, or 0.0 when there are no records.
    pub fn success_rate(&self) -> f64 {
        let total = self.supported.len() + self.unsupported.len();
        if total == 0 {
            return 0.0;
        }
        self.supported.len() as f64 / total as f64
    }

    /// Attach an external validation outcome.
    ///
    /// An invalid result becomes a `validation_error`; an unavailable validator
    /// becomes a warning.
    pub fn with_validation(mut self, outcome: &ValidationOutcome) -> Self {
        match outcome {
            ValidationOutcome::Valid => {}
            ValidationOutcome::Invalid(message) => self.errors.push(MigrationError::new(
                ErrorKind::ValidationError,
                message.clone(),
                &self.target_path,
            )),
            ValidationOutcome::Unavailable(message) => self
                .warnings
                .push(format!("validation skipped: {message}")),
        }
        self
    }

    /// Append an error found after translation.
    pub fn with_error(mut self, error: MigrationError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Render the full markdown report.
    pub fn render_markdown(&self) -> String {
        let mut lines = Vec::new();
        lines.push("# Logstash to Vector Migration Report".to_string());
        lines.push(String::new());
        lines.push(format!("- **Source:** `{}`", self.source_path.display()));
        lines.push(format!("- **Target:** `{}`", self.target_path.display()));
        lines.push(format!(
            "- **Generated:** {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        lines.push(format!("- **Success rate:** {}", format_rate(self.success_rate())));
        lines.push(String::new());

        lines.push("## Summary".to_string());
        lines.push(String::new());
        lines.push(format!("{SUPPORTED_LABEL}{}", self.supported.len()));
        lines.push(format!("{UNSUPPORTED_LABEL}{}", self.unsupported.len()));
        lines.push(format!("{ERRORS_LABEL}{}", self.errors.len()));
        lines.push(format!("{WARNINGS_LABEL}{}", self.warnings.len()));

        if !self.supported.is_empty() {
            lines.push(String::new());
            lines.push("## Supported Plugins".to_string());
            for record in &self.supported {
                lines.push(String::new());
                lines.push(format!("### {}", record.plugin));
                lines.push(String::new());
                lines.push(format!("- Line: {}", record.line));
                let ids = record
                    .components
                    .iter()
                    .map(|id| format!("`{id}`"))
                    .collect::<Vec<_>>();
                lines.push(format!("- Components: {}", ids.join(", ")));
                if let Some(note) = &record.note {
                    lines.push(format!("- Note: {note}"));
                }
            }
        }

        if !self.unsupported.is_empty() {
            lines.push(String::new());
            lines.push("## Unsupported Plugins".to_string());
            for record in &self.unsupported {
                lines.push(String::new());
                lines.push(format!("### {} ({})", record.plugin_name, record.role));
                lines.push(String::new());
                lines.push(format!("- Line: {}", record.line));
                lines.push(format!("- Placeholder: `{}`", record.placeholder_id));
                lines.push(String::new());
                lines.push("**Original configuration:**".to_string());
                lines.push(String::new());
                lines.push("```".to_string());
                lines.extend(record.original_text.lines().map(str::to_string));
                lines.push("```".to_string());
                lines.push(String::new());
                lines.push("**Migration guidance:**".to_string());
                lines.push(String::new());
                lines.extend(record.guidance.lines().map(str::to_string));
                append_list(&mut lines, "**Vector alternatives:**", &record.alternatives);
            }
        }

        let errors = self.errors.iter().map(ToString::to_string).collect::<Vec<_>>();
        append_list(&mut lines, "## Errors", &errors);
        append_list(&mut lines, "## Warnings", &self.warnings);

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Read the Summary counts back out of [`MigrationReport::render_markdown`] output.
///
/// Returns `None` when the summary section or any of its four lines is missing.
pub fn summary_counts(markdown: &str) -> Option<SummaryCounts> {
    let summary = markdown
        .lines()
        .skip_while(|line| line.trim() != "## Summary")
        .skip(1)
        .take_while(|line| !line.starts_with("## "))
        .collect::<Vec<_>>();
    let count = |label: &str| {
        summary
            .iter()
            .find_map(|line| line.strip_prefix(label))
            .and_then(|rest| rest.trim().parse::<usize>().ok())
    };
    Some(SummaryCounts {
        supported: count(SUPPORTED_LABEL)?,
        unsupported: count(UNSUPPORTED_LABEL)?,
        errors: count(ERRORS_LABEL)?,
        warnings: count(WARNINGS_LABEL)?,
    })
}

/// Aggregate outcome of a batch migration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub reports: Vec<MigrationReport>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// A file succeeds when its report has no errors.
    pub fn from_reports(reports: Vec<MigrationReport>) -> Self {
        let succeeded = reports.iter().filter(|r| !r.has_errors()).count();
        Self {
            total: reports.len(),
            failed: reports.len() - succeeded,
            succeeded,
            reports,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Render a combined report for several migrated files.
pub fn render_combined(reports: &[MigrationReport]) -> String {
    let supported = reports.iter().map(|r| r.supported.len()).sum::<usize>();
    let unsupported = reports.iter().map(|r| r.unsupported.len()).sum::<usize>();
    let errors = reports.iter().map(|r| r.errors.len()).sum::<usize>();
    let warnings = reports.iter().map(|r| r.warnings.len()).sum::<usize>();

    let mut lines = vec![
        "# Combined Migration Report".to_string(),
        String::new(),
        format!("**Total files migrated:** {}", reports.len()),
        String::new(),
        "## Overall Statistics".to_string(),
        String::new(),
        format!("- Supported plugins: {supported}"),
        format!("- Unsupported plugins: {unsupported}"),
        format!("- Errors: {errors}"),
        format!("- Warnings: {warnings}"),
        String::new(),
        "## Individual File Reports".to_string(),
    ];

    for (i, report) in reports.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("### {}. {}", i + 1, report.source_path.display()));
        lines.push(String::new());
        lines.push(format!("- Target: `{}`", report.target_path.display()));
        lines.push(format!("- Success rate: {}", format_rate(report.success_rate())));
        lines.push(format!("- Supported: {}", report.supported.len()));
        lines.push(format!("- Unsupported: {}", report.unsupported.len()));
        lines.push(format!("- Errors: {}", report.errors.len()));

        let unsupported = report
            .unsupported
            .iter()
            .map(|p| format!("{} ({}) at line {}", p.plugin_name, p.role, p.line))
            .collect::<Vec<_>>();
        append_list(&mut lines, "**Unsupported plugins:**", &unsupported);
        let errors = report.errors.iter().map(ToString::to_string).collect::<Vec<_>>();
        append_list(&mut lines, "**Errors:**", &errors);
    }

    lines.push(String::new());
    lines.push("## Detailed Reports".to_string());
    for (i, report) in reports.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("### File {}: {}", i + 1, report.source_path.display()));
        lines.push(String::new());
        // demote the per-file headings below the combined ones
        for line in report.render_markdown().lines() {
            if line.starts_with('#') {
                lines.push(format!("##{line}"));
            } else {
                lines.push(line.to_string());
            }
        }
        lines.push("---".to_string());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn append_list(lines: &mut Vec<String>, title: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(title.to_string());
    lines.push(String::new());
    for value in values {
        lines.push(format!("- {value}"));
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::{TimeZone, Utc};
    use logstash_conf_core::{PluginDeclaration, Role, Settings};
    use pretty_assertions::assert_eq;

    use super::{
        render_combined, summary_counts, BatchSummary, ErrorKind, MigrationError, ReportBuilder,
        SummaryCounts, SupportedRecord, UnsupportedRecord,
    };
    use crate::validate::ValidationOutcome;

    fn builder() -> ReportBuilder {
        ReportBuilder::new(Path::new("in.conf"), Path::new("out.toml"))
            .timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid date"))
    }

    fn supported(name: &str) -> SupportedRecord {
        let decl = PluginDeclaration::new(Role::Input, name, Settings::new(), 2);
        SupportedRecord::new(
            &decl,
            vec![format!("{name}_input_0")],
            Some("Migrated to Vector file source".to_string()),
        )
    }

    fn unsupported(name: &str) -> UnsupportedRecord {
        UnsupportedRecord {
            plugin_name: name.to_string(),
            role: Role::Input,
            line: 4,
            original_text: format!("{name} {{\n  topics => [\"logs\"]\n}}"),
            guidance: "Use the kafka source.".to_string(),
            alternatives: vec!["kafka source".to_string()],
            placeholder_id: format!("{name}_input_1"),
        }
    }

    #[test]
    fn success_rate_is_ratio_of_supported() {
        let empty = builder().build();
        assert_eq!(empty.success_rate(), 0.0);

        let mut b = builder();
        b.supported(supported("file"));
        b.unsupported(unsupported("kafka"));
        assert_eq!(b.build().success_rate(), 0.5);
    }

    #[test]
    fn markdown_contains_sections() {
        let mut b = builder();
        b.supported(supported("file"));
        b.unsupported(unsupported("kafka"));
        b.error(
            MigrationError::new(ErrorKind::TransformationError, "bad port", Path::new("in.conf"))
                .at_line(9),
        );
        b.warning("conditional not translated");
        let text = b.build().render_markdown();

        assert!(text.contains("- **Generated:** 2024-05-01T12:00:00Z"));
        assert!(text.contains("- **Success rate:** 50.0%"));
        assert!(text.contains("### file (input)"));
        assert!(text.contains("- Components: `file_input_0`"));
        assert!(text.contains("### kafka (input)"));
        assert!(text.contains("  topics => [\"logs\"]"));
        assert!(text.contains("- kafka source"));
        assert!(text.contains("- [transformation_error] in.conf:9: bad port"));
        assert!(text.contains("- conditional not translated"));
    }

    #[test]
    fn summary_counts_round_trip() {
        let mut b = builder();
        b.supported(supported("file"));
        b.supported(supported("beats"));
        b.unsupported(unsupported("kafka"));
        b.warning("w");
        let text = b.build().render_markdown();

        assert_eq!(
            summary_counts(&text),
            Some(SummaryCounts {
                supported: 2,
                unsupported: 1,
                errors: 0,
                warnings: 1,
            })
        );
        assert_eq!(summary_counts("# nothing here"), None);
    }

    #[test]
    fn validation_outcomes_attach_to_report() {
        let report = builder()
            .build()
            .with_validation(&ValidationOutcome::Invalid("unknown field".to_string()));
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].kind, ErrorKind::ValidationError);
        assert_eq!(report.errors()[0].path, Path::new("out.toml"));

        let report = builder()
            .build()
            .with_validation(&ValidationOutcome::Unavailable("vector not found".to_string()));
        assert!(report.errors().is_empty());
        assert_eq!(report.warnings(), &["validation skipped: vector not found".to_string()]);
    }

    #[test]
    fn batch_summary_counts_failed_files() {
        let ok = builder().build();
        let mut bad = builder();
        bad.error(MigrationError::new(
            ErrorKind::ParseError,
            "no output",
            Path::new("in.conf"),
        ));
        let summary = BatchSummary::from_reports(vec![ok, bad.build()]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn combined_report_lists_each_file() {
        let mut b = builder();
        b.unsupported(unsupported("kafka"));
        let text = render_combined(&[builder().build(), b.build()]);
        assert!(text.contains("**Total files migrated:** 2"));
        assert!(text.contains("- Unsupported plugins: 1"));
        assert!(text.contains("- kafka (input) at line 4"));
        assert!(text.contains("### File 2: in.conf"));
        assert!(text.contains("### Logstash to Vector Migration Report"));
    }
}
