//! File-level migration: read, translate, guard, write, validate.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::discover::target_for;
use crate::guidance::GuidanceCatalog;
use crate::path_guard::{check_target, write_decision, WriteDecision};
use crate::report::{BatchSummary, ErrorKind, MigrationError, MigrationReport, ReportBuilder};
use crate::serialize::write_document;
use crate::target::TargetDocument;
use crate::transform::TransformerRegistry;
use crate::translate::{migrate_source, MigrationPaths};
use crate::validate::Validator;

/// Shared read-only state for migrating files.
#[derive(Clone, Copy)]
pub struct MigrationContext<'a> {
    pub registry: &'a TransformerRegistry,
    pub catalog: &'a GuidanceCatalog,
    /// Run after a file is written, when set.
    pub validator: Option<&'a dyn Validator>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrateOptions {
    /// Translate and report, but write nothing.
    pub dry_run: bool,
    /// Replace existing target files.
    pub force: bool,
}

/// Result of migrating one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub document: Option<TargetDocument>,
    pub report: MigrationReport,
    /// Whether the target file was written.
    pub written: bool,
}

/// Migrate one source file to `target`.
///
/// Failures never abort: they are recorded in the returned report.
pub fn migrate_file(
    source: &Path,
    target: &Path,
    ctx: &MigrationContext<'_>,
    options: MigrateOptions,
) -> FileOutcome {
    let text = match fs::read_to_string(source) {
        Ok(text) => text,
        Err(err) => {
            let mut builder = ReportBuilder::new(source, target);
            builder.error(MigrationError::new(
                ErrorKind::ParseError,
                format!("failed to read config file: {err}"),
                source,
            ));
            return FileOutcome {
                document: None,
                report: builder.build(),
                written: false,
            };
        }
    };

    let paths = MigrationPaths::new(source, target);
    let translation = migrate_source(&text, &paths, ctx.registry, ctx.catalog);
    let mut report = translation.report;
    let Some(document) = translation.document else {
        return FileOutcome {
            document: None,
            report,
            written: false,
        };
    };

    if options.dry_run {
        return FileOutcome {
            document: Some(document),
            report,
            written: false,
        };
    }

    if let Err(err) = check_target(target, &[source]) {
        report = report.with_error(MigrationError::new(
            ErrorKind::WriteError,
            err.to_string(),
            target,
        ));
        return FileOutcome {
            document: Some(document),
            report,
            written: false,
        };
    }

    if write_decision(target, options.force) == WriteDecision::SkipExisting {
        warn!(target = %target.display(), "target exists, skipping");
        report = report.with_warning(format!(
            "target {} already exists; not overwritten (use --force)",
            target.display()
        ));
        return FileOutcome {
            document: Some(document),
            report,
            written: false,
        };
    }

    if let Err(err) = write_document(&document, source, target) {
        report = report.with_error(MigrationError::new(
            ErrorKind::WriteError,
            err.to_string(),
            target,
        ));
        return FileOutcome {
            document: Some(document),
            report,
            written: false,
        };
    }
    info!(source = %source.display(), target = %target.display(), "wrote vector config");

    if let Some(validator) = ctx.validator {
        let outcome = validator.validate(target);
        report = report.with_validation(&outcome);
    }

    FileOutcome {
        document: Some(document),
        report,
        written: true,
    }
}

/// Migrate every file in `sources` in parallel. Report order follows `sources`.
pub fn migrate_all(
    root: &Path,
    sources: &[PathBuf],
    output_dir: Option<&Path>,
    ctx: &MigrationContext<'_>,
    options: MigrateOptions,
) -> BatchSummary {
    let reports = sources
        .par_iter()
        .map(|source| {
            let target = target_for(source, root, output_dir);
            migrate_file(source, &target, ctx, options).report
        })
        .collect::<Vec<_>>();
    BatchSummary::from_reports(reports)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::{migrate_all, migrate_file, MigrateOptions, MigrationContext};
    use crate::guidance::GuidanceCatalog;
    use crate::report::ErrorKind;
    use crate::transform::TransformerRegistry;
    use crate::validate::{ValidationOutcome, Validator};

    const PIPELINE: &str = "input { stdin {} }\noutput { stdout {} }\n";

    struct Rejecting;

    impl Validator for Rejecting {
        fn validate(&self, _path: &Path) -> ValidationOutcome {
            ValidationOutcome::Invalid("sinks.x: unknown field".to_string())
        }
    }

    #[test]
    fn writes_target_and_skips_existing_without_force() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("p.conf");
        let target = dir.path().join("p.toml");
        fs::write(&source, PIPELINE).expect("write");
        let registry = TransformerRegistry::builtin();
        let catalog = GuidanceCatalog::default();
        let ctx = MigrationContext {
            registry: &registry,
            catalog: &catalog,
            validator: None,
        };

        let first = migrate_file(&source, &target, &ctx, MigrateOptions::default());
        assert!(first.written);
        assert!(fs::read_to_string(&target).expect("read").contains("[sources.stdin_input_0]"));

        let second = migrate_file(&source, &target, &ctx, MigrateOptions::default());
        assert!(!second.written);
        assert_eq!(second.report.warnings().len(), 1);

        let forced = migrate_file(
            &source,
            &target,
            &ctx,
            MigrateOptions {
                force: true,
                ..MigrateOptions::default()
            },
        );
        assert!(forced.written);
    }

    #[test]
    fn refuses_to_overwrite_source() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("p.conf");
        fs::write(&source, PIPELINE).expect("write");
        let registry = TransformerRegistry::builtin();
        let catalog = GuidanceCatalog::default();
        let ctx = MigrationContext {
            registry: &registry,
            catalog: &catalog,
            validator: None,
        };

        let outcome = migrate_file(
            &source,
            &source,
            &ctx,
            MigrateOptions {
                force: true,
                ..MigrateOptions::default()
            },
        );
        assert!(!outcome.written);
        assert_eq!(outcome.report.errors()[0].kind, ErrorKind::WriteError);
        assert_eq!(fs::read_to_string(&source).expect("read"), PIPELINE);
    }

    #[test]
    fn validation_failures_keep_the_document() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("p.conf");
        fs::write(&source, PIPELINE).expect("write");
        let registry = TransformerRegistry::builtin();
        let catalog = GuidanceCatalog::default();
        let ctx = MigrationContext {
            registry: &registry,
            catalog: &catalog,
            validator: Some(&Rejecting),
        };

        let outcome = migrate_file(
            &source,
            &dir.path().join("p.toml"),
            &ctx,
            MigrateOptions::default(),
        );
        assert!(outcome.written);
        assert!(outcome.document.is_some());
        assert_eq!(outcome.report.errors()[0].kind, ErrorKind::ValidationError);
    }

    #[test]
    fn batch_continues_past_bad_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("good.conf"), PIPELINE).expect("write");
        fs::write(dir.path().join("bad.conf"), "input { stdin {} }\n").expect("write");
        let out = dir.path().join("out");
        let sources = vec![dir.path().join("bad.conf"), dir.path().join("good.conf")];
        let registry = TransformerRegistry::builtin();
        let catalog = GuidanceCatalog::default();
        let ctx = MigrationContext {
            registry: &registry,
            catalog: &catalog,
            validator: None,
        };

        let summary = migrate_all(dir.path(), &sources, Some(out.as_path()), &ctx, MigrateOptions::default());
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.reports[0].errors()[0].kind, ErrorKind::ParseError);
        assert!(out.join("good.toml").exists());
        assert!(!out.join("bad.toml").exists());
    }
}
