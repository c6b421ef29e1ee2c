use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ls2vector::batch::{migrate_all, MigrateOptions, MigrationContext};
use ls2vector::discover::discover_configs;
use ls2vector::path_guard::check_target;
use ls2vector::report::{render_combined, MigrationReport};
use ls2vector::transform::TransformerRegistry;
use ls2vector::validate::{Validator, VectorCli};
use tracing::info;

use crate::cli::MigrateArgs;
use crate::load_catalog;
use crate::summary::render_batch;

const COMBINED_REPORT: &str = "migration-report.md";

pub fn run_migrate(args: MigrateArgs) -> Result<()> {
    let files = discover_configs(&args.dir)
        .with_context(|| format!("failed to scan {}", args.dir.display()))?;
    if files.is_empty() {
        bail!("no .conf files found under {}", args.dir.display());
    }
    info!(count = files.len(), dir = %args.dir.display(), "discovered pipeline files");

    let catalog = load_catalog(args.guidance_file.as_deref())?;
    let registry = TransformerRegistry::builtin();
    let validator =
        VectorCli::default().with_timeout(Duration::from_secs(args.validate_timeout));
    let ctx = MigrationContext {
        registry: &registry,
        catalog: &catalog,
        validator: args.validate.then_some(&validator as &dyn Validator),
    };
    let options = MigrateOptions {
        dry_run: args.dry_run,
        force: args.force,
    };

    if let (Some(dir), false) = (&args.output_dir, args.dry_run) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let summary = migrate_all(
        &args.dir,
        &files,
        args.output_dir.as_deref(),
        &ctx,
        options,
    );

    let report_path = match (&args.report, args.dry_run) {
        (Some(path), _) => Some(path.clone()),
        (None, false) => Some(
            args.output_dir
                .clone()
                .unwrap_or_else(|| args.dir.clone())
                .join(COMBINED_REPORT),
        ),
        (None, true) => None,
    };
    if let Some(path) = &report_path {
        let sources = files.iter().map(PathBuf::as_path).collect::<Vec<_>>();
        check_target(path, &sources)?;
        write_report(path, &summary.reports)?;
    }

    println!("{}", render_batch(&summary, args.quiet));
    if let (Some(path), false) = (&report_path, args.quiet) {
        println!("report written to {}", path.display());
    }

    if !summary.all_succeeded() {
        bail!(
            "{} of {} files failed to migrate",
            summary.failed,
            summary.total
        );
    }
    Ok(())
}

fn write_report(path: &Path, reports: &[MigrationReport]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, render_combined(reports))
        .with_context(|| format!("failed to write report {}", path.display()))
}
