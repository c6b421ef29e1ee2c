use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use ls2vector::batch::{migrate_file, MigrateOptions, MigrationContext};
use ls2vector::guidance::GuidanceCatalog;
use ls2vector::inspect::{inspect, render_text};
use ls2vector::path_guard::check_target;
use ls2vector::serialize::render;
use ls2vector::transform::TransformerRegistry;
use ls2vector::validate::{ValidationOutcome, Validator, VectorCli};
use logstash_conf_core::parse_file;
use tracing_subscriber::EnvFilter;

mod cli;
mod migrate_cmd;
mod summary;

use cli::{Cli, Command, ConvertArgs, InspectArgs, OutputFormat, ValidateArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Command::Migrate(args) if args.verbose => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Migrate(args) => migrate_cmd::run_migrate(args),
        Command::Validate(args) => run_validate(args),
        Command::Inspect(args) => run_inspect(args),
    }
}

/// Built-in guidance, or the catalog in `path` when given.
pub(crate) fn load_catalog(path: Option<&Path>) -> Result<GuidanceCatalog> {
    match path {
        Some(path) => GuidanceCatalog::load(path)
            .with_context(|| format!("failed to load guidance from {}", path.display())),
        None => Ok(GuidanceCatalog::default()),
    }
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let catalog = load_catalog(args.guidance_file.as_deref())?;
    let registry = TransformerRegistry::builtin();
    let validator =
        VectorCli::default().with_timeout(Duration::from_secs(args.validate_timeout));
    let ctx = MigrationContext {
        registry: &registry,
        catalog: &catalog,
        validator: args.validate.then_some(&validator as &dyn Validator),
    };
    let target = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("toml"));

    let outcome = migrate_file(
        &args.input,
        &target,
        &ctx,
        MigrateOptions {
            dry_run: args.dry_run,
            force: args.force,
        },
    );

    let config = match (&outcome.document, args.dry_run) {
        (Some(document), true) => Some(
            render(document, &args.input)
                .with_context(|| format!("failed to render {}", target.display()))?,
        ),
        _ => None,
    };

    if let Some(path) = &args.report {
        check_target(path, &[args.input.as_path(), target.as_path()])?;
        fs::write(path, outcome.report.render_markdown())
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }

    match args.format {
        OutputFormat::Text => {
            if let Some(config) = &config {
                print!("{config}");
            }
            println!("{}", summary::render_report(&outcome.report, outcome.written));
        }
        OutputFormat::Json => {
            let payload = summary::ConvertJson {
                target: &target,
                written: outcome.written,
                success_rate: outcome.report.success_rate(),
                report: &outcome.report,
                config,
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    if outcome.report.has_errors() {
        bail!(
            "conversion of {} finished with {} error(s)",
            args.input.display(),
            outcome.report.errors().len()
        );
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let files = if args.files.is_empty() {
        toml_files_in(Path::new("."))?
    } else {
        args.files
    };
    if files.is_empty() {
        bail!("no .toml files to validate");
    }

    let validator =
        VectorCli::default().with_timeout(Duration::from_secs(args.validate_timeout));
    let mut failed = 0;
    for file in &files {
        match validator.validate(file) {
            ValidationOutcome::Valid => println!("{} {}", "valid".green(), file.display()),
            ValidationOutcome::Invalid(message) => {
                failed += 1;
                println!("{} {}: {message}", "invalid".red(), file.display());
            }
            ValidationOutcome::Unavailable(message) => {
                bail!("cannot validate {}: {message}", file.display())
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} files failed validation", files.len());
    }
    Ok(())
}

fn toml_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let document = parse_file(&args.input)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    let registry = TransformerRegistry::builtin();
    let entries = inspect(&document, &registry);

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&entries, args.verbose)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}
