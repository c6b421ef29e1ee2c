use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ls2vector::validate::DEFAULT_TIMEOUT;

#[derive(Parser, Debug)]
#[command(name = "ls2vector")]
#[command(about = "Translate Logstash pipeline configurations into Vector configurations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Convert one Logstash pipeline file.
    Convert(ConvertArgs),
    /// Convert every .conf file under a directory.
    Migrate(MigrateArgs),
    /// Validate generated Vector configs with `vector validate`.
    Validate(ValidateArgs),
    /// Preview the plugin to component mapping of one file.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Logstash pipeline file.
    pub input: PathBuf,
    /// Output Vector config. Defaults to the input path with a .toml extension.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Write the markdown migration report here.
    #[arg(long)]
    pub report: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Print the generated config instead of writing it.
    #[arg(long)]
    pub dry_run: bool,
    /// Run `vector validate` on the written config.
    #[arg(long)]
    pub validate: bool,
    /// Seconds to wait for `vector validate` before giving up.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub validate_timeout: u64,
    /// Overwrite an existing output file.
    #[arg(long)]
    pub force: bool,
    /// Guidance TOML file replacing the built-in catalog.
    #[arg(long)]
    pub guidance_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Directory searched recursively for .conf files.
    pub dir: PathBuf,
    /// Directory for generated configs. Defaults to next to each source.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Combined report path. Defaults to migration-report.md in the output directory.
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Translate and report without writing configs.
    #[arg(long)]
    pub dry_run: bool,
    /// Run `vector validate` on each written config.
    #[arg(long)]
    pub validate: bool,
    /// Seconds to wait for `vector validate` before giving up.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub validate_timeout: u64,
    /// Overwrite existing output files.
    #[arg(long)]
    pub force: bool,
    /// Guidance TOML file replacing the built-in catalog.
    #[arg(long)]
    pub guidance_file: Option<PathBuf>,
    /// Log each file as it is processed.
    #[arg(short, long)]
    pub verbose: bool,
    /// Only print the final summary line.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Vector config files. Defaults to every *.toml in the current directory.
    pub files: Vec<PathBuf>,
    /// Seconds to wait for `vector validate` before giving up.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub validate_timeout: u64,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub input: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Include each plugin's settings and condition.
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
