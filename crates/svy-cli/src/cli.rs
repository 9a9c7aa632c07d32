//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "svy",
    version,
    about = "Consolidate survey responses into flat datasets",
    long_about = "Consolidate survey responses into flat datasets.\n\n\
                  Reads each response mode's metadata, answers and paradata, \
                  flattens the answer trees and writes one dataset per mode \
                  plus a multimode dataset."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow respondent answers to appear in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process every mode of a campaign configuration.
    Run(RunArgs),

    /// Print the variables of a metadata descriptor with their qualified names.
    Describe(DescribeArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Campaign configuration (JSON).
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output directory (default: from the configuration, else <CONFIG_DIR>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// How deep loops are flattened.
    #[arg(long = "nesting", value_enum)]
    pub nesting: Option<NestingArg>,

    /// Respondents flattened per batch.
    #[arg(long = "partition-size", value_name = "N")]
    pub partition_size: Option<usize>,

    /// Skip paradata even when configured.
    #[arg(long = "no-paradata")]
    pub no_paradata: bool,

    /// Compute paradata variables but leave them out of the datasets.
    #[arg(long = "drop-paradata-variables")]
    pub drop_paradata_variables: bool,

    /// Output field delimiter.
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Process and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct DescribeArgs {
    /// Metadata descriptor (JSON).
    #[arg(value_name = "METADATA")]
    pub metadata: PathBuf,

    /// Separator between group names in qualified names.
    #[arg(long = "separator", default_value = ".")]
    pub separator: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NestingArg {
    Recursive,
    SingleLevel,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
