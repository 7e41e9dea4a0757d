//! eos cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; eos ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the terraform files of a module
    Lint(LintCommand),

    /// List all rules
    Rules(RulesCommand),
}

#[derive(Parser, Debug)]
pub struct LintCommand {
    /// Configuration file
    ///
    /// Defaults to .tflint.hcl in the work directory, then in the home directory.
    /// Rules use their defaults when there is none.
    #[clap(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Only run the named rule
    ///
    /// Can be specified multiple times.
    #[clap(short = 'r', long = "rule")]
    pub rules: Vec<String>,

    /// Treat the module as an included module
    ///
    /// Comment based rules only check the root module.
    #[clap(long = "not-root")]
    pub not_root: bool,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Module directory, defaults to the work directory
    pub module: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct RulesCommand {
    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
