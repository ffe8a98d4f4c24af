//! protohelp: generate Go helper files from annotated protobuf descriptors.
//!
//! Reads a descriptor document (JSON or YAML), plans the helpers each
//! annotated message needs and writes one `<schema>.helpers.go` per schema
//! file. Generation is all-or-nothing: any collected error is printed and
//! nothing is written.

mod cli_config;
mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use protohelp_sdk::CodegenError;
use tracing_subscriber::EnvFilter;

use crate::commands::{CaseStyle, PlanFormat};
use crate::error::CtlError;

/// Environment flag switching the default log level to `debug`.
const DEBUG_ENV: &str = "HELPER_DEBUG";

#[derive(Debug, Parser)]
#[command(name = "protohelp", version, about, styles = output::clap_styles())]
struct Cli {
    /// Configuration file [default: ./.protohelp.toml, then ~/.config/protohelp.toml]
    #[arg(long, global = true, env = "PROTOHELP_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate `.helpers.go` files from a descriptor document
    Generate(GenerateArgs),
    /// Print the planned helper artifacts of a descriptor document
    Plan(PlanArgs),
    /// Convert identifiers between naming conventions
    Case(CaseArgs),
}

/// Inputs shared by every command that reads a descriptor document.
#[derive(Debug, Args)]
pub(crate) struct SchemaArgs {
    /// Descriptor document (`.json`, anything else is read as YAML)
    pub descriptor: PathBuf,

    /// Nested message name always keyed by its parent (repeatable)
    #[arg(long = "shared-nested", value_name = "NAME")]
    pub shared_nested: Vec<String>,

    /// Message name suffix that enables paging helpers
    #[arg(long, value_name = "SUFFIX")]
    pub request_suffix: Option<String>,

    /// Page size used when a list request leaves its limit unset
    #[arg(long, value_name = "N")]
    pub page_limit: Option<u32>,
}

#[derive(Debug, Args)]
pub(crate) struct GenerateArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Directory generated files are placed under
    #[arg(long, env = "PROTOHELP_OUT_DIR", value_name = "DIR")]
    pub out_dir: Option<String>,

    /// Go package clause of generated files
    #[arg(long)]
    pub package: Option<String>,

    /// Module prefix stripped from output paths
    #[arg(long, env = "PROTOHELP_MODULE", value_name = "PREFIX")]
    pub module: Option<String>,

    /// Go module of the consuming project (overrides go.mod discovery)
    #[arg(long, value_name = "MODULE")]
    pub go_module: Option<String>,

    /// go.mod to read the Go module from [default: ../../go.mod]
    #[arg(long, value_name = "FILE")]
    pub go_mod: Option<PathBuf>,

    /// Import path of the common proto package
    #[arg(long, value_name = "IMPORT")]
    pub common_import: Option<String>,

    /// Print generated files to stdout instead of writing them
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, Args)]
pub(crate) struct PlanArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = PlanFormat::Json)]
    pub format: PlanFormat,
}

#[derive(Debug, Args)]
pub(crate) struct CaseArgs {
    /// Target naming convention
    #[arg(value_enum)]
    pub style: CaseStyle,

    /// Identifiers to convert
    #[arg(required = true)]
    pub identifiers: Vec<String>,
}

fn init_tracing() {
    let fallback = if std::env::var_os(DEBUG_ENV).is_some() {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_failure(err: &CtlError) {
    match err {
        CtlError::Codegen(CodegenError::Generation(report)) => {
            output::error(format!("{} generation error(s), nothing written", report.len()));
            for (i, error) in report.errors.iter().enumerate() {
                output::numbered(i + 1, error);
            }
        }
        other => output::error(other),
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let config = cli_config::load_cli_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Generate(args) => commands::handle_generate_command(args, &config),
        Commands::Plan(args) => commands::handle_plan_command(args, &config),
        Commands::Case(args) => commands::handle_case_command(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}
