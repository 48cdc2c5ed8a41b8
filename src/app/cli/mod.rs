//! CLI Adapter.

mod configure;
mod info;
mod process;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::domain::{AppError, LocatorStrategy};

#[derive(Parser)]
#[command(name = "docfill")]
#[command(version)]
#[command(about = "Fill in the blanks of Word lab reports with generated answers", long_about = None)]
struct Cli {
    /// Configuration file (default: ./docfill.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate insertion points in a document and fill them
    #[clap(visible_alias = "p")]
    Process {
        /// Document to fill (looked up under documents_dir when not found)
        input: PathBuf,
        /// Output path (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// API key (overrides config and environment)
        #[arg(long)]
        api_key: Option<String>,
        /// Model name (overrides config and environment)
        #[arg(long)]
        model: Option<String>,
        /// Extra instructions for every generated answer
        #[arg(long)]
        prompt: Option<String>,
        /// Insertion point strategy: pattern or assisted
        #[arg(long)]
        locator: Option<LocatorStrategy>,
        /// Read answers from stdin instead of calling the API
        #[arg(long)]
        test_mode: bool,
        /// Do not compile, run or plot generated code
        #[arg(long)]
        no_exec: bool,
        /// Print the completion status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactively write the configuration file
    #[clap(visible_alias = "cfg")]
    Configure,
    /// Show configuration and available code execution languages
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Entry point for the CLI.
pub fn run() {
    init_logging();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result: Result<i32, AppError> = match cli.command {
        Commands::Process {
            input,
            output,
            api_key,
            model,
            prompt,
            locator,
            test_mode,
            no_exec,
            json,
        } => process::run_process(
            config_path,
            process::ProcessArgs {
                input,
                output,
                api_key,
                model,
                prompt,
                locator,
                test_mode,
                no_exec,
                json,
            },
        ),
        Commands::Configure => configure::run_configure(config_path).map(|_| 0),
        Commands::Info { json } => info::run_info(config_path, json).map(|_| 0),
    };

    match result {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// `DOCFILL_LOG` (then `RUST_LOG`) filter, `warn` by default, written to stderr.
fn init_logging() {
    let filter = std::env::var("DOCFILL_LOG")
        .ok()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
