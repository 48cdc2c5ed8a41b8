//! Process command implementation.

use std::path::{Path, PathBuf};

use crate::app::api::{self, GeneratorMode, ProcessOutcome};
use crate::domain::{AppError, LocatorStrategy};

pub struct ProcessArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub locator: Option<LocatorStrategy>,
    pub test_mode: bool,
    pub no_exec: bool,
    pub json: bool,
}

pub fn run_process(config_path: Option<&Path>, args: ProcessArgs) -> Result<i32, AppError> {
    let mut config = api::load_config(config_path)?;
    if let Some(key) = args.api_key {
        config.api.api_key = Some(key);
    }
    if let Some(model) = args.model {
        config.api.model = model;
    }
    if let Some(prompt) = args.prompt {
        config.document.custom_prompt = Some(prompt);
    }
    if let Some(strategy) = args.locator {
        config.locator.strategy = strategy;
    }
    if args.no_exec {
        config.execution.enabled = false;
    }

    let mode = if args.test_mode { GeneratorMode::Stdio } else { GeneratorMode::Http };
    let outcome = api::process(&args.input, args.output.as_deref(), &config, mode)?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&outcome).map_err(|e| AppError::ParseError {
            what: "completion status".to_string(),
            details: e.to_string(),
        })?;
        println!("{}", rendered);
    } else {
        print_outcome(&outcome);
    }

    Ok(if outcome.success { 0 } else { 1 })
}

fn print_outcome(outcome: &ProcessOutcome) {
    let status = &outcome.status;
    if status.total == 0 {
        println!("✅ No insertion points found; document left as is");
        println!("✅ Saved to {}", outcome.output.display());
        return;
    }

    println!("Completion status:");
    println!("  Total points: {}", status.total);
    println!("  Filled: {}", status.filled);
    println!("  Remaining: {}", status.remaining);
    println!("  Rate: {:.1}%", status.rate * 100.0);

    if status.remaining > 0 {
        println!("⚠️  {} insertion point(s) not filled:", status.remaining);
        for point in status.unfilled() {
            println!("  • {}", point);
        }
    }

    println!("✅ Saved to {}", outcome.output.display());
}
