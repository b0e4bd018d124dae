// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`  — trains the model on a labelled photo collection
//   2. `assess` — loads a checkpoint and assesses one photograph
//
// The CLI is also where an assessment becomes visible: PrintSink
// implements the AssessmentSink trait and writes the 12 decoded
// signals to stdout.

// Declare the commands submodule
pub mod commands;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use commands::{AssessArgs, Commands, TrainArgs};

use crate::application::config::Configuration;
use crate::domain::attribute::Attribute;
use crate::domain::traits::{send_result, AssessmentSink};
use crate::infra::checkpoint::LoadMode;
use crate::infra::logging::init_logging;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "mt-aesthetic",
    version = "0.1.0",
    about = "Train a multi-task photo aesthetic model, then assess photographs."
)]
pub struct Cli {
    /// The subcommand to run (train or assess)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => Self::run_train(args),
            Commands::Assess(args) => Self::run_assess(args),
        }
    }

    /// Handles the `train` subcommand.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        let config = load_configuration(args.config.as_deref())?;
        let _log_guard = init_logging(&config.log_dir())?;
        tracing::info!(
            "Run configuration: '{}'",
            args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH)
        );

        let resume = args.resume.then(|| {
            if args.lenient { LoadMode::Lenient } else { LoadMode::Strict }
        });

        let use_case = TrainUseCase::new(config, resume);
        use_case.execute()?;

        println!("Training complete. Checkpoints saved.");
        Ok(())
    }

    /// Handles the `assess` subcommand.
    /// Loads the model from checkpoint and prints the assessment.
    fn run_assess(args: AssessArgs) -> Result<()> {
        use crate::application::assess_use_case::AssessUseCase;

        let mut config = load_configuration(args.config.as_deref())?;
        // Variant overrides select which checkpoint directory to
        // read; everything else comes from the stored config.
        if let Some(use_attention) = args.use_attention {
            config.use_attention = use_attention;
        }
        if let Some(kernel_size) = args.kernel_size {
            config.kernel_size = kernel_size;
        }
        if let Some(use_dwa) = args.use_dwa {
            config.use_dwa = use_dwa;
        }
        let _log_guard = init_logging(&config.log_dir())?;

        let use_case = AssessUseCase::new(config)?;
        match use_case.assess(Path::new(&args.image))? {
            Some(result) => {
                println!("Assessment of '{}':", args.image);
                send_result(&mut PrintSink, &result);
            }
            None => println!("No such image: '{}'", args.image),
        }
        Ok(())
    }
}

/// The configuration file consulted when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Read the run configuration. An explicitly named file must exist
/// and parse; only the implicit default path may fall back to the
/// built-in defaults. Called before logging is up, so it stays silent.
fn load_configuration(path: Option<&str>) -> Result<Configuration> {
    match path {
        Some(path) => Configuration::load(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Configuration::load(DEFAULT_CONFIG_PATH)
        }
        None => Ok(Configuration::default()),
    }
}


// ─── PrintSink ────────────────────────────────────────────────────────────────
/// Writes each decoded signal to stdout as it arrives.
struct PrintSink;

impl AssessmentSink for PrintSink {
    fn set_binary(&mut self, value: bool) {
        println!("  aesthetic:  {}", if value { "positive" } else { "negative" });
    }

    fn set_score(&mut self, value: f64) {
        println!("  score:      {value:.3} / 10");
    }

    fn set_attribute(&mut self, attribute: Attribute, value: bool) {
        println!("  {:<18} {}", attribute.name(), if value { "yes" } else { "no" });
    }
}
