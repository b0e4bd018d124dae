// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `assess`
// and their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// The run configuration itself lives in a JSON file; the flags
// here only name that file, select resume behaviour, or override
// the variant toggles for assessment.

use clap::{Args, Subcommand};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the multi-task aesthetic model on a labelled photo collection
    Train(TrainArgs),

    /// Assess one photograph using a trained checkpoint
    Assess(AssessArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the JSON run configuration; when omitted,
    /// `config.json` is read if present, else built-in defaults apply
    #[arg(long)]
    pub config: Option<String>,

    /// Resume from the latest checkpoint of this variant instead
    /// of starting fresh
    #[arg(long)]
    pub resume: bool,

    /// With --resume: load the checkpoint parts that match the
    /// model and keep going even when some are missing
    #[arg(long)]
    pub lenient: bool,
}

/// All arguments for the `assess` command.
#[derive(Args, Debug)]
pub struct AssessArgs {
    /// The photograph to assess
    #[arg(long)]
    pub image: String,

    /// Path to the JSON run configuration that selects the
    /// trained variant; when omitted, `config.json` is read if
    /// present, else built-in defaults apply
    #[arg(long)]
    pub config: Option<String>,

    /// Override the attention toggle of the variant to load
    #[arg(long)]
    pub use_attention: Option<bool>,

    /// Override the kernel size of the variant to load
    #[arg(long)]
    pub kernel_size: Option<usize>,

    /// Override the DWA toggle of the variant to load
    #[arg(long)]
    pub use_dwa: Option<bool>,
}
