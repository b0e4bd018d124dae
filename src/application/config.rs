// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// One struct holds every knob for a training or assessment run.
// Serialisable so the checkpoint manager can write it next to
// the weights and inference can rebuild the exact model variant.
//
// The variant id encodes the three architecture/training toggles
// that change what lands on disk — attention flag, kernel size,
// DWA flag — so runs with different toggles get separate
// checkpoint directories (e.g. "131" = attention on, 3x3
// kernels, DWA on).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which optimiser drives the parameter updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

/// Sample counts for the train / validation / test partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCounts {
    pub train: usize,
    pub val:   usize,
    pub test:  usize,
}

// ─── Configuration ────────────────────────────────────────────────────────────
/// All hyperparameters and paths for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    // ── Data ──
    pub data_dir:   String,
    pub output_dir: String,
    pub split:      SplitCounts,
    pub seed:       u64,

    // ── Model ──
    /// Width of the deepest backbone stage; earlier stages use
    /// channels/8, /4 and /2.
    pub channels:      usize,
    pub kernel_size:   usize,
    pub use_attention: bool,

    // ── Training ──
    pub optimizer:  OptimizerKind,
    pub lr:         f64,
    pub batch_size: usize,
    pub max_epochs: usize,
    /// Recorded with the run; precision is fixed by the backend,
    /// so this flag only selects what the run reports.
    pub use_amp: bool,

    // ── Loss weighting ──
    pub use_dwa:         bool,
    pub dwa_temperature: f64,

    // ── Decoding ──
    pub binary_threshold:    f64,
    pub attribute_threshold: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            data_dir:   "data/photographs".to_string(),
            output_dir: "outputs".to_string(),
            split:      SplitCounts { train: 6000, val: 2000, test: 2000 },
            seed:       42,

            channels:      1024,
            kernel_size:   3,
            use_attention: true,

            optimizer:  OptimizerKind::Adam,
            lr:         1e-4,
            batch_size: 16,
            max_epochs: 100,
            use_amp:    false,

            use_dwa:         true,
            dwa_temperature: 2.0,

            binary_threshold:    0.2,
            attribute_threshold: 4e-4,
        }
    }
}

impl Configuration {
    /// Read a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Malformed configuration '{}'", path.display()))
    }

    /// Checkpoint directory name for this variant:
    /// {attention as 0/1}{kernel size}{DWA as 0/1}.
    pub fn variant_id(&self) -> String {
        format!(
            "{}{}{}",
            self.use_attention as u8,
            self.kernel_size,
            self.use_dwa as u8
        )
    }

    /// Root under which every variant's checkpoints live.
    pub fn checkpoint_root(&self) -> PathBuf {
        Path::new(&self.output_dir).join("checkpoints")
    }

    /// Directory for the dated log files.
    pub fn log_dir(&self) -> PathBuf {
        Path::new(&self.output_dir).join("logs")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_id_encodes_the_three_toggles() {
        let mut cfg = Configuration::default();
        cfg.use_attention = true;
        cfg.kernel_size = 3;
        cfg.use_dwa = true;
        assert_eq!(cfg.variant_id(), "131");

        cfg.use_attention = false;
        cfg.kernel_size = 5;
        cfg.use_dwa = false;
        assert_eq!(cfg.variant_id(), "050");
    }

    #[test]
    fn defaults_keep_the_calibrated_thresholds() {
        let cfg = Configuration::default();
        assert_eq!(cfg.binary_threshold, 0.2);
        assert_eq!(cfg.attribute_threshold, 4e-4);
    }

    #[test]
    fn configuration_round_trips_through_json() {
        let cfg = Configuration {
            optimizer: OptimizerKind::Sgd,
            channels: 256,
            use_attention: false,
            ..Configuration::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back.optimizer, OptimizerKind::Sgd);
        assert_eq!(back.channels, 256);
        assert_eq!(back.variant_id(), cfg.variant_id());
    }

    #[test]
    fn load_reports_the_offending_path() {
        let err = Configuration::load("no/such/config.json").unwrap_err();
        assert!(err.to_string().contains("no/such/config.json"));
    }
}
