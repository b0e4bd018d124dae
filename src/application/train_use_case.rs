// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the label manifest + photos   (Layer 4 - data)
//   Step 2: Split train/validation/test        (Layer 4 - data)
//   Step 3: Build datasets                     (Layer 4 - data)
//   Step 4: Save config into the variant dir   (Layer 6 - infra)
//   Step 5: Wire the tracing + CSV event sink  (Layer 6 - infra)
//   Step 6: Run the training engine            (Layer 5 - ml)
//
// The test partition from step 2 is held out entirely; it is
// never touched during training.

use anyhow::Result;

use crate::application::config::Configuration;
use crate::data::{dataset::AestheticDataset, loader::ManifestLoader, splitter::split_three};
use crate::infra::checkpoint::{CheckpointManager, LoadMode};
use crate::infra::logging::TracingEventSink;
use crate::infra::metrics::MetricsLogger;
use crate::ml::trainer::run_training;

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
/// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: Configuration,
    resume: Option<LoadMode>,
}

impl TrainUseCase {
    pub fn new(config: Configuration, resume: Option<LoadMode>) -> Self {
        Self { config, resume }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;
        tracing::info!(
            "Training variant {}: optimizer {:?}, lr {}, batch size {}, {} epochs, DWA {}",
            cfg.variant_id(),
            cfg.optimizer,
            cfg.lr,
            cfg.batch_size,
            cfg.max_epochs,
            if cfg.use_dwa { "on" } else { "off" },
        );

        // ── Step 1: Load the labelled photo collection ────────────────────────
        let loader = ManifestLoader::new(&cfg.data_dir, cfg.seed);
        let samples = loader.load_all()?;

        // ── Step 2: Three-way split ───────────────────────────────────────────
        // The same seed shuffles the same collection identically,
        // so a resumed run sees the exact same partitions.
        let (train, val, test) = split_three(
            samples,
            [cfg.split.train, cfg.split.val, cfg.split.test],
            cfg.seed,
        )?;
        tracing::info!(
            "Split: {} train, {} validation, {} test (held out)",
            train.len(),
            val.len(),
            test.len(),
        );
        drop(test);

        // ── Step 3: Burn datasets ─────────────────────────────────────────────
        let train_dataset = AestheticDataset::new(train);
        let val_dataset = AestheticDataset::new(val);

        // ── Step 4: Variant checkpoint dir + config snapshot ──────────────────
        let ckpt = CheckpointManager::for_variant(cfg.checkpoint_root(), cfg)?;
        ckpt.save_config(cfg)?;

        // ── Step 5: Event sink (tracing lines + metrics CSV) ──────────────────
        let mut sink = TracingEventSink::new(MetricsLogger::new(ckpt.dir())?);

        // ── Step 6: Run the training engine ───────────────────────────────────
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        run_training::<TrainBackend>(
            cfg,
            train_dataset,
            val_dataset,
            &ckpt,
            &mut sink,
            self.resume,
            &device,
        )
    }
}
