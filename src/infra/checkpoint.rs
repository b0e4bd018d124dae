// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists the full training state — model parameters, optimizer
// state, progress counters — and restores it on resume.
//
// Directory layout (one variant directory per model
// configuration, so distinct variants never collide on disk):
//
//   checkpoints/<variant>/
//     epoch_7/
//       backbone.mpk    ← shared feature extractor parameters
//       heads.mpk       ← the three task heads
//       attention.mpk   ← present only for attention variants
//       optimizer.mpk   ← optimizer state (e.g. Adam moments)
//       progress.json   ← epoch and iteration counters
//     config.json       ← the run configuration, for inference
//     latest.json       ← pointer to the newest complete bundle
//
// The variant name encodes {attention flag}{kernel size}{DWA
// flag}, e.g. "131".
//
// Crash safety: every save writes a fresh epoch bundle and only
// then updates `latest.json` through a temp-file rename. A
// reader that follows the pointer can never observe fresh model
// weights paired with stale optimizer state.
//
// The model is recorded as separately named parts because the
// attention block is a per-run architecture toggle: strict mode
// demands every part the target model has, lenient mode loads
// what matches and names the gaps in the returned LoadOutcome.

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Record, Recorder, RecorderError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::config::Configuration;
use crate::ml::model::{BackboneRecord, MtAesthetic, SpatialAttentionRecord, TaskHeadsRecord};

type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// File extension the recorder appends to part names.
const PART_EXTENSION: &str = "mpk";

// ─── Types ────────────────────────────────────────────────────────────────────
/// The progress counters persisted with every bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    /// Last completed epoch (1-based).
    pub epoch: usize,
    /// Global iteration counter at the end of that epoch.
    pub iteration: usize,
}

/// How to treat checkpoint parts that don't match the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Every part the target model has must be present.
    Strict,
    /// Load matching parts; unmatched ones keep their initialized
    /// values and are named in the outcome.
    Lenient,
}

/// What a (lenient) load actually restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    FullyMatched,
    PartiallyMatched { missing: Vec<String> },
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint not found at '{path}'")]
    NotFound { path: PathBuf },

    #[error("checkpoint bundle '{dir}' is missing the '{name}' part")]
    MissingPart { name: String, dir: PathBuf },

    #[error("checkpoint record error: {0}")]
    Record(#[from] RecorderError),

    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed checkpoint metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

// ─── CheckpointManager ────────────────────────────────────────────────────────
/// Owns one variant directory. Callers must treat that directory
/// as exclusively theirs for the duration of a save.
#[derive(Debug)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Manager for the variant directory `root/<variant_id>`.
    /// Fails when the directory cannot be created; deferring that
    /// error would only resurface it as a confusing save failure.
    pub fn for_variant(
        root: impl Into<PathBuf>,
        config: &Configuration,
    ) -> Result<Self, CheckpointError> {
        let dir = root.into().join(config.variant_id());
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one complete training-state bundle and commit it.
    pub fn save<B: Backend, R: Record<B>>(
        &self,
        model: &MtAesthetic<B>,
        optimizer: R,
        progress: Progress,
    ) -> Result<(), CheckpointError> {
        let bundle = self.dir.join(format!("epoch_{}", progress.epoch));
        fs::create_dir_all(&bundle)?;

        let recorder = CheckpointRecorder::new();
        recorder.record(model.backbone.clone().into_record(), bundle.join("backbone"))?;
        recorder.record(model.heads.clone().into_record(), bundle.join("heads"))?;
        if let Some(attention) = &model.attention {
            recorder.record(attention.clone().into_record(), bundle.join("attention"))?;
        }
        recorder.record(optimizer, bundle.join("optimizer"))?;
        fs::write(bundle.join("progress.json"), serde_json::to_string_pretty(&progress)?)?;

        // Commit point: the pointer is replaced atomically, after
        // the whole bundle is on disk.
        let staging = self.dir.join("latest.json.tmp");
        fs::write(&staging, serde_json::to_string(&progress.epoch)?)?;
        fs::rename(&staging, self.dir.join("latest.json"))?;

        tracing::info!(
            "Saved checkpoint for epoch {} (iteration {}) to '{}'",
            progress.epoch,
            progress.iteration,
            bundle.display(),
        );
        Ok(())
    }

    /// Restore model parts and progress counters from the latest
    /// committed bundle.
    pub fn load_model<B: Backend>(
        &self,
        mut model: MtAesthetic<B>,
        device: &B::Device,
        mode: LoadMode,
    ) -> Result<(MtAesthetic<B>, Progress, LoadOutcome), CheckpointError> {
        let bundle = self.latest_bundle()?;
        let mut missing = Vec::new();

        match self.load_part::<B, BackboneRecord<B>>(&bundle, "backbone", device) {
            Ok(record) => model.backbone = model.backbone.load_record(record),
            Err(CheckpointError::MissingPart { name, .. }) if mode == LoadMode::Lenient => {
                missing.push(name)
            }
            Err(error) => return Err(error),
        }

        match self.load_part::<B, TaskHeadsRecord<B>>(&bundle, "heads", device) {
            Ok(record) => model.heads = model.heads.load_record(record),
            Err(CheckpointError::MissingPart { name, .. }) if mode == LoadMode::Lenient => {
                missing.push(name)
            }
            Err(error) => return Err(error),
        }

        // Checkpoints written without attention simply lack this
        // part; extra parts on disk are ignored.
        if let Some(attention) = model.attention.take() {
            match self.load_part::<B, SpatialAttentionRecord<B>>(&bundle, "attention", device) {
                Ok(record) => model.attention = Some(attention.load_record(record)),
                Err(CheckpointError::MissingPart { name, .. }) if mode == LoadMode::Lenient => {
                    model.attention = Some(attention);
                    missing.push(name);
                }
                Err(error) => return Err(error),
            }
        }

        let progress = self.load_progress(&bundle)?;

        let outcome = if missing.is_empty() {
            LoadOutcome::FullyMatched
        } else {
            LoadOutcome::PartiallyMatched { missing }
        };
        tracing::info!(
            "Successfully resumed from checkpoint '{}' ({outcome:?})",
            bundle.display(),
        );
        Ok((model, progress, outcome))
    }

    /// Restore the optimizer state from the latest bundle. Called
    /// with the record type of the optimizer being resumed.
    pub fn load_optimizer<B: Backend, R: Record<B>>(
        &self,
        device: &B::Device,
    ) -> Result<R, CheckpointError> {
        let bundle = self.latest_bundle()?;
        self.load_part(&bundle, "optimizer", device)
    }

    /// Persist the run configuration so inference can rebuild the
    /// exact model variant.
    pub fn save_config(&self, config: &Configuration) -> Result<(), CheckpointError> {
        let path = self.dir.join("config.json");
        fs::write(&path, serde_json::to_string_pretty(config)?)?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<Configuration, CheckpointError> {
        let path = self.dir.join("config.json");
        if !path.exists() {
            return Err(CheckpointError::NotFound { path });
        }
        Ok(serde_json::from_str(&fs::read_to_string(&path)?)?)
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn latest_bundle(&self) -> Result<PathBuf, CheckpointError> {
        let pointer = self.dir.join("latest.json");
        if !pointer.exists() {
            return Err(CheckpointError::NotFound { path: pointer });
        }
        let epoch: usize = serde_json::from_str(&fs::read_to_string(&pointer)?)?;
        let bundle = self.dir.join(format!("epoch_{epoch}"));
        if !bundle.exists() {
            return Err(CheckpointError::NotFound { path: bundle });
        }
        Ok(bundle)
    }

    fn load_part<B: Backend, R: Record<B>>(
        &self,
        bundle: &Path,
        name: &str,
        device: &B::Device,
    ) -> Result<R, CheckpointError> {
        let file = bundle.join(format!("{name}.{PART_EXTENSION}"));
        if !file.exists() {
            return Err(CheckpointError::MissingPart {
                name: name.to_string(),
                dir: bundle.to_path_buf(),
            });
        }
        Ok(CheckpointRecorder::new().load(bundle.join(name), device)?)
    }

    fn load_progress(&self, bundle: &Path) -> Result<Progress, CheckpointError> {
        let path = bundle.join("progress.json");
        if !path.exists() {
            return Err(CheckpointError::MissingPart {
                name: "progress".to_string(),
                dir: bundle.to_path_buf(),
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(&path)?)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::MtAestheticConfig;
    use burn::module::AutodiffModule;
    use burn::optim::{AdamConfig, GradientsParams, Optimizer};
    use tempfile::TempDir;

    type TestAutodiff = burn::backend::Autodiff<burn::backend::NdArray>;

    fn config(use_attention: bool) -> Configuration {
        Configuration {
            channels: 8,
            kernel_size: 3,
            use_attention,
            use_dwa: false,
            ..Configuration::default()
        }
    }

    fn manager(root: &TempDir, cfg: &Configuration) -> CheckpointManager {
        CheckpointManager::for_variant(root.path(), cfg).unwrap()
    }

    fn forward_fingerprint(model: &MtAesthetic<TestAutodiff>) -> Vec<f32> {
        let device = Default::default();
        let input = Tensor::<burn::backend::NdArray, 4>::ones([1, 3, 32, 32], &device);
        // valid() drops autodiff and disables dropout, so the
        // fingerprint is deterministic.
        model.valid().forward(input).score.into_data().to_vec().unwrap()
    }

    #[test]
    fn round_trip_preserves_parameters_and_counters() {
        let root = TempDir::new().unwrap();
        let cfg = config(false);
        let manager = manager(&root, &cfg);
        let device = Default::default();

        let model = MtAestheticConfig::new(8, 3, false).init::<TestAutodiff>(&device);
        let optim = AdamConfig::new().init::<TestAutodiff, MtAesthetic<TestAutodiff>>();
        let before = forward_fingerprint(&model);
        let progress = Progress { epoch: 5, iteration: 1234 };

        manager.save(&model, optim.to_record(), progress).unwrap();

        let fresh = MtAestheticConfig::new(8, 3, false).init::<TestAutodiff>(&device);
        assert_ne!(forward_fingerprint(&fresh), before);

        let (restored, restored_progress, outcome) =
            manager.load_model(fresh, &device, LoadMode::Strict).unwrap();
        assert_eq!(outcome, LoadOutcome::FullyMatched);
        assert_eq!(restored_progress, progress);
        assert_eq!(forward_fingerprint(&restored), before);
    }

    #[test]
    fn missing_checkpoint_is_a_typed_not_found_error() {
        let root = TempDir::new().unwrap();
        let cfg = config(false);
        let manager = manager(&root, &cfg);
        let device = Default::default();

        let model = MtAestheticConfig::new(8, 3, false).init::<TestAutodiff>(&device);
        let error = manager.load_model(model, &device, LoadMode::Strict).unwrap_err();
        match &error {
            CheckpointError::NotFound { path } => {
                assert!(path.to_string_lossy().contains("latest.json"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(error.to_string().contains("not found"));
    }

    #[test]
    fn strict_load_fails_on_a_missing_attention_part() {
        let root = TempDir::new().unwrap();
        let cfg = config(false);
        let manager = manager(&root, &cfg);
        let device = Default::default();

        // Saved without attention...
        let plain = MtAestheticConfig::new(8, 3, false).init::<TestAutodiff>(&device);
        let optim = AdamConfig::new().init::<TestAutodiff, MtAesthetic<TestAutodiff>>();
        manager.save(&plain, optim.to_record(), Progress { epoch: 1, iteration: 10 }).unwrap();

        // ...loaded into an attention model.
        let attentive = MtAestheticConfig::new(8, 3, true).init::<TestAutodiff>(&device);
        let error = manager.load_model(attentive, &device, LoadMode::Strict).unwrap_err();
        match error {
            CheckpointError::MissingPart { name, .. } => assert_eq!(name, "attention"),
            other => panic!("expected MissingPart, got {other:?}"),
        }
    }

    #[test]
    fn lenient_load_names_the_gap_and_keeps_initialized_values() {
        let root = TempDir::new().unwrap();
        let cfg = config(false);
        let manager = manager(&root, &cfg);
        let device = Default::default();

        let plain = MtAestheticConfig::new(8, 3, false).init::<TestAutodiff>(&device);
        let optim = AdamConfig::new().init::<TestAutodiff, MtAesthetic<TestAutodiff>>();
        manager.save(&plain, optim.to_record(), Progress { epoch: 2, iteration: 20 }).unwrap();

        let attentive = MtAestheticConfig::new(8, 3, true).init::<TestAutodiff>(&device);
        let (restored, progress, outcome) =
            manager.load_model(attentive, &device, LoadMode::Lenient).unwrap();

        assert_eq!(outcome, LoadOutcome::PartiallyMatched { missing: vec!["attention".into()] });
        assert_eq!(progress, Progress { epoch: 2, iteration: 20 });
        // The attention block survives with its initialized values.
        assert!(restored.attention.is_some());
    }

    #[test]
    fn extra_parts_on_disk_are_ignored() {
        let root = TempDir::new().unwrap();
        let cfg = config(true);
        let manager = manager(&root, &cfg);
        let device = Default::default();

        let attentive = MtAestheticConfig::new(8, 3, true).init::<TestAutodiff>(&device);
        let optim = AdamConfig::new().init::<TestAutodiff, MtAesthetic<TestAutodiff>>();
        manager.save(&attentive, optim.to_record(), Progress { epoch: 3, iteration: 30 }).unwrap();

        // A no-attention model loads strictly: the attention part
        // on disk has no counterpart in the target and is skipped.
        let plain = MtAestheticConfig::new(8, 3, false).init::<TestAutodiff>(&device);
        let (_, _, outcome) = manager.load_model(plain, &device, LoadMode::Strict).unwrap();
        assert_eq!(outcome, LoadOutcome::FullyMatched);
    }

    /// One optimisation step on a constant input.
    fn step_once<O>(optim: &mut O, model: MtAesthetic<TestAutodiff>) -> MtAesthetic<TestAutodiff>
    where
        O: Optimizer<MtAesthetic<TestAutodiff>, TestAutodiff>,
    {
        let device = Default::default();
        let input = Tensor::<TestAutodiff, 4>::ones([1, 3, 32, 32], &device);
        let output = model.forward(input);
        let loss = output.binary.sum() + output.score.sum() + output.attribute.sum();
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        optim.step(1e-2, model, grads)
    }

    #[test]
    fn optimizer_state_round_trips() {
        let root = TempDir::new().unwrap();
        let cfg = config(false);
        let manager = manager(&root, &cfg);
        let device = Default::default();

        // Zero dropout so identical steps on identical state yield
        // identical parameters.
        let model_config = MtAestheticConfig::new(8, 3, false).with_dropout(0.0);
        let model = model_config.init::<TestAutodiff>(&device);
        let mut optim = AdamConfig::new().init::<TestAutodiff, MtAesthetic<TestAutodiff>>();

        // One step populates the Adam moment estimates.
        let model = step_once(&mut optim, model);
        manager.save(&model, optim.to_record(), Progress { epoch: 1, iteration: 5 }).unwrap();

        // Restore model and optimizer into fresh instances.
        let fresh = model_config.init::<TestAutodiff>(&device);
        let (restored, _, _) = manager.load_model(fresh, &device, LoadMode::Strict).unwrap();
        let record = manager.load_optimizer(&device).unwrap();
        let mut resumed = AdamConfig::new()
            .init::<TestAutodiff, MtAesthetic<TestAutodiff>>()
            .load_record(record);

        // An identical step on both sides must agree; an optimizer
        // with reset moments would diverge here.
        let stepped = step_once(&mut optim, model);
        let restored_stepped = step_once(&mut resumed, restored);
        assert_eq!(
            forward_fingerprint(&stepped),
            forward_fingerprint(&restored_stepped)
        );
    }

    #[test]
    fn unusable_variant_root_fails_at_construction() {
        let root = TempDir::new().unwrap();
        // A plain file where the root directory should be.
        let occupied = root.path().join("occupied");
        fs::write(&occupied, "x").unwrap();

        let error = CheckpointManager::for_variant(&occupied, &config(false)).unwrap_err();
        assert!(matches!(error, CheckpointError::Io(_)));
    }

    #[test]
    fn variant_directories_do_not_collide() {
        let with_attention = config(true);
        let without = config(false);
        assert_ne!(with_attention.variant_id(), without.variant_id());
        assert_eq!(without.variant_id(), "030");
    }

    #[test]
    fn configuration_round_trips_through_the_variant_dir() {
        let root = TempDir::new().unwrap();
        let cfg = config(false);
        let manager = manager(&root, &cfg);
        manager.save_config(&cfg).unwrap();
        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.channels, cfg.channels);
        assert_eq!(loaded.use_attention, cfg.use_attention);
    }
}
