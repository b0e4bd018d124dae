// ============================================================
// Layer 2 — Assess Use Case
// ============================================================
// Loads a trained variant from its checkpoint directory and
// assesses one photograph:
//
//   1. Read the saved run configuration       (Layer 6 - infra)
//   2. Rebuild the model and restore weights  (Layer 6 - infra)
//   3. Decode + center-crop the photo         (Layer 4 - data)
//   4. Forward pass + decode the three heads  (Layer 5 - ml)
//
// A missing image file is not an error: it is reported and the
// use case yields no result, so a caller iterating a directory
// of photos keeps going.

use std::path::Path;

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::application::config::Configuration;
use crate::data::transform::{self, CROP_TO};
use crate::domain::assessment::AssessResult;
use crate::infra::checkpoint::{CheckpointManager, LoadMode};
use crate::ml::decoder::{decode, DecodeThresholds};
use crate::ml::model::{MtAesthetic, MtAestheticConfig};

type InferBackend = burn::backend::Wgpu;

pub struct AssessUseCase {
    config:     Configuration,
    model:      MtAesthetic<InferBackend>,
    thresholds: DecodeThresholds,
    device:     <InferBackend as Backend>::Device,
}

impl AssessUseCase {
    /// Restore the variant selected by `config` from its
    /// checkpoint directory. The saved config wins over the
    /// caller's for everything but the variant toggles, so the
    /// rebuilt model always matches the stored weights.
    pub fn new(config: Configuration) -> Result<Self> {
        let ckpt = CheckpointManager::for_variant(config.checkpoint_root(), &config)?;
        let config = ckpt
            .load_config()
            .with_context(|| format!("no trained run found in '{}'", ckpt.dir().display()))?;

        let device = burn::backend::wgpu::WgpuDevice::default();
        let model = MtAestheticConfig::new(config.channels, config.kernel_size, config.use_attention)
            .init::<InferBackend>(&device);
        let (model, progress, _) = ckpt.load_model(model, &device, LoadMode::Strict)?;
        tracing::info!(
            "Loaded variant {} at epoch {} for assessment",
            config.variant_id(),
            progress.epoch,
        );

        let thresholds = DecodeThresholds {
            binary:    config.binary_threshold,
            attribute: config.attribute_threshold,
        };
        Ok(Self { config, model, thresholds, device })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Assess one photo. Returns `None` when the file is absent.
    pub fn assess(&self, image_path: &Path) -> Result<Option<AssessResult>> {
        if !image_path.exists() {
            tracing::warn!("Image '{}' does not exist; nothing to assess", image_path.display());
            return Ok(None);
        }

        let image = image::open(image_path)
            .with_context(|| format!("cannot decode image '{}'", image_path.display()))?;
        let pixels = transform::prepare_eval(&image);

        let side = CROP_TO as usize;
        let input = Tensor::<InferBackend, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([1, 3, side, side]);

        let output = self.model.forward(input);
        let result = decode(&output, &self.thresholds)?;
        Ok(Some(result))
    }
}
