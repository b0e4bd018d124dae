// ============================================================
// Layer 5 — Training Engine
// ============================================================
// Full train + validation loop over the multi-task model, using
// Burn's DataLoader and an injected optimiser.
//
// Key Burn insight:
//   - Training runs on an AutodiffBackend for gradients
//   - model.valid() returns the model on the inner backend with
//     dropout disabled, so validation is deterministic
//   - The validation batcher must also use the inner backend
//
// The engine performs no I/O of its own: observations go through
// the TrainEventSink, persistence through the CheckpointManager.
// A non-finite task loss aborts the run before the optimiser can
// absorb it.

use anyhow::{anyhow, ensure, Context, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::config::{Configuration, OptimizerKind};
use crate::data::{batcher::AestheticBatcher, dataset::AestheticDataset};
use crate::domain::events::{EpochMetricsEvent, Phase, ProgressEvent};
use crate::domain::task::TaskLossValues;
use crate::domain::traits::TrainEventSink;
use crate::infra::checkpoint::{CheckpointError, CheckpointManager, LoadMode, Progress};
use crate::ml::loss::{task_losses, LossAggregator, TaskLosses};
use crate::ml::metrics::{AttributeReportBuilder, BinaryAccuracy, ScoreMse};
use crate::ml::model::{MtAesthetic, MtAestheticConfig};

/// Train the model described by `cfg`, optionally resuming from
/// the latest checkpoint, and save one bundle per epoch.
pub fn run_training<B: AutodiffBackend>(
    cfg:           &Configuration,
    train_dataset: AestheticDataset,
    val_dataset:   AestheticDataset,
    ckpt:          &CheckpointManager,
    sink:          &mut dyn TrainEventSink,
    resume:        Option<LoadMode>,
    device:        &B::Device,
) -> Result<()> {
    let model = MtAestheticConfig::new(cfg.channels, cfg.kernel_size, cfg.use_attention)
        .init::<B>(device);
    tracing::info!(
        "Model ready: {} channels, {}x{} kernels, attention {}",
        cfg.channels,
        cfg.kernel_size,
        cfg.kernel_size,
        if cfg.use_attention { "on" } else { "off" },
    );
    if cfg.use_amp {
        tracing::info!("AMP flag is set; precision is fixed by the backend, flag recorded only");
    }

    match cfg.optimizer {
        OptimizerKind::Adam => {
            let optim = AdamConfig::new().with_epsilon(1e-8).init();
            train_loop(cfg, model, optim, train_dataset, val_dataset, ckpt, sink, resume, device)
        }
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new().init();
            train_loop(cfg, model, optim, train_dataset, val_dataset, ckpt, sink, resume, device)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn train_loop<B, O>(
    cfg:           &Configuration,
    mut model:     MtAesthetic<B>,
    mut optim:     O,
    train_dataset: AestheticDataset,
    val_dataset:   AestheticDataset,
    ckpt:          &CheckpointManager,
    sink:          &mut dyn TrainEventSink,
    resume:        Option<LoadMode>,
    device:        &B::Device,
) -> Result<()>
where
    B: AutodiffBackend,
    O: Optimizer<MtAesthetic<B>, B>,
{
    // ── Resume ────────────────────────────────────────────────────────────────
    // Counters continue from the restored bundle so epochs and
    // the global iteration stay monotone across restarts.
    let mut start_epoch = 1;
    let mut iteration = 0;
    if let Some(mode) = resume {
        let (restored, progress, outcome) = ckpt.load_model(model, device, mode)?;
        model = restored;
        start_epoch = progress.epoch + 1;
        iteration = progress.iteration;
        tracing::info!(
            "Resuming at epoch {} (iteration {}), load outcome: {:?}",
            start_epoch,
            iteration,
            outcome,
        );

        match ckpt.load_optimizer::<B, O::Record>(device) {
            Ok(record) => optim = optim.load_record(record),
            Err(CheckpointError::MissingPart { name, .. }) if mode == LoadMode::Lenient => {
                tracing::warn!("Optimizer part '{name}' missing; state starts fresh");
            }
            Err(error) => return Err(error.into()),
        }
    }

    let mut aggregator = LossAggregator::new(cfg.use_dwa, cfg.dwa_temperature);

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_batcher = AestheticBatcher::<B>::new(device.clone());
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // Validation runs on the inner backend without autodiff.
    let val_batcher = AestheticBatcher::<B::InnerBackend>::new(device.clone());
    let val_loader = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in start_epoch..=cfg.max_epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut value_sum = TaskLossValues::default();
        let mut batches = 0usize;
        let mut accuracy = BinaryAccuracy::default();
        let mut mse = ScoreMse::default();
        let mut report = AttributeReportBuilder::default();

        for batch in train_loader.iter() {
            let output = model.forward(batch.images.clone());
            let losses = task_losses(&output, &batch);

            iteration += 1;
            let (combined, values) = aggregator.combine(&losses, epoch, iteration)?;
            let combined_value: f64 = combined.clone().into_scalar().elem();
            loss_sum += combined_value;
            value_sum = value_sum.add(&values);
            batches += 1;

            accuracy.update(
                &host(output.binary.clone())?,
                &host(batch.binary.clone())?,
                cfg.binary_threshold,
            );
            mse.update(&host(output.score.clone())?, &host(batch.score.clone())?);
            report.update(
                &host(output.attribute.clone())?,
                &host(batch.attributes.clone())?,
                cfg.attribute_threshold,
            );

            sink.progress(&ProgressEvent {
                epoch,
                iteration,
                combined_loss: combined_value,
                task_losses: values,
            });

            let grads = combined.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let train_mean = value_sum.scale(batches.max(1) as f64);
        sink.epoch_metrics(&EpochMetricsEvent {
            phase:           Phase::Training,
            epoch,
            iteration,
            loss:            loss_sum / batches.max(1) as f64,
            binary_accuracy: accuracy.value(),
            score_mse:       mse.value(),
            attribute:       report.macro_average(),
            weights:         aggregator.weights(),
        });

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let mut val_loss_sum = 0.0f64;
        let mut val_batches = 0usize;
        let mut val_accuracy = BinaryAccuracy::default();
        let mut val_mse = ScoreMse::default();
        let mut val_report = AttributeReportBuilder::default();

        for batch in val_loader.iter() {
            let output = model_valid.forward(batch.images.clone());
            let losses: TaskLosses<B::InnerBackend> = task_losses(&output, &batch);
            let values = TaskLossValues {
                binary:    losses.binary.into_scalar().elem(),
                score:     losses.score.into_scalar().elem(),
                attribute: losses.attribute.into_scalar().elem(),
            };
            // Validation skips the optimizer, but a non-finite
            // loss is just as fatal: it must not leak into the
            // metrics event and the CSV.
            ensure!(
                values.is_finite(),
                "validation loss is not finite at epoch {epoch} ({values:?})"
            );
            val_loss_sum += aggregator.weights().combine(&values);
            val_batches += 1;

            val_accuracy.update(&host(output.binary)?, &host(batch.binary)?, cfg.binary_threshold);
            val_mse.update(&host(output.score)?, &host(batch.score)?);
            val_report.update(
                &host(output.attribute)?,
                &host(batch.attributes)?,
                cfg.attribute_threshold,
            );
        }

        sink.epoch_metrics(&EpochMetricsEvent {
            phase:           Phase::Validation,
            epoch,
            iteration,
            loss:            val_loss_sum / val_batches.max(1) as f64,
            binary_accuracy: val_accuracy.value(),
            score_mse:       val_mse.value(),
            attribute:       val_report.macro_average(),
            weights:         aggregator.weights(),
        });

        // Weight update happens after both phases so the emitted
        // metrics reflect the weights actually in force.
        aggregator.end_epoch(train_mean);

        ckpt.save(&model, optim.to_record(), Progress { epoch, iteration })
            .with_context(|| format!("Failed to checkpoint epoch {epoch}"))?;
    }

    tracing::info!("Training complete after epoch {}", cfg.max_epochs);
    Ok(())
}

/// Move a tensor's values to the host for metric accumulation.
fn host<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("tensor transfer failed: {e:?}"))
}
