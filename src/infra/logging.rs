// ============================================================
// Layer 6 — Logging Setup and Event Sink
// ============================================================
// Two concerns live here:
//
//   init_logging     — one-time tracing initialization: stderr
//                      output plus a dated log file
//                      (outputs/logs/YYYY-MM-DD.log)
//   TracingEventSink — the TrainEventSink implementation that
//                      turns training events into tracing lines
//                      and CSV metrics rows
//
// The training engine only ever sees the sink trait; swapping
// this implementation for a silent one is what keeps unit tests
// log-free.

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::events::{EpochMetricsEvent, ProgressEvent};
use crate::domain::traits::TrainEventSink;
use crate::infra::metrics::MetricsLogger;

/// Initialize tracing once, writing to stderr and to a dated log
/// file under `log_dir`. The returned guard must be kept alive
/// for the life of the process or buffered lines are lost.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_name = format!("{}.log", chrono::Local::now().date_naive());
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, file_name));

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mt_aesthetic=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(guard)
}

// ─── TracingEventSink ─────────────────────────────────────────────────────────
/// Bridges training events to tracing and the metrics CSV.
pub struct TracingEventSink {
    metrics: MetricsLogger,
}

impl TracingEventSink {
    pub fn new(metrics: MetricsLogger) -> Self {
        Self { metrics }
    }
}

impl TrainEventSink for TracingEventSink {
    fn progress(&mut self, event: &ProgressEvent) {
        tracing::debug!(
            "[{}/{}] combined loss: {:.6} (binary {:.6}, score {:.6}, attribute {:.6})",
            event.epoch,
            event.iteration,
            event.combined_loss,
            event.task_losses.binary,
            event.task_losses.score,
            event.task_losses.attribute,
        );
    }

    fn epoch_metrics(&mut self, event: &EpochMetricsEvent) {
        tracing::info!("{}, [{}/{}].", event.phase.as_str(), event.epoch, event.iteration);
        tracing::info!(
            "Total loss: {:.6}, binary classification accuracy: {:.4}, scoring MSE: {:.4}, \
             multi-label classification report: precision {:.4}, recall {:.4}, f1 {:.4}.",
            event.loss,
            event.binary_accuracy,
            event.score_mse,
            event.attribute.precision,
            event.attribute.recall,
            event.attribute.f1,
        );

        // A metrics row that cannot be written must not kill training.
        if let Err(error) = self.metrics.log(event) {
            tracing::warn!("Failed to append metrics row: {error:#}");
        }
    }
}
