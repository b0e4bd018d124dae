// ============================================================
// Layer 3 — Training Events
// ============================================================
// The training engine performs no I/O of its own. Everything an
// observer may want to know is packaged into these two event
// shapes and pushed through an injected sink after every
// iteration (progress) and every epoch (metrics).

use crate::domain::task::{TaskLossValues, TaskWeights};

/// Whether an epoch's metrics were measured with or without
/// gradient updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Training,
    Validation,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Training   => "training",
            Phase::Validation => "validation",
        }
    }
}

/// Emitted after every training iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Global iteration counter, monotone across epochs and resumes.
    pub iteration: usize,
    /// Weighted combination of the three task losses.
    pub combined_loss: f64,
    /// The unweighted per-task losses behind the combination.
    pub task_losses: TaskLossValues,
}

/// Macro-averaged multi-label classification report for the
/// attribute task.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttributeReport {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

/// Emitted once per epoch per phase.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochMetricsEvent {
    pub phase: Phase,
    pub epoch: usize,
    /// Global iteration counter at the time of emission.
    pub iteration: usize,
    /// Mean combined loss over the epoch.
    pub loss: f64,
    /// Fraction of binary judgments predicted correctly.
    pub binary_accuracy: f64,
    /// Mean squared error between decoded and labelled scores.
    pub score_mse: f64,
    /// Macro-averaged attribute precision / recall / F1.
    pub attribute: AttributeReport,
    /// Task weights in force during this epoch.
    pub weights: TaskWeights,
}
