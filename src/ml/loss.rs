// ============================================================
// Layer 5 — Loss Aggregator (multi-task weighting)
// ============================================================
// The three tasks produce losses with different scales and
// units:
//
//   binary    — binary cross-entropy on one logit
//   score     — cross-entropy against the 10-bin rating histogram
//   attribute — multi-label binary cross-entropy over 11 logits
//
// The aggregator folds them into one scalar for backpropagation.
// With Dynamic Weight Averaging enabled, the weights are
// recomputed once per epoch from each task's relative descending
// rate r_i = L_i(t-1) / L_i(t-2): a task whose loss shrinks
// slower than the others receives relatively more weight, so no
// task's gradient starves. Weights are softmax-normalized to sum
// to 3 (temperature-controlled), which keeps them non-negative
// and bounded.
//
// The aggregator owns only TaskWeights and a two-epoch loss
// history; it never touches model parameters. `recompute` is a
// pure function so the weighting is testable on its own.

use std::collections::VecDeque;

use burn::prelude::*;
use burn::tensor::activation;
use thiserror::Error;

use crate::data::batcher::AestheticBatch;
use crate::domain::task::{TaskLossValues, TaskWeights, WEIGHT_SUM};
use crate::ml::model::MtOutput;

/// Epochs of mean-loss history kept for the descending rate.
const HISTORY: usize = 2;

/// Floor for ratio denominators; a zero epoch-mean loss would
/// otherwise produce an infinite rate.
const RATE_EPS: f64 = 1e-12;

#[derive(Debug, Error)]
pub enum LossError {
    #[error("{task} loss is not finite ({value}) at epoch {epoch}, iteration {iteration}")]
    NonFinite {
        task: &'static str,
        value: f64,
        epoch: usize,
        iteration: usize,
    },
}

/// The three per-task loss tensors for one iteration, still
/// attached to the autodiff graph.
#[derive(Debug, Clone)]
pub struct TaskLosses<B: Backend> {
    pub binary:    Tensor<B, 1>,
    pub score:     Tensor<B, 1>,
    pub attribute: Tensor<B, 1>,
}

/// Compute the three task losses from a forward pass.
pub fn task_losses<B: Backend>(output: &MtOutput<B>, batch: &AestheticBatch<B>) -> TaskLosses<B> {
    TaskLosses {
        binary:    bce_with_logits(output.binary.clone(), batch.binary.clone()),
        score:     soft_cross_entropy(output.score.clone(), batch.score.clone()),
        attribute: bce_with_logits(output.attribute.clone(), batch.attributes.clone()),
    }
}

/// Numerically stable binary cross-entropy on raw logits,
/// averaged over every element.
fn bce_with_logits<B: Backend, const D: usize>(
    logits: Tensor<B, D>,
    targets: Tensor<B, D>,
) -> Tensor<B, 1> {
    let positive = activation::log_sigmoid(logits.clone()) * targets.clone();
    let negative = activation::log_sigmoid(-logits) * (targets.ones_like() - targets);
    -(positive + negative).mean()
}

/// Cross-entropy between a logit row and a target histogram,
/// averaged over the batch. Supports soft targets.
fn soft_cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let log_probs = activation::log_softmax(logits, 1);
    -(targets * log_probs).sum_dim(1).mean()
}

// ─── LossAggregator ───────────────────────────────────────────────────────────
/// Owns the task weights and the bounded loss history behind
/// Dynamic Weight Averaging.
pub struct LossAggregator {
    weights: TaskWeights,
    history: VecDeque<TaskLossValues>,
    use_dwa: bool,
    temperature: f64,
}

impl LossAggregator {
    /// Weights start equal; with DWA enabled they adapt once two
    /// epochs of history exist, otherwise they stay fixed.
    pub fn new(use_dwa: bool, temperature: f64) -> Self {
        Self::with_weights(TaskWeights::default(), use_dwa, temperature)
    }

    /// Start from explicitly configured fixed weights.
    pub fn with_weights(weights: TaskWeights, use_dwa: bool, temperature: f64) -> Self {
        Self { weights, history: VecDeque::with_capacity(HISTORY), use_dwa, temperature }
    }

    pub fn weights(&self) -> TaskWeights {
        self.weights
    }

    /// Combine one iteration's task losses into the scalar used
    /// for backpropagation, rejecting non-finite values before
    /// they can reach the optimizer. Epoch/iteration are carried
    /// into the error for the fatal-failure log.
    pub fn combine<B: Backend>(
        &self,
        losses: &TaskLosses<B>,
        epoch: usize,
        iteration: usize,
    ) -> Result<(Tensor<B, 1>, TaskLossValues), LossError> {
        let values = TaskLossValues {
            binary:    scalar(&losses.binary),
            score:     scalar(&losses.score),
            attribute: scalar(&losses.attribute),
        };
        for (task, value) in [
            ("binary", values.binary),
            ("score", values.score),
            ("attribute", values.attribute),
        ] {
            if !value.is_finite() {
                return Err(LossError::NonFinite { task, value, epoch, iteration });
            }
        }

        let combined = losses.binary.clone() * self.weights.binary
            + losses.score.clone() * self.weights.score
            + losses.attribute.clone() * self.weights.attribute;
        Ok((combined, values))
    }

    /// Record one epoch's mean task losses and, with DWA enabled,
    /// recompute the weights from the last two epochs. Before two
    /// epochs of history exist the weights are left equal.
    pub fn end_epoch(&mut self, epoch_mean: TaskLossValues) {
        if self.history.len() == HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(epoch_mean);

        if self.use_dwa && self.history.len() == HISTORY {
            self.weights = Self::recompute(self.history[1], self.history[0], self.temperature);
        }
    }

    /// Pure DWA step: weights = 3 · softmax(r / T) where
    /// r_i = latest_i / previous_i is task i's descending rate.
    pub fn recompute(
        latest: TaskLossValues,
        previous: TaskLossValues,
        temperature: f64,
    ) -> TaskWeights {
        let rates = [
            latest.binary / previous.binary.max(RATE_EPS),
            latest.score / previous.score.max(RATE_EPS),
            latest.attribute / previous.attribute.max(RATE_EPS),
        ];

        // Softmax with the max subtracted, so large rates cannot overflow.
        let peak = rates.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = rates.iter().map(|r| ((r - peak) / temperature).exp()).collect();
        let total: f64 = exps.iter().sum();

        TaskWeights {
            binary:    WEIGHT_SUM * exps[0] / total,
            score:     WEIGHT_SUM * exps[1] / total,
            attribute: WEIGHT_SUM * exps[2] / total,
        }
    }
}

fn scalar<B: Backend>(loss: &Tensor<B, 1>) -> f64 {
    loss.clone().into_scalar().elem::<f64>()
}
