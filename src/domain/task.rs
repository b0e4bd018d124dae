// ============================================================
// Layer 3 — Task Losses and Task Weights
// ============================================================
// The three training tasks produce losses of different magnitude
// and unit (binary cross-entropy, ordinal histogram loss,
// multi-label loss). These types carry the per-task scalars and
// the weights that fold them into one gradient signal.
//
// TaskWeights are mutated only by the loss aggregator; every
// other component reads them.

/// One scalar loss per task, recomputed every iteration.
/// Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskLossValues {
    pub binary:    f64,
    pub score:     f64,
    pub attribute: f64,
}

impl TaskLossValues {
    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.binary.is_finite() && self.score.is_finite() && self.attribute.is_finite()
    }

    /// Component-wise sum, used to accumulate an epoch mean.
    pub fn add(&self, other: &TaskLossValues) -> TaskLossValues {
        TaskLossValues {
            binary:    self.binary + other.binary,
            score:     self.score + other.score,
            attribute: self.attribute + other.attribute,
        }
    }

    /// Component-wise division by a batch count.
    pub fn scale(&self, divisor: f64) -> TaskLossValues {
        TaskLossValues {
            binary:    self.binary / divisor,
            score:     self.score / divisor,
            attribute: self.attribute / divisor,
        }
    }
}

/// Non-negative combination weights, one per task.
///
/// Normalized so they sum to 3.0 (mean 1.0): with every weight at
/// 1.0 the combined loss is the plain sum, and dynamic weighting
/// redistributes mass between tasks without growing the total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskWeights {
    pub binary:    f64,
    pub score:     f64,
    pub attribute: f64,
}

/// The constant the three weights always sum to.
pub const WEIGHT_SUM: f64 = 3.0;

impl Default for TaskWeights {
    /// Equal weighting — each task gets 1/3 of the total.
    fn default() -> Self {
        Self { binary: 1.0, score: 1.0, attribute: 1.0 }
    }
}

impl TaskWeights {
    pub fn sum(&self) -> f64 {
        self.binary + self.score + self.attribute
    }

    /// Weighted combination of a loss set into one scalar.
    pub fn combine(&self, losses: &TaskLossValues) -> f64 {
        self.binary * losses.binary + self.score * losses.score + self.attribute * losses.attribute
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_equal_and_sum_to_constant() {
        let w = TaskWeights::default();
        assert_eq!(w.sum(), WEIGHT_SUM);
        assert_eq!(w.binary, w.score);
        assert_eq!(w.score, w.attribute);
    }

    #[test]
    fn combine_is_the_weighted_sum() {
        let w = TaskWeights { binary: 1.5, score: 0.5, attribute: 1.0 };
        let l = TaskLossValues { binary: 0.2, score: 2.0, attribute: 0.4 };
        assert!((w.combine(&l) - (1.5 * 0.2 + 0.5 * 2.0 + 1.0 * 0.4)).abs() < 1e-12);
    }

    #[test]
    fn finiteness_check_catches_each_component() {
        let ok = TaskLossValues { binary: 0.1, score: 0.2, attribute: 0.3 };
        assert!(ok.is_finite());
        let nan = TaskLossValues { score: f64::NAN, ..ok };
        assert!(!nan.is_finite());
        let inf = TaskLossValues { attribute: f64::INFINITY, ..ok };
        assert!(!inf.is_finite());
    }

    #[test]
    fn epoch_mean_accumulation() {
        let a = TaskLossValues { binary: 1.0, score: 2.0, attribute: 3.0 };
        let b = TaskLossValues { binary: 3.0, score: 2.0, attribute: 1.0 };
        let mean = a.add(&b).scale(2.0);
        assert_eq!(mean, TaskLossValues { binary: 2.0, score: 2.0, attribute: 2.0 });
    }
}
