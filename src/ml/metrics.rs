// ============================================================
// Layer 5 — Metric Accumulators
// ============================================================
// Host-side accumulators fed once per batch from the forward
// pass outputs and labels, then drained into one epoch metrics
// event:
//
//   BinaryAccuracy  — fraction of binary judgments predicted
//                     correctly (logit vs the configured
//                     decision threshold)
//   ScoreMse        — mean squared error between the
//                     expectation-decoded score and the label
//                     histogram's expected score
//   AttributeReportBuilder
//                   — per-attribute TP/FP/FN counts reduced to a
//                     macro-averaged precision/recall/F1 report
//
// All three work on plain f32 slices so they are testable
// without a backend.

use crate::domain::attribute::{ATTRIBUTE_COUNT, SCORE_BINS};
use crate::domain::events::AttributeReport;
use crate::ml::decoder::expected_score;

// ─── BinaryAccuracy ───────────────────────────────────────────────────────────
#[derive(Debug, Default)]
pub struct BinaryAccuracy {
    correct: usize,
    total: usize,
}

impl BinaryAccuracy {
    /// `logits` and `labels` are one value per sample; a label is
    /// positive when > 0.5. `threshold` is the same decision
    /// boundary the decoder uses, so the reported accuracy
    /// reflects deployed decisions.
    pub fn update(&mut self, logits: &[f32], labels: &[f32], threshold: f64) {
        for (&logit, &label) in logits.iter().zip(labels) {
            let predicted = logit as f64 > threshold;
            let actual = label > 0.5;
            if predicted == actual {
                self.correct += 1;
            }
            self.total += 1;
        }
    }

    pub fn value(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

// ─── ScoreMse ─────────────────────────────────────────────────────────────────
#[derive(Debug, Default)]
pub struct ScoreMse {
    sum_squared: f64,
    total: usize,
}

impl ScoreMse {
    /// `logits` and `histograms` are row-major [batch, SCORE_BINS].
    pub fn update(&mut self, logits: &[f32], histograms: &[f32]) {
        for (logit_row, label_row) in
            logits.chunks_exact(SCORE_BINS).zip(histograms.chunks_exact(SCORE_BINS))
        {
            let logit_row: [f32; SCORE_BINS] = logit_row.try_into().unwrap();
            let predicted = expected_score(&logit_row);
            let actual: f64 = label_row
                .iter()
                .enumerate()
                .map(|(k, &p)| (k + 1) as f64 * p as f64)
                .sum();
            self.sum_squared += (predicted - actual).powi(2);
            self.total += 1;
        }
    }

    pub fn value(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.sum_squared / self.total as f64
    }
}

// ─── AttributeReportBuilder ───────────────────────────────────────────────────
#[derive(Debug, Default)]
pub struct AttributeReportBuilder {
    true_positive:  [usize; ATTRIBUTE_COUNT],
    false_positive: [usize; ATTRIBUTE_COUNT],
    false_negative: [usize; ATTRIBUTE_COUNT],
}

impl AttributeReportBuilder {
    /// `logits` and `labels` are row-major [batch, ATTRIBUTE_COUNT];
    /// `threshold` is the same decision boundary the decoder uses.
    pub fn update(&mut self, logits: &[f32], labels: &[f32], threshold: f64) {
        for (logit_row, label_row) in logits
            .chunks_exact(ATTRIBUTE_COUNT)
            .zip(labels.chunks_exact(ATTRIBUTE_COUNT))
        {
            for index in 0..ATTRIBUTE_COUNT {
                let predicted = logit_row[index] as f64 > threshold;
                let actual = label_row[index] > 0.5;
                match (predicted, actual) {
                    (true, true)   => self.true_positive[index] += 1,
                    (true, false)  => self.false_positive[index] += 1,
                    (false, true)  => self.false_negative[index] += 1,
                    (false, false) => {}
                }
            }
        }
    }

    /// Macro average: per-attribute precision/recall/F1, averaged
    /// with equal weight per attribute. Attributes never seen as
    /// positive (no TP, FP, or FN) contribute zeros.
    pub fn macro_average(&self) -> AttributeReport {
        let mut precision_sum = 0.0;
        let mut recall_sum = 0.0;
        let mut f1_sum = 0.0;

        for index in 0..ATTRIBUTE_COUNT {
            let tp = self.true_positive[index] as f64;
            let fp = self.false_positive[index] as f64;
            let fn_ = self.false_negative[index] as f64;

            let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
            let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            precision_sum += precision;
            recall_sum += recall;
            f1_sum += f1;
        }

        let n = ATTRIBUTE_COUNT as f64;
        AttributeReport {
            precision: precision_sum / n,
            recall:    recall_sum / n,
            f1:        f1_sum / n,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_accuracy_counts_threshold_agreement() {
        let mut acc = BinaryAccuracy::default();
        acc.update(&[2.0, -1.0, 0.5, -0.1], &[1.0, 0.0, 0.0, 1.0], 0.0);
        // First two agree, last two disagree.
        assert_eq!(acc.value(), 0.5);
    }

    #[test]
    fn binary_accuracy_uses_the_decoder_threshold() {
        // A 0.1 logit is positive under a sign test but negative
        // under the calibrated 0.2 boundary.
        let mut at_zero = BinaryAccuracy::default();
        at_zero.update(&[0.1], &[1.0], 0.0);
        assert_eq!(at_zero.value(), 1.0);

        let mut calibrated = BinaryAccuracy::default();
        calibrated.update(&[0.1], &[1.0], 0.2);
        assert_eq!(calibrated.value(), 0.0);
    }

    #[test]
    fn empty_accumulators_read_zero() {
        assert_eq!(BinaryAccuracy::default().value(), 0.0);
        assert_eq!(ScoreMse::default().value(), 0.0);
        let report = AttributeReportBuilder::default().macro_average();
        assert_eq!(report.f1, 0.0);
    }

    #[test]
    fn score_mse_of_a_perfect_prediction_is_near_zero() {
        let mut mse = ScoreMse::default();
        // Logits pile all mass on bin 7; the label is one-hot bin 7.
        let mut logits = [0.0f32; SCORE_BINS];
        logits[6] = 50.0;
        let mut label = [0.0f32; SCORE_BINS];
        label[6] = 1.0;
        mse.update(&logits, &label);
        assert!(mse.value() < 1e-6);
    }

    #[test]
    fn score_mse_measures_the_expectation_gap() {
        let mut mse = ScoreMse::default();
        // Uniform logits decode to 5.5; the label says 10.
        let mut label = [0.0f32; SCORE_BINS];
        label[9] = 1.0;
        mse.update(&[0.0; SCORE_BINS], &label);
        assert!((mse.value() - (10.0 - 5.5f64).powi(2)).abs() < 1e-9);
    }

    #[test]
    fn macro_report_averages_per_attribute() {
        let mut builder = AttributeReportBuilder::default();
        // One sample: attribute 0 predicted and true (TP),
        // attribute 1 predicted but false (FP),
        // attribute 2 missed despite being true (FN).
        let mut logits = [0.0f32; ATTRIBUTE_COUNT];
        logits[0] = 1.0;
        logits[1] = 1.0;
        let mut labels = [0.0f32; ATTRIBUTE_COUNT];
        labels[0] = 1.0;
        labels[2] = 1.0;
        builder.update(&logits, &labels, 0.5);

        let report = builder.macro_average();
        // Attribute 0 is perfect (P=R=F1=1); the rest are zero.
        let n = ATTRIBUTE_COUNT as f64;
        assert!((report.precision - 1.0 / n).abs() < 1e-12);
        assert!((report.recall - 1.0 / n).abs() < 1e-12);
        assert!((report.f1 - 1.0 / n).abs() < 1e-12);
    }

    #[test]
    fn report_uses_the_decoder_threshold() {
        let mut builder = AttributeReportBuilder::default();
        let mut logits = [0.0f32; ATTRIBUTE_COUNT];
        logits[0] = 5e-4; // above 4e-4
        logits[1] = 3e-4; // below 4e-4
        let mut labels = [0.0f32; ATTRIBUTE_COUNT];
        labels[0] = 1.0;
        labels[1] = 1.0;
        builder.update(&logits, &labels, 4e-4);

        let report = builder.macro_average();
        // Attribute 0 is a TP, attribute 1 a FN: one perfect
        // attribute out of eleven.
        assert!((report.recall - 1.0 / ATTRIBUTE_COUNT as f64).abs() < 1e-12);
    }
}
