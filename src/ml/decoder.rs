// ============================================================
// Layer 5 — Inference Decoder
// ============================================================
// Turns one raw output bundle into a structured assessment:
//
//   binary    — logit compared against a tuned threshold. The
//               default is 0.2, not 0.5: the boundary is
//               calibrated to this task's class balance.
//   score     — the 10 score logits are softmaxed into a
//               probability per ordinal bin and reduced to the
//               expectation Σ k·p(k), k = 1..=10, rounded to 3
//               decimals. Expectation, not argmax: the score is a
//               smooth continuous value, not a bin choice.
//   attribute — each logit independently thresholded at 4e-4
//               (the attribute head's output scale is small) and
//               mapped positionally onto the attribute schema.
//
// Pure and deterministic; total over well-formed shapes. A shape
// mismatch is a programmer error upstream and fails fast.

use anyhow::{anyhow, ensure, Result};
use burn::prelude::*;

use crate::domain::assessment::AssessResult;
use crate::domain::attribute::{AttributeResult, ATTRIBUTE_COUNT, SCORE_BINS};
use crate::ml::model::MtOutput;

/// Decision boundaries for the binary and attribute heads.
/// The defaults match the calibration of the reference weights;
/// override them from configuration, not by editing constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeThresholds {
    pub binary: f64,
    pub attribute: f64,
}

impl Default for DecodeThresholds {
    fn default() -> Self {
        Self { binary: 0.2, attribute: 4e-4 }
    }
}

/// Expectation of the rating distribution implied by raw score
/// logits, in [1.0, 10.0], rounded to 3 decimal digits.
pub fn expected_score(logits: &[f32; SCORE_BINS]) -> f64 {
    // Stable softmax: subtract the peak before exponentiating.
    let peak = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - peak).exp()).collect();
    let total: f64 = exps.iter().sum();

    let expectation: f64 = exps
        .iter()
        .enumerate()
        .map(|(k, e)| (k + 1) as f64 * e / total)
        .sum();
    round3(expectation)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Decode one sample's raw logits into an assessment result.
pub fn decode_raw(
    binary_logit: f32,
    score_logits: &[f32; SCORE_BINS],
    attribute_logits: &[f32; ATTRIBUTE_COUNT],
    thresholds: &DecodeThresholds,
) -> AssessResult {
    let binary = binary_logit as f64 > thresholds.binary;
    let score = expected_score(score_logits);

    let mut flags = [false; ATTRIBUTE_COUNT];
    for (index, &logit) in attribute_logits.iter().enumerate() {
        flags[index] = logit as f64 > thresholds.attribute;
    }

    AssessResult { binary, score, attribute: AttributeResult::new(flags) }
}

/// Decode a single-sample output bundle. Fails only on a shape
/// mismatch, which indicates a defect upstream.
pub fn decode<B: Backend>(output: &MtOutput<B>, thresholds: &DecodeThresholds) -> Result<AssessResult> {
    ensure!(
        output.binary.dims() == [1]
            && output.score.dims() == [1, SCORE_BINS]
            && output.attribute.dims() == [1, ATTRIBUTE_COUNT],
        "decode expects a single-sample output bundle, got binary {:?}, score {:?}, attribute {:?}",
        output.binary.dims(),
        output.score.dims(),
        output.attribute.dims(),
    );

    let binary = host_vec(&output.binary.clone().into_data())?[0];
    let score: [f32; SCORE_BINS] = host_vec(&output.score.clone().into_data())?
        .try_into()
        .map_err(|_| anyhow!("score logits have the wrong length"))?;
    let attribute: [f32; ATTRIBUTE_COUNT] = host_vec(&output.attribute.clone().into_data())?
        .try_into()
        .map_err(|_| anyhow!("attribute logits have the wrong length"))?;

    Ok(decode_raw(binary, &score, &attribute, thresholds))
}

fn host_vec(data: &burn::tensor::TensorData) -> Result<Vec<f32>> {
    data.to_vec::<f32>()
        .map_err(|e| anyhow!("cannot read tensor data on the host: {e:?}"))
}
