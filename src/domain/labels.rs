// ============================================================
// Layer 3 — Label Bundle
// ============================================================
// The three-part ground truth paired 1:1 with every photograph:
//   binary     — "is this aesthetically pleasing" (0/1)
//   score      — a histogram over the 10 ordinal rating bins
//   attributes — one flag per schema attribute
//
// Invariant: all three parts describe the same underlying sample.
// The bundle is built in one place (the manifest loader) and is
// immutable afterwards.

use anyhow::{ensure, Result};

use crate::domain::attribute::{ATTRIBUTE_COUNT, SCORE_BINS};

/// Ground truth for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBundle {
    /// Binary aesthetic judgment.
    pub binary: bool,

    /// Distribution over the rating bins 1..=10. Sums to 1 for a
    /// one-hot rating; soft histograms are allowed.
    pub score: [f32; SCORE_BINS],

    /// Attribute flags in schema order.
    pub attributes: [bool; ATTRIBUTE_COUNT],
}

impl LabelBundle {
    /// Build a bundle from a single integer rating in 1..=10,
    /// placed as a one-hot histogram.
    pub fn from_rating(
        binary: bool,
        rating: u8,
        attributes: [bool; ATTRIBUTE_COUNT],
    ) -> Result<Self> {
        ensure!(
            (1..=SCORE_BINS as u8).contains(&rating),
            "score rating must be in 1..=10, got {rating}"
        );
        let mut score = [0.0f32; SCORE_BINS];
        score[(rating - 1) as usize] = 1.0;
        Ok(Self { binary, score, attributes })
    }

    /// The expected rating under the label histogram, in [1, 10].
    pub fn expected_score(&self) -> f64 {
        self.score
            .iter()
            .enumerate()
            .map(|(k, &p)| (k + 1) as f64 * p as f64)
            .sum()
    }
}
