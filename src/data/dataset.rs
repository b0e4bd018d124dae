// ============================================================
// Layer 4 — Aesthetic Dataset
// ============================================================

use burn::data::dataset::Dataset;

use crate::domain::labels::LabelBundle;

/// One fully preprocessed sample: a normalized CHW pixel buffer
/// plus its three-part label bundle.
#[derive(Debug, Clone)]
pub struct AestheticSample {
    /// Planar CHW floats, length `3 * size * size`.
    pub pixels: Vec<f32>,
    /// Side length of the square image.
    pub size: usize,
    /// Ground truth for all three tasks.
    pub labels: LabelBundle,
}

pub struct AestheticDataset {
    samples: Vec<AestheticSample>,
}

impl AestheticDataset {
    pub fn new(samples: Vec<AestheticSample>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<AestheticSample> for AestheticDataset {
    fn get(&self, index: usize) -> Option<AestheticSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
