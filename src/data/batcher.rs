// ============================================================
// Layer 4 — Aesthetic Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<AestheticSample>
// into the four tensors one training iteration needs:
//
//   images:     [batch, 3, size, size]  — normalized pixels
//   binary:     [batch]                 — 0/1 float labels
//   score:      [batch, 10]             — rating histograms
//   attributes: [batch, 11]             — 0/1 attribute flags
//
// The three label tensors stay positionally aligned with the
// schema because they are built straight from LabelBundle, which
// already enforces the ordering.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::AestheticSample;
use crate::domain::attribute::{ATTRIBUTE_COUNT, SCORE_BINS};

/// A batch of samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct AestheticBatch<B: Backend> {
    /// Pixel tensor — shape: [batch, 3, size, size]
    pub images: Tensor<B, 4>,

    /// Binary labels as floats — shape: [batch]
    pub binary: Tensor<B, 1>,

    /// Score histograms — shape: [batch, SCORE_BINS]
    pub score: Tensor<B, 2>,

    /// Attribute flags as floats — shape: [batch, ATTRIBUTE_COUNT]
    pub attributes: Tensor<B, 2>,
}

/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct AestheticBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> AestheticBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<AestheticSample, AestheticBatch<B>> for AestheticBatcher<B> {
    fn batch(&self, items: Vec<AestheticSample>) -> AestheticBatch<B> {
        // The dataloader never hands out an empty batch; the crop
        // size below comes from the first sample.
        debug_assert!(!items.is_empty(), "batcher received an empty batch");

        let batch_size = items.len();
        // All samples share one crop size within a run.
        let size = items[0].size;

        let image_flat: Vec<f32> = items.iter().flat_map(|s| s.pixels.iter().copied()).collect();

        let binary_flat: Vec<f32> = items
            .iter()
            .map(|s| if s.labels.binary { 1.0 } else { 0.0 })
            .collect();

        let score_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.labels.score.iter().copied())
            .collect();

        let attribute_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.labels.attributes.iter().map(|&f| if f { 1.0 } else { 0.0 }))
            .collect();

        let images = Tensor::<B, 1>::from_floats(image_flat.as_slice(), &self.device)
            .reshape([batch_size, 3, size, size]);

        let binary = Tensor::<B, 1>::from_floats(binary_flat.as_slice(), &self.device);

        let score = Tensor::<B, 1>::from_floats(score_flat.as_slice(), &self.device)
            .reshape([batch_size, SCORE_BINS]);

        let attributes = Tensor::<B, 1>::from_floats(attribute_flat.as_slice(), &self.device)
            .reshape([batch_size, ATTRIBUTE_COUNT]);

        AestheticBatch { images, binary, score, attributes }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::labels::LabelBundle;

    type TestBackend = burn::backend::NdArray;

    fn sample(binary: bool, rating: u8, size: usize) -> AestheticSample {
        AestheticSample {
            pixels: vec![0.5; 3 * size * size],
            size,
            labels: LabelBundle::from_rating(binary, rating, [false; ATTRIBUTE_COUNT]).unwrap(),
        }
    }

    #[test]
    fn shapes_match_the_tensor_contract() {
        let batcher = AestheticBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample(true, 3, 8), sample(false, 9, 8)]);

        assert_eq!(batch.images.dims(), [2, 3, 8, 8]);
        assert_eq!(batch.binary.dims(), [2]);
        assert_eq!(batch.score.dims(), [2, SCORE_BINS]);
        assert_eq!(batch.attributes.dims(), [2, ATTRIBUTE_COUNT]);
    }

    #[test]
    fn labels_stay_aligned_with_their_sample() {
        let batcher = AestheticBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample(true, 3, 4), sample(false, 9, 4)]);

        let binary: Vec<f32> = batch.binary.into_data().to_vec().unwrap();
        assert_eq!(binary, vec![1.0, 0.0]);

        let score: Vec<f32> = batch.score.into_data().to_vec().unwrap();
        // Row 0 is one-hot at bin 3 (index 2), row 1 at bin 9 (index 8).
        assert_eq!(score[2], 1.0);
        assert_eq!(score[SCORE_BINS + 8], 1.0);
        assert_eq!(score.iter().sum::<f32>(), 2.0);
    }

    #[test]
    #[should_panic(expected = "empty batch")]
    fn empty_batch_is_a_contract_violation() {
        let batcher = AestheticBatcher::<TestBackend>::new(Default::default());
        let _ = batcher.batch(vec![]);
    }
}
