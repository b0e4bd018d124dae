// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Shuffles samples with a seeded RNG and cuts them into three
// fixed-size partitions. The seed makes the split deterministic:
// a resumed run sees exactly the same train/val/test membership
// as the run that wrote the checkpoint, so validation metrics
// stay comparable across restarts.
//
// Partition sizes are configured counts (e.g. 6000/2000/2000),
// not fractions; a dataset that cannot fill them is a
// configuration defect and fails loudly.

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle `samples` deterministically and split into
/// (train, validation, test) partitions of exactly the given sizes.
pub fn split_three<T>(
    mut samples: Vec<T>,
    counts: [usize; 3],
    seed: u64,
) -> Result<(Vec<T>, Vec<T>, Vec<T>)> {
    let needed = counts[0] + counts[1] + counts[2];
    ensure!(
        samples.len() >= needed,
        "dataset has {} samples but the configured split needs {needed} \
         ({} train / {} validation / {} test)",
        samples.len(),
        counts[0],
        counts[1],
        counts[2],
    );

    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);
    samples.truncate(needed);

    let mut rest = samples.split_off(counts[0]);
    let test = rest.split_off(counts[1]);

    tracing::debug!(
        "Dataset split: {} training, {} validation, {} test (seed {seed})",
        samples.len(),
        rest.len(),
        test.len(),
    );

    Ok((samples, rest, test))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn exact_partition_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val, test) = split_three(items, [60, 20, 20], 42).unwrap();
        assert_eq!(train.len(), 60);
        assert_eq!(val.len(), 20);
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn partitions_are_disjoint() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val, test) = split_three(items, [30, 10, 10], 42).unwrap();
        let all: HashSet<usize> = train
            .iter()
            .chain(val.iter())
            .chain(test.iter())
            .copied()
            .collect();
        assert_eq!(all.len(), 50);
    }

    #[test]
    fn same_seed_same_membership() {
        let a = split_three((0..40).collect::<Vec<_>>(), [20, 10, 10], 7).unwrap();
        let b = split_three((0..40).collect::<Vec<_>>(), [20, 10, 10], 7).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
        assert_eq!(a.2, b.2);
    }

    #[test]
    fn surplus_samples_are_dropped() {
        let items: Vec<usize> = (0..45).collect();
        let (train, val, test) = split_three(items, [20, 10, 10], 1).unwrap();
        assert_eq!(train.len() + val.len() + test.len(), 40);
    }

    #[test]
    fn undersized_dataset_is_an_error() {
        let items: Vec<usize> = (0..10).collect();
        let err = split_three(items, [20, 10, 10], 1).unwrap_err();
        assert!(err.to_string().contains("needs 40"));
    }
}
