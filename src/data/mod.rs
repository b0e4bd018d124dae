// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from photo files on disk to GPU-ready tensor
// batches, in this order:
//
//   labels.json + image files
//       │
//       ▼
//   ManifestLoader     → reads labels, decodes images
//       │
//       ▼
//   transform          → RGB, resize to 512, crop 256, normalize
//       │
//       ▼
//   split_three        → deterministic train/val/test partitions
//       │
//       ▼
//   AestheticDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   AestheticBatcher   → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//
// Each module is responsible for exactly one step.

/// Reads the label manifest and decodes image files
pub mod loader;

/// Image preprocessing — resize, crop, normalize
pub mod transform;

/// Implements Burn's Dataset trait for assessment samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Deterministic three-way train/validation/test split
pub mod splitter;
