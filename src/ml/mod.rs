// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn framework specific code lives in this layer and in
// the checkpoint module; the domain and application layers never
// import burn directly.
//
// What's in this layer:
//
//   model.rs   — the shared conv backbone, the optional spatial
//                attention block, and the three task heads
//                producing the raw output bundle
//
//   loss.rs    — per-task losses and the loss aggregator with
//                Dynamic Weight Averaging: the one place where
//                three loss scales become one gradient signal
//
//   trainer.rs — the epoch/iteration loop: forward, combine,
//                backward, optimizer step, validation pass,
//                event emission, checkpoint cadence
//
//   decoder.rs — raw logits → structured assessment result
//                (the only component exercised outside training)
//
//   metrics.rs — host-side accumulators for binary accuracy,
//                score MSE, and the attribute report

/// Shared backbone + three task heads
pub mod model;

/// Per-task losses, combination, and DWA weighting
pub mod loss;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Raw output bundle → AssessResult
pub mod decoder;

/// Per-epoch metric accumulators
pub mod metrics;
