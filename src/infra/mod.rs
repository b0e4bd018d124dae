// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to any one business
// layer:
//
//   checkpoint.rs — restart-safe persistence of the full
//                   training state (model parts, optimizer
//                   state, progress counters) with the
//                   strict/lenient resume protocol
//
//   metrics.rs    — per-epoch metrics appended to a CSV file
//                   for learning-curve analysis
//
//   logging.rs    — tracing initialization (stderr + dated log
//                   file) and the event sink that bridges
//                   training events to tracing and the CSV log

/// Training state saving and the strict/lenient resume protocol
pub mod checkpoint;

/// Epoch metrics CSV logger
pub mod metrics;

/// Tracing setup and the tracing/CSV training event sink
pub mod logging;
