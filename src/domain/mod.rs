// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types that define the core concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - NO ML-specific code
//
// Everything downstream — labels, model logits, decoded results —
// agrees on sample meaning through these types. In particular the
// attribute schema ordering is enforced here at the type level
// rather than by positional convention.

// The fixed, ordered attribute schema and per-attribute results
pub mod attribute;

// The three-part ground-truth label attached to every sample
pub mod labels;

// The structured result of assessing one photograph
pub mod assessment;

// Per-task loss values and the weights that combine them
pub mod task;

// Progress and metrics events emitted by the training engine
pub mod events;

// Sink traits implemented by the presentation and logging layers
pub mod traits;
