// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal: a full training run, or one assessment of a photo.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct tensor or file-format handling (Layers 4-6)
//   - Only workflow coordination

// Run configuration shared by both workflows
pub mod config;

// The training workflow
pub mod train_use_case;

// The single-photo assessment workflow
pub mod assess_use_case;
