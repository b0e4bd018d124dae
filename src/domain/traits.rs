// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two outbound boundaries of the core, expressed as traits
// so the training engine and the decoder never touch I/O:
//
//   TrainEventSink  — receives progress/metrics events from the
//                     training engine (implemented by the tracing
//                     + CSV sink in the infra layer)
//   AssessmentSink  — receives a finished assessment as discrete
//                     signals (implemented by the CLI; a GUI
//                     would implement the same trait)
//
// Injecting these keeps unit tests deterministic and log-free:
// tests plug in a recording sink or `NullEventSink`.

use crate::domain::assessment::AssessResult;
use crate::domain::attribute::Attribute;
use crate::domain::events::{EpochMetricsEvent, ProgressEvent};

// ─── TrainEventSink ───────────────────────────────────────────────────────────
/// Receiver for training engine events. Sinks must not fail the
/// run; internal errors are theirs to swallow and report.
pub trait TrainEventSink {
    /// Called after every training iteration.
    fn progress(&mut self, event: &ProgressEvent);

    /// Called once per epoch per phase (training, then validation).
    fn epoch_metrics(&mut self, event: &EpochMetricsEvent);
}

/// Sink that discards everything. Used by tests.
pub struct NullEventSink;

impl TrainEventSink for NullEventSink {
    fn progress(&mut self, _event: &ProgressEvent) {}
    fn epoch_metrics(&mut self, _event: &EpochMetricsEvent) {}
}

// ─── AssessmentSink ───────────────────────────────────────────────────────────
/// Receiver for one finished assessment, as the 12 discrete
/// outbound signals the presentation layer consumes: the binary
/// judgment, the score, and one flag per schema attribute.
pub trait AssessmentSink {
    fn set_binary(&mut self, value: bool);
    fn set_score(&mut self, value: f64);
    fn set_attribute(&mut self, attribute: Attribute, value: bool);
}

/// Fan one result out to a sink as its discrete signals, in a
/// fixed order: binary, score, then attributes in schema order.
pub fn send_result(sink: &mut dyn AssessmentSink, result: &AssessResult) {
    sink.set_binary(result.binary);
    sink.set_score(result.score);
    for (attribute, value) in result.attribute.iter() {
        sink.set_attribute(attribute, value);
    }
}
