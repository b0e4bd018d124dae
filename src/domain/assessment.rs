// ============================================================
// Layer 3 — Assessment Result
// ============================================================
// The structured outcome of assessing one photograph. Created
// fresh per inference call by the decoder, then handed to the
// presentation sink; it has no lifetime beyond that.

use serde::Serialize;

use crate::domain::attribute::AttributeResult;

/// One decoded aesthetic assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessResult {
    /// Whether the photograph cleared the binary decision threshold.
    pub binary: bool,

    /// Expected rating over the 10 ordinal bins, in [1.0, 10.0],
    /// rounded to 3 decimal digits.
    pub score: f64,

    /// One decision per schema attribute.
    pub attribute: AttributeResult,
}
