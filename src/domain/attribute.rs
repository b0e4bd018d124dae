// ============================================================
// Layer 3 — Attribute Schema
// ============================================================
// The fixed, ordered list of compositional attributes the model
// predicts alongside the binary judgment and the 1-10 score.
//
// The variant order below IS the schema: training labels, the
// attribute head's logit vector, and the decoder all index
// attributes by this order. A mismatch anywhere would silently
// corrupt every attribute result, so the order lives in exactly
// one place and everything else goes through `Attribute::ALL`.

use serde::{Deserialize, Serialize};

/// Number of ordinal bins in the 1-10 score histogram.
pub const SCORE_BINS: usize = 10;

/// Number of compositional attributes in the schema.
pub const ATTRIBUTE_COUNT: usize = 11;

/// One compositional attribute of a photograph.
///
/// Declared in schema order — `attr as usize` is its position in
/// every label vector and logit vector in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    BalancingElement,
    Content,
    ColorHarmony,
    DepthOfField,
    Lighting,
    MotionBlur,
    ObjectEmphasis,
    RuleOfThirds,
    VividColor,
    Repetition,
    Symmetry,
}

impl Attribute {
    /// All attributes in schema order.
    pub const ALL: [Attribute; ATTRIBUTE_COUNT] = [
        Attribute::BalancingElement,
        Attribute::Content,
        Attribute::ColorHarmony,
        Attribute::DepthOfField,
        Attribute::Lighting,
        Attribute::MotionBlur,
        Attribute::ObjectEmphasis,
        Attribute::RuleOfThirds,
        Attribute::VividColor,
        Attribute::Repetition,
        Attribute::Symmetry,
    ];

    /// Position of this attribute in label and logit vectors.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Attribute at the given vector position, if in range.
    pub fn from_index(index: usize) -> Option<Attribute> {
        Self::ALL.get(index).copied()
    }

    /// The snake_case name used in manifests and log output.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::BalancingElement => "balancing_element",
            Attribute::Content          => "content",
            Attribute::ColorHarmony     => "color_harmony",
            Attribute::DepthOfField     => "depth_of_field",
            Attribute::Lighting         => "lighting",
            Attribute::MotionBlur       => "motion_blur",
            Attribute::ObjectEmphasis   => "object_emphasis",
            Attribute::RuleOfThirds     => "rule_of_thirds",
            Attribute::VividColor       => "vivid_color",
            Attribute::Repetition       => "repetition",
            Attribute::Symmetry         => "symmetry",
        }
    }

    /// Parse a schema name back into an attribute.
    pub fn from_name(name: &str) -> Option<Attribute> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }
}

// ─── AttributeResult ──────────────────────────────────────────────────────────
/// One boolean per attribute, indexed by the schema.
///
/// Constructed from a positional vector exactly once (in the
/// decoder or the label loader); after that, access is by
/// `Attribute`, never by raw index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeResult([bool; ATTRIBUTE_COUNT]);

impl AttributeResult {
    pub fn new(flags: [bool; ATTRIBUTE_COUNT]) -> Self {
        Self(flags)
    }

    pub fn get(&self, attribute: Attribute) -> bool {
        self.0[attribute.index()]
    }

    /// Iterate (attribute, flag) pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, bool)> + '_ {
        Attribute::ALL.iter().map(move |&a| (a, self.0[a.index()]))
    }

    /// How many attributes are set.
    pub fn count_true(&self) -> usize {
        self.0.iter().filter(|&&f| f).count()
    }
}
