use serde::{Deserialize, Serialize};
use std::fmt;

/// A per-field confidence score.
///
/// Genuine OCR scores live in `[0, 100]`. [`Confidence::FLAGGED`] (`-1`) sits
/// outside that range and marks a value a heuristic considers wrong.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f32);

impl Confidence {
    pub const FLAGGED: Confidence = Confidence(-1.0);
    pub const ZERO: Confidence = Confidence(0.0);
    /// Assigned to a city found in the gazetteer.
    pub const VERIFIED: Confidence = Confidence(99.0);

    /// Wrap a raw OCR score, clamping it into `[0, 100]`.
    pub fn ocr(score: f32) -> Self {
        if score.is_finite() {
            Confidence(score.clamp(0.0, 100.0))
        } else {
            Confidence::ZERO
        }
    }

    /// Rebuild a stored value without clamping, so the sentinel survives a
    /// round trip through persistence.
    pub fn from_stored(value: f32) -> Self {
        Confidence(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn is_flagged(self) -> bool {
        self.0 < 0.0
    }

    pub fn tier(self) -> ConfidenceTier {
        ConfidenceTier::of(self)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_flagged() {
            write!(f, "flagged")
        } else {
            write!(f, "{:.1}", self.0)
        }
    }
}

/// Visual bucket a spreadsheet consumer paints a cell with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    /// `> 98`
    Excellent,
    /// `> 95`
    High,
    /// `> 90`
    Fair,
    /// `> 0`
    Low,
    /// `== 0`, nothing was read.
    Empty,
    /// Negative sentinel.
    Flagged,
}

impl ConfidenceTier {
    pub fn of(confidence: Confidence) -> Self {
        let v = confidence.value();
        if v > 98.0 {
            ConfidenceTier::Excellent
        } else if v > 95.0 {
            ConfidenceTier::High
        } else if v > 90.0 {
            ConfidenceTier::Fair
        } else if v > 0.0 {
            ConfidenceTier::Low
        } else if v == 0.0 {
            ConfidenceTier::Empty
        } else {
            ConfidenceTier::Flagged
        }
    }

    /// Cell fill as an `RRGGBB` hex string.
    pub fn fill_color(self) -> &'static str {
        match self {
            ConfidenceTier::Excellent => "b0ffb1",
            ConfidenceTier::High => "ddffb0",
            ConfidenceTier::Fair => "fffab0",
            ConfidenceTier::Low => "f0bca8",
            ConfidenceTier::Empty => "ffffff",
            ConfidenceTier::Flagged => "e9d7fc",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::Excellent => write!(f, "excellent"),
            ConfidenceTier::High => write!(f, "high"),
            ConfidenceTier::Fair => write!(f, "fair"),
            ConfidenceTier::Low => write!(f, "low"),
            ConfidenceTier::Empty => write!(f, "empty"),
            ConfidenceTier::Flagged => write!(f, "flagged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_score_is_clamped() {
        assert_eq!(Confidence::ocr(140.0).value(), 100.0);
        assert_eq!(Confidence::ocr(-3.0).value(), 0.0);
        assert_eq!(Confidence::ocr(f32::NAN), Confidence::ZERO);
    }

    #[test]
    fn sentinel_is_outside_ocr_range() {
        assert!(Confidence::FLAGGED.is_flagged());
        assert!(!Confidence::ocr(0.0).is_flagged());
        assert!(!Confidence::ocr(-1.0).is_flagged());
    }

    #[test]
    fn stored_sentinel_survives() {
        assert!(Confidence::from_stored(-1.0).is_flagged());
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(Confidence::ocr(99.5).tier(), ConfidenceTier::Excellent);
        assert_eq!(Confidence::ocr(98.0).tier(), ConfidenceTier::High);
        assert_eq!(Confidence::ocr(95.0).tier(), ConfidenceTier::Fair);
        assert_eq!(Confidence::ocr(90.0).tier(), ConfidenceTier::Low);
        assert_eq!(Confidence::ocr(0.1).tier(), ConfidenceTier::Low);
        assert_eq!(Confidence::ZERO.tier(), ConfidenceTier::Empty);
        assert_eq!(Confidence::FLAGGED.tier(), ConfidenceTier::Flagged);
        assert_eq!(Confidence::VERIFIED.tier(), ConfidenceTier::Excellent);
    }

    #[test]
    fn display() {
        assert_eq!(Confidence::ocr(97.24).to_string(), "97.2");
        assert_eq!(Confidence::FLAGGED.to_string(), "flagged");
        assert_eq!(ConfidenceTier::Flagged.fill_color(), "e9d7fc");
    }
}
