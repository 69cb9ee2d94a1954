use std::fmt;
use std::sync::Arc;

use chequera_core::{Confidence, ConfidenceRow, Row};

use crate::gazetteer::Gazetteer;

/// Cross-field heuristics that override raw OCR confidences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceRule {
    /// Check and account numbers of equal length usually mean one box picked
    /// up the other's line.
    DuplicateNumber,
    /// A payee name with digits in it.
    DigitsInName,
    /// A zero amount.
    ZeroAmount,
    /// Date keeps the raw score; city is verified against the gazetteer, and
    /// any digit in it wins over a gazetteer hit.
    PlaceAndDate,
}

impl ConfidenceRule {
    /// Application order. Later rules see the effect of earlier ones.
    pub const ORDER: [ConfidenceRule; 4] = [
        ConfidenceRule::DuplicateNumber,
        ConfidenceRule::DigitsInName,
        ConfidenceRule::ZeroAmount,
        ConfidenceRule::PlaceAndDate,
    ];
}

impl fmt::Display for ConfidenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceRule::DuplicateNumber => write!(f, "duplicate_number"),
            ConfidenceRule::DigitsInName => write!(f, "digits_in_name"),
            ConfidenceRule::ZeroAmount => write!(f, "zero_amount"),
            ConfidenceRule::PlaceAndDate => write!(f, "place_and_date"),
        }
    }
}

/// Account numbers shorter than this are flagged alongside a same-length
/// check number.
const SHORT_ACCOUNT_NUMBER: std::ops::RangeInclusive<usize> = 1..=9;

pub struct ConfidenceCorrector {
    gazetteer: Arc<Gazetteer>,
}

impl ConfidenceCorrector {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self { gazetteer }
    }

    /// Apply every rule, in [`ConfidenceRule::ORDER`], to the raw scores.
    pub fn correct(&self, row: &Row, raw: ConfidenceRow) -> ConfidenceRow {
        let mut confidence = raw;
        for rule in ConfidenceRule::ORDER {
            if self.apply(rule, row, &mut confidence) {
                tracing::debug!(document = %row.id, %rule, "confidence rule fired");
            }
        }
        confidence
    }

    /// Returns whether the rule changed anything.
    fn apply(&self, rule: ConfidenceRule, row: &Row, conf: &mut ConfidenceRow) -> bool {
        match rule {
            ConfidenceRule::DuplicateNumber => {
                let account_len = row.account_number.chars().count();
                if row.check_number.chars().count() != account_len {
                    return false;
                }
                conf.check_number = Confidence::FLAGGED;
                if SHORT_ACCOUNT_NUMBER.contains(&account_len) {
                    conf.account_number = Confidence::FLAGGED;
                }
                true
            }
            ConfidenceRule::DigitsInName => {
                if !contains_digit(&row.client_name) {
                    return false;
                }
                conf.client_name = Confidence::FLAGGED;
                true
            }
            ConfidenceRule::ZeroAmount => {
                if !row.amount.is_zero() {
                    return false;
                }
                conf.amount = Confidence::FLAGGED;
                true
            }
            ConfidenceRule::PlaceAndDate => {
                let before = conf.city;
                if self.gazetteer.contains_all_words(&row.city) {
                    conf.city = Confidence::VERIFIED;
                }
                if contains_digit(&row.city) {
                    conf.city = Confidence::FLAGGED;
                }
                conf.city != before
            }
        }
    }
}

pub fn contains_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}
