use chequera_core::FieldKind;
use chrono::NaiveDate;

/// Hook applied to free-text fields (account name, client name, city) after
/// cleaning and before scoring.
///
/// Implementations may map OCR variants onto canonical spellings; they must not
/// touch numeric fields.
pub trait FieldNormalizer: Send + Sync {
    fn normalize(&self, kind: FieldKind, value: String) -> String;

    /// Correct the date read from the place-and-date box. `raw` is the matched
    /// text before any cleaning; `parsed` is the ISO date found in it, if any.
    fn normalize_date(&self, _raw: &str, parsed: Option<NaiveDate>) -> Option<NaiveDate> {
        parsed
    }
}

/// Leaves values untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl FieldNormalizer for Passthrough {
    fn normalize(&self, _kind: FieldKind, value: String) -> String {
        value
    }
}
