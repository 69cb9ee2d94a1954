use std::collections::HashSet;
use std::sync::OnceLock;

use chequera_core::{BoundingBox, FieldKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::reading_order;
use crate::types::OcrLine;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse templates: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Template registry has no banks")]
    Empty,
    #[error("Bank code must be a non-empty lowercase keyword, got '{0}'")]
    InvalidCode(String),
    #[error("Duplicate bank code: '{0}'")]
    DuplicateCode(String),
    #[error("Bank '{code}' has an invalid {field} box")]
    InvalidBox { code: String, field: FieldKind },
}

/// Expected position of every field on one bank's checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoxes {
    pub account_name: BoundingBox,
    pub account_number: BoundingBox,
    pub amount: BoundingBox,
    pub check_number: BoundingBox,
    pub client_name: BoundingBox,
    pub place_and_date: BoundingBox,
}

impl FieldBoxes {
    pub fn get(&self, kind: FieldKind) -> &BoundingBox {
        match kind {
            FieldKind::AccountName => &self.account_name,
            FieldKind::AccountNumber => &self.account_number,
            FieldKind::Amount => &self.amount,
            FieldKind::CheckNumber => &self.check_number,
            FieldKind::ClientName => &self.client_name,
            FieldKind::PlaceAndDate => &self.place_and_date,
        }
    }
}

fn default_account_name_lines() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTemplate {
    /// Lowercase keyword searched for in the page header.
    pub code: String,
    pub display_name: String,
    /// How many lines the account holder's name may wrap onto.
    #[serde(default = "default_account_name_lines")]
    pub account_name_lines: usize,
    pub boxes: FieldBoxes,
}

impl BankTemplate {
    /// Upper bound on matched lines for `kind`; always at least one.
    pub fn max_matches(&self, kind: FieldKind) -> usize {
        match kind {
            FieldKind::AccountName => self.account_name_lines.max(1),
            FieldKind::AccountNumber
            | FieldKind::Amount
            | FieldKind::CheckNumber
            | FieldKind::ClientName
            | FieldKind::PlaceAndDate => 1,
        }
    }
}

/// How the bank is picked when several keywords appear on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// First hit walking lines in OCR order, then codes in registry order.
    #[default]
    FirstFound,
    /// Hit on the line that comes first in reading order. Independent of the
    /// order in which the OCR service returns lines.
    TopLeftMost,
}

/// Immutable set of bank templates, in detection order.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<BankTemplate>,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(rename = "bank")]
    banks: Vec<BankTemplate>,
}

impl TemplateRegistry {
    pub fn new(templates: Vec<BankTemplate>) -> Result<Self, TemplateError> {
        if templates.is_empty() {
            return Err(TemplateError::Empty);
        }
        let mut seen = HashSet::new();
        for t in &templates {
            let valid_code = !t.code.trim().is_empty() && t.code == t.code.to_lowercase();
            if !valid_code {
                return Err(TemplateError::InvalidCode(t.code.clone()));
            }
            if !seen.insert(t.code.as_str()) {
                return Err(TemplateError::DuplicateCode(t.code.clone()));
            }
            for field in FieldKind::ALL {
                if !is_valid_box(t.boxes.get(field)) {
                    return Err(TemplateError::InvalidBox { code: t.code.clone(), field });
                }
            }
        }
        Ok(Self { templates })
    }

    /// Parse a registry from TOML: one `[[bank]]` table per template.
    pub fn from_toml(toml_content: &str) -> Result<Self, TemplateError> {
        let file: RegistryFile = toml::from_str(toml_content)?;
        Self::new(file.banks)
    }

    /// The templates shipped with the application, built once per process.
    pub fn builtin() -> &'static TemplateRegistry {
        static REGISTRY: OnceLock<TemplateRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| TemplateRegistry { templates: builtin_templates() })
    }

    pub fn templates(&self) -> &[BankTemplate] {
        &self.templates
    }

    pub fn get(&self, code: &str) -> Option<&BankTemplate> {
        self.templates.iter().find(|t| t.code == code)
    }

    pub fn codes(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.code.as_str()).collect()
    }

    /// Template for the bank named on the page, if any.
    ///
    /// `None` means the document should be skipped, not that it failed.
    pub fn detect(&self, lines: &[OcrLine], strategy: DetectionStrategy) -> Option<&BankTemplate> {
        let codes = self.codes();
        let code = match strategy {
            DetectionStrategy::FirstFound => detect_bank(&codes, lines),
            DetectionStrategy::TopLeftMost => detect_bank_top_left(&codes, lines),
        }?;
        self.get(code)
    }
}

fn is_valid_box(b: &BoundingBox) -> bool {
    [b.width, b.height, b.left, b.top].iter().all(|v| v.is_finite() && *v >= 0.0)
        && !b.is_degenerate()
}

/// First code found in a top-left-quadrant line.
///
/// Lines are walked in the order given, and for each line the codes in the
/// order given; the first case-insensitive substring hit wins. The result
/// therefore depends on OCR line order.
pub fn detect_bank<'c>(candidate_codes: &[&'c str], lines: &[OcrLine]) -> Option<&'c str> {
    lines
        .iter()
        .filter(|l| l.bbox.in_top_left_quadrant())
        .find_map(|l| first_code_in(candidate_codes, &l.text))
}

/// Like [`detect_bank`], but the hit on the line earliest in reading order
/// wins. Lines at the same position fall back to code order, so the result
/// never depends on OCR line order.
pub fn detect_bank_top_left<'c>(candidate_codes: &[&'c str], lines: &[OcrLine]) -> Option<&'c str> {
    lines
        .iter()
        .filter(|l| l.bbox.in_top_left_quadrant())
        .filter_map(|l| first_code_index(candidate_codes, &l.text).map(|idx| (l, idx)))
        .min_by(|(a, ai), (b, bi)| reading_order(&a.bbox, &b.bbox).then(ai.cmp(bi)))
        .map(|(_, idx)| candidate_codes[idx])
}

fn first_code_in<'c>(candidate_codes: &[&'c str], text: &str) -> Option<&'c str> {
    first_code_index(candidate_codes, text).map(|idx| candidate_codes[idx])
}

fn first_code_index(candidate_codes: &[&str], text: &str) -> Option<usize> {
    let text = text.to_lowercase();
    candidate_codes
        .iter()
        .position(|code| !code.is_empty() && text.contains(&code.to_lowercase()))
}

// ── Built-in templates ───────────────────────────────────────────────────────

/// `(width, height, left, top)` per field, in [`FieldKind::ALL`] order.
type BoxRow = [(f32, f32, f32, f32); 6];

const BUILTIN: &[(&str, &str, usize, BoxRow)] = &[
    (
        "produbanco",
        "PRODUBANCO",
        2,
        [
            (0.5, 0.12, 0.04, 0.6),
            (0.25, 0.05, 0.8, 0.08),
            (0.25, 0.06, 0.75, 0.25),
            (0.15, 0.08, 0.8, 0.11),
            (0.55, 0.1, 0.18, 0.2),
            (0.45, 0.06, 0.04, 0.45),
        ],
    ),
    (
        "austro",
        "BANCO DEL AUSTRO",
        1,
        [
            (0.5, 0.05, 0.05, 0.65),
            (0.20, 0.05, 0.8, 0.00),
            (0.30, 0.10, 0.70, 0.2),
            (0.25, 0.15, 0.75, 0.10),
            (0.55, 0.10, 0.15, 0.2),
            (0.45, 0.05, 0.00, 0.5),
        ],
    ),
    (
        "banecuador",
        "BANECUADOR",
        2,
        [
            (0.5, 0.12, 0.04, 0.6),
            (0.25, 0.1, 0.75, 0.05),
            (0.2, 0.1, 0.8, 0.2),
            (0.25, 0.1, 0.75, 0.15),
            (0.55, 0.1, 0.18, 0.2),
            (0.5, 0.1, 0.00, 0.5),
        ],
    ),
    (
        "guayaquil",
        "BANCO GUAYAQUIL",
        1,
        [
            (0.4, 0.05, 0.05, 0.70),
            (0.2, 0.05, 0.06, 0.65),
            (0.25, 0.1, 0.75, 0.20),
            (0.25, 0.1, 0.75, 0.10),
            (0.55, 0.1, 0.18, 0.2),
            (0.45, 0.1, 0.04, 0.5),
        ],
    ),
    (
        "internacional",
        "BANCO INTERNACIONAL",
        2,
        [
            (0.4, 0.2, 0.05, 0.65),
            (0.2, 0.05, 0.78, 0.05),
            (0.35, 0.15, 0.65, 0.20),
            (0.2, 0.1, 0.78, 0.1),
            (0.50, 0.15, 0.18, 0.15),
            (0.5, 0.1, 0.05, 0.5),
        ],
    ),
    (
        "pichincha",
        "BANCO PICHINCHA",
        2,
        [
            (0.5, 0.12, 0.04, 0.6),
            (0.25, 0.05, 0.75, 0.1),
            (0.25, 0.10, 0.75, 0.2),
            (0.25, 0.1, 0.75, 0.15),
            (0.55, 0.1, 0.18, 0.2),
            (0.45, 0.1, 0.1, 0.5),
        ],
    ),
];

fn builtin_templates() -> Vec<BankTemplate> {
    BUILTIN
        .iter()
        .map(|(code, display_name, account_name_lines, rows)| {
            let b = |i: usize| {
                let (w, h, l, t) = rows[i];
                BoundingBox::new(w, h, l, t)
            };
            BankTemplate {
                code: code.to_string(),
                display_name: display_name.to_string(),
                account_name_lines: *account_name_lines,
                boxes: FieldBoxes {
                    account_name: b(0),
                    account_number: b(1),
                    amount: b(2),
                    check_number: b(3),
                    client_name: b(4),
                    place_and_date: b(5),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(text: &str, left: f32, top: f32) -> OcrLine {
        OcrLine::new(text, 99.0, BoundingBox::new(0.3, 0.05, left, top))
    }

    #[test]
    fn builtin_registry_is_valid() {
        let builtin = TemplateRegistry::builtin();
        let rebuilt = TemplateRegistry::new(builtin.templates().to_vec()).unwrap();
        assert_eq!(rebuilt.codes(), builtin.codes());
        assert_eq!(
            builtin.codes(),
            vec!["produbanco", "austro", "banecuador", "guayaquil", "internacional", "pichincha"]
        );
    }

    #[test]
    fn account_name_lines_per_bank() {
        let r = TemplateRegistry::builtin();
        assert_eq!(r.get("pichincha").unwrap().max_matches(FieldKind::AccountName), 2);
        assert_eq!(r.get("austro").unwrap().max_matches(FieldKind::AccountName), 1);
        assert_eq!(r.get("guayaquil").unwrap().max_matches(FieldKind::AccountName), 1);
        assert_eq!(r.get("pichincha").unwrap().max_matches(FieldKind::ClientName), 1);
    }

    #[test]
    fn field_boxes_dispatch() {
        let t = TemplateRegistry::builtin().get("produbanco").unwrap();
        assert_eq!(*t.boxes.get(FieldKind::Amount), BoundingBox::new(0.25, 0.06, 0.75, 0.25));
        assert_eq!(t.display_name, "PRODUBANCO");
    }

    #[test]
    fn detects_code_case_insensitively() {
        let lines = vec![header("Banco Pichincha C.A.", 0.05, 0.03)];
        let r = TemplateRegistry::builtin();
        let t = r.detect(&lines, DetectionStrategy::FirstFound).unwrap();
        assert_eq!(t.code, "pichincha");
    }

    #[test]
    fn ignores_codes_outside_top_left_quadrant() {
        let lines = vec![
            header("PAGUESE A PRODUBANCO", 0.6, 0.05),
            header("BANCO PICHINCHA", 0.05, 0.7),
        ];
        assert_eq!(detect_bank(&TemplateRegistry::builtin().codes(), &lines), None);
    }

    #[test]
    fn none_when_no_code_present() {
        let lines = vec![header("COOPERATIVA JEP", 0.05, 0.05)];
        assert!(TemplateRegistry::builtin().detect(&lines, DetectionStrategy::FirstFound).is_none());
        assert!(TemplateRegistry::builtin().detect(&lines, DetectionStrategy::TopLeftMost).is_none());
        assert!(TemplateRegistry::builtin().detect(&[], DetectionStrategy::FirstFound).is_none());
    }

    #[test]
    fn first_found_follows_line_order() {
        let lines = vec![
            header("BANCO GUAYAQUIL", 0.05, 0.3),
            header("PRODUBANCO", 0.05, 0.02),
        ];
        let codes = TemplateRegistry::builtin().codes();
        assert_eq!(detect_bank(&codes, &lines), Some("guayaquil"));

        let reversed: Vec<OcrLine> = lines.iter().rev().cloned().collect();
        assert_eq!(detect_bank(&codes, &reversed), Some("produbanco"));
    }

    #[test]
    fn first_found_follows_code_order_within_a_line() {
        let lines = vec![header("PICHINCHA / AUSTRO", 0.05, 0.05)];
        assert_eq!(detect_bank(&["austro", "pichincha"], &lines), Some("austro"));
        assert_eq!(detect_bank(&["pichincha", "austro"], &lines), Some("pichincha"));
    }

    #[test]
    fn top_left_most_is_order_independent() {
        let lines = vec![
            header("BANCO GUAYAQUIL", 0.05, 0.3),
            header("PRODUBANCO", 0.05, 0.02),
        ];
        let codes = TemplateRegistry::builtin().codes();
        let reversed: Vec<OcrLine> = lines.iter().rev().cloned().collect();
        assert_eq!(detect_bank_top_left(&codes, &lines), Some("produbanco"));
        assert_eq!(detect_bank_top_left(&codes, &reversed), Some("produbanco"));
    }

    #[test]
    fn top_left_most_breaks_position_ties_by_code_order() {
        let lines = vec![header("AUSTRO", 0.05, 0.05), header("PRODUBANCO", 0.05, 0.05)];
        let codes = ["produbanco", "austro"];
        let reversed: Vec<OcrLine> = lines.iter().rev().cloned().collect();
        assert_eq!(detect_bank_top_left(&codes, &lines), Some("produbanco"));
        assert_eq!(detect_bank_top_left(&codes, &reversed), Some("produbanco"));
    }

    #[test]
    fn from_toml_parses_banks_in_order() {
        let toml = r#"
            [[bank]]
            code = "bolivariano"
            display_name = "BANCO BOLIVARIANO"

            [bank.boxes]
            account_name = { width = 0.5, height = 0.12, left = 0.04, top = 0.6 }
            account_number = { width = 0.25, height = 0.05, left = 0.75, top = 0.1 }
            amount = { width = 0.25, height = 0.1, left = 0.75, top = 0.2 }
            check_number = { width = 0.25, height = 0.1, left = 0.75, top = 0.15 }
            client_name = { width = 0.55, height = 0.1, left = 0.18, top = 0.2 }
            place_and_date = { width = 0.45, height = 0.1, left = 0.1, top = 0.5 }

            [[bank]]
            code = "austro"
            display_name = "BANCO DEL AUSTRO"
            account_name_lines = 1

            [bank.boxes]
            account_name = { width = 0.5, height = 0.05, left = 0.05, top = 0.65 }
            account_number = { width = 0.2, height = 0.05, left = 0.8, top = 0.0 }
            amount = { width = 0.3, height = 0.1, left = 0.7, top = 0.2 }
            check_number = { width = 0.25, height = 0.15, left = 0.75, top = 0.1 }
            client_name = { width = 0.55, height = 0.1, left = 0.15, top = 0.2 }
            place_and_date = { width = 0.45, height = 0.05, left = 0.0, top = 0.5 }
        "#;
        let r = TemplateRegistry::from_toml(toml).unwrap();
        assert_eq!(r.codes(), vec!["bolivariano", "austro"]);
        assert_eq!(r.get("bolivariano").unwrap().account_name_lines, 2);
        assert_eq!(r.get("austro").unwrap().max_matches(FieldKind::AccountName), 1);
    }

    #[test]
    fn rejects_invalid_registries() {
        assert!(matches!(TemplateRegistry::new(vec![]), Err(TemplateError::Empty)));

        let mut t = TemplateRegistry::builtin().get("austro").unwrap().clone();
        let dup = vec![t.clone(), t.clone()];
        assert!(matches!(TemplateRegistry::new(dup), Err(TemplateError::DuplicateCode(_))));

        t.code = "Austro".into();
        assert!(matches!(TemplateRegistry::new(vec![t.clone()]), Err(TemplateError::InvalidCode(_))));

        t.code = "austro".into();
        t.boxes.amount = BoundingBox::default();
        assert!(matches!(
            TemplateRegistry::new(vec![t]),
            Err(TemplateError::InvalidBox { field: FieldKind::Amount, .. })
        ));
    }

    #[test]
    fn from_toml_reports_parse_errors() {
        assert!(matches!(TemplateRegistry::from_toml("bank = 3"), Err(TemplateError::Parse(_))));
    }
}
