use std::str::FromStr;
use std::sync::OnceLock;

use chequera_core::Money;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_digit_run, r"\b\d+\b");
re!(re_amount,
    r"(?P<grouped>[-+]?\d{1,3}(?:,\d{3})+(?:\.\d+)?)|(?P<plain>[-+]?\d*[.,]?\d+)");
re!(re_iso_date, r"\b(\d{4})[-/](\d{2})[-/](\d{2})\b");

// ── Field formatting ─────────────────────────────────────────────────────────

/// Account and check numbers: every standalone run of digits, concatenated.
///
/// `"No. 0012 3456-7"` becomes `"001234567"`; digits glued to letters are
/// dropped.
pub fn extract_numbers(text: &str) -> String {
    re_digit_run().find_iter(text).map(|m| m.as_str()).collect()
}

/// The first numeric token of the amount box, or zero when there is none.
///
/// Accepts a comma or a dot as decimal separator (`"150,50"`), and comma
/// thousands groups when followed by nothing or a dot decimal
/// (`"1,234.56"`).
pub fn extract_amount(text: &str) -> Money {
    let Some(caps) = re_amount().captures(text) else {
        return Money::zero();
    };
    let normalized = if let Some(m) = caps.name("grouped") {
        m.as_str().replace(',', "")
    } else if let Some(m) = caps.name("plain") {
        m.as_str().replace(',', ".")
    } else {
        return Money::zero();
    };
    parse_decimal(&normalized).map(Money::from_decimal).unwrap_or_default()
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(s)),
    };
    let body = if body.starts_with('.') { format!("0{body}") } else { body.to_string() };
    Decimal::from_str(&format!("{sign}{body}")).ok()
}

/// Uppercase, transliterate to ASCII (`Ł` → `L`, `Œ` → `OE`) and drop
/// everything that is not `A-Z`, `0-9` or whitespace. Whitespace is kept
/// as-is, not collapsed.
pub fn clean_and_uppercase(text: &str) -> String {
    deunicode::deunicode(text)
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c.is_ascii_whitespace())
        .collect()
}

/// Split the place-and-date box into a date and a cleaned city.
///
/// The first `YYYY-MM-DD` / `YYYY/MM/DD` token becomes the date (`None` when
/// absent or not a real calendar day); every such token is removed and the
/// remainder, cleaned like a name, is the city.
pub fn split_place_and_date(text: &str) -> (Option<NaiveDate>, String) {
    let date = re_iso_date().captures(text).and_then(|c| {
        let y: i32 = c.get(1)?.as_str().parse().ok()?;
        let m: u32 = c.get(2)?.as_str().parse().ok()?;
        let d: u32 = c.get(3)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(y, m, d)
    });
    let remainder = re_iso_date().replace_all(text, "");
    (date, clean_and_uppercase(remainder.trim()))
}
