use serde::{Deserialize, Serialize};
use std::fmt;

/// The fields located on every check template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    AccountName,
    AccountNumber,
    Amount,
    CheckNumber,
    ClientName,
    PlaceAndDate,
}

impl FieldKind {
    /// Matching order. `CheckNumber` comes after `AccountNumber` because the
    /// duplicate-number rule compares against the account number.
    pub const ALL: [FieldKind; 6] = [
        FieldKind::AccountName,
        FieldKind::AccountNumber,
        FieldKind::Amount,
        FieldKind::CheckNumber,
        FieldKind::ClientName,
        FieldKind::PlaceAndDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::AccountName => "ACCOUNT_NAME",
            FieldKind::AccountNumber => "ACCOUNT_NUMBER",
            FieldKind::Amount => "AMOUNT",
            FieldKind::CheckNumber => "CHECK_NUMBER",
            FieldKind::ClientName => "CLIENT_NAME",
            FieldKind::PlaceAndDate => "PLACE_AND_DATE",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACCOUNT_NAME" => Ok(FieldKind::AccountName),
            "ACCOUNT_NUMBER" => Ok(FieldKind::AccountNumber),
            "AMOUNT" => Ok(FieldKind::Amount),
            "CHECK_NUMBER" => Ok(FieldKind::CheckNumber),
            "CLIENT_NAME" => Ok(FieldKind::ClientName),
            "PLACE_AND_DATE" => Ok(FieldKind::PlaceAndDate),
            other => Err(format!("Unknown field: '{other}'")),
        }
    }
}

/// Ledger columns, in spreadsheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Date,
    Bank,
    City,
    AccountNumber,
    AccountName,
    ClientName,
    CheckNumber,
    Amount,
    Id,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Date,
        Column::Bank,
        Column::City,
        Column::AccountNumber,
        Column::AccountName,
        Column::ClientName,
        Column::CheckNumber,
        Column::Amount,
        Column::Id,
    ];

    /// Columns that carry a confidence score.
    pub const SCORED: [Column; 7] = [
        Column::Date,
        Column::AccountNumber,
        Column::AccountName,
        Column::ClientName,
        Column::CheckNumber,
        Column::Amount,
        Column::City,
    ];

    /// Header used in the ledger spreadsheet.
    pub fn header(self) -> &'static str {
        match self {
            Column::Date => "FECHA",
            Column::Bank => "BANCO",
            Column::City => "CIUDAD",
            Column::AccountNumber => "NUMERO-CUENTA",
            Column::AccountName => "NOMBRE-CUENTA",
            Column::ClientName => "BENEFICIARIO",
            Column::CheckNumber => "CHEQUE",
            Column::Amount => "VALOR",
            Column::Id => "ID",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn field_kind_roundtrip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn field_kind_parse_is_case_insensitive() {
        assert_eq!(FieldKind::from_str("amount").unwrap(), FieldKind::Amount);
        assert!(FieldKind::from_str("SIGNATURE").is_err());
    }

    #[test]
    fn account_number_matched_before_check_number() {
        let pos = |k| FieldKind::ALL.iter().position(|x| *x == k).unwrap();
        assert!(pos(FieldKind::AccountNumber) < pos(FieldKind::CheckNumber));
    }

    #[test]
    fn scored_columns_exclude_bank_and_id() {
        assert!(!Column::SCORED.contains(&Column::Bank));
        assert!(!Column::SCORED.contains(&Column::Id));
        assert_eq!(Column::CheckNumber.to_string(), "CHEQUE");
    }
}
