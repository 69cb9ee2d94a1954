use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::field::Column;
use crate::money::Money;

/// One ledger row: the formatted values read from a single check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    pub bank: String,
    pub date: Option<NaiveDate>,
    pub city: String,
    pub account_number: String,
    pub account_name: String,
    pub client_name: String,
    pub check_number: String,
    pub amount: Money,
}

impl Row {
    /// Cell text as written to the ledger.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Date => self.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            Column::Bank => self.bank.clone(),
            Column::City => self.city.clone(),
            Column::AccountNumber => self.account_number.clone(),
            Column::AccountName => self.account_name.clone(),
            Column::ClientName => self.client_name.clone(),
            Column::CheckNumber => self.check_number.clone(),
            Column::Amount => self.amount.to_string(),
            Column::Id => self.id.clone(),
        }
    }
}

/// Confidence scores parallel to a [`Row`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRow {
    pub date: Confidence,
    pub city: Confidence,
    pub account_number: Confidence,
    pub account_name: Confidence,
    pub client_name: Confidence,
    pub check_number: Confidence,
    pub amount: Confidence,
}

impl ConfidenceRow {
    /// `None` for the columns that are not scored (bank, id).
    pub fn get(&self, column: Column) -> Option<Confidence> {
        match column {
            Column::Date => Some(self.date),
            Column::City => Some(self.city),
            Column::AccountNumber => Some(self.account_number),
            Column::AccountName => Some(self.account_name),
            Column::ClientName => Some(self.client_name),
            Column::CheckNumber => Some(self.check_number),
            Column::Amount => Some(self.amount),
            Column::Bank | Column::Id => None,
        }
    }

    pub fn flagged_columns(&self) -> Vec<Column> {
        Column::SCORED
            .into_iter()
            .filter(|c| self.get(*c).is_some_and(Confidence::is_flagged))
            .collect()
    }
}

/// Accumulates one document's values and raw confidences.
///
/// Fields never set keep an empty value and a zero confidence.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    row: Row,
    confidence: ConfidenceRow,
}

impl RowBuilder {
    pub fn new(id: impl Into<String>, bank: impl Into<String>) -> Self {
        Self {
            row: Row {
                id: id.into(),
                bank: bank.into(),
                date: None,
                city: String::new(),
                account_number: String::new(),
                account_name: String::new(),
                client_name: String::new(),
                check_number: String::new(),
                amount: Money::zero(),
            },
            confidence: ConfidenceRow::default(),
        }
    }

    pub fn account_name(&mut self, value: String, confidence: Confidence) -> &mut Self {
        self.row.account_name = value;
        self.confidence.account_name = confidence;
        self
    }

    pub fn account_number(&mut self, value: String, confidence: Confidence) -> &mut Self {
        self.row.account_number = value;
        self.confidence.account_number = confidence;
        self
    }

    pub fn client_name(&mut self, value: String, confidence: Confidence) -> &mut Self {
        self.row.client_name = value;
        self.confidence.client_name = confidence;
        self
    }

    pub fn check_number(&mut self, value: String, confidence: Confidence) -> &mut Self {
        self.row.check_number = value;
        self.confidence.check_number = confidence;
        self
    }

    pub fn amount(&mut self, value: Money, confidence: Confidence) -> &mut Self {
        self.row.amount = value;
        self.confidence.amount = confidence;
        self
    }

    /// Date and city share one box, so both start from the same raw score.
    pub fn place_and_date(
        &mut self,
        date: Option<NaiveDate>,
        city: String,
        confidence: Confidence,
    ) -> &mut Self {
        self.row.date = date;
        self.row.city = city;
        self.confidence.date = confidence;
        self.confidence.city = confidence;
        self
    }

    pub fn build(self) -> (Row, ConfidenceRow) {
        (self.row, self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn unset_fields_are_empty_with_zero_confidence() {
        let (row, conf) = RowBuilder::new("doc-1", "BANCO PICHINCHA").build();
        assert_eq!(row.id, "doc-1");
        assert_eq!(row.bank, "BANCO PICHINCHA");
        assert!(row.account_number.is_empty());
        assert!(row.amount.is_zero());
        assert_eq!(conf, ConfidenceRow::default());
        assert_eq!(conf.amount, Confidence::ZERO);
    }

    #[test]
    fn place_and_date_sets_both_columns() {
        let mut b = RowBuilder::new("doc-2", "PRODUBANCO");
        b.place_and_date(NaiveDate::from_ymd_opt(2024, 3, 15), "QUITO".into(), Confidence::ocr(91.0));
        let (row, conf) = b.build();
        assert_eq!(row.cell(Column::Date), "2024-03-15");
        assert_eq!(row.cell(Column::City), "QUITO");
        assert_eq!(conf.date.value(), 91.0);
        assert_eq!(conf.city.value(), 91.0);
    }

    #[test]
    fn cells_and_scores_line_up() {
        let mut b = RowBuilder::new("doc-3", "BANECUADOR");
        b.amount(Money::from_str("25.5").unwrap(), Confidence::ocr(99.0))
            .check_number("000123".into(), Confidence::FLAGGED);
        let (row, conf) = b.build();
        assert_eq!(row.cell(Column::Amount), "25.50");
        assert_eq!(row.cell(Column::CheckNumber), "000123");
        assert_eq!(conf.get(Column::Bank), None);
        assert_eq!(conf.get(Column::CheckNumber), Some(Confidence::FLAGGED));
        assert_eq!(conf.flagged_columns(), vec![Column::CheckNumber]);
    }
}
