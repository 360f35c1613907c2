//! Annual financial statement summaries keyed by line item and reporting period.

use crate::core::normalize::parse_number_text;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementRow {
    pub item: String,
    /// Vendor text per period, aligned with [`FinancialStatementTable::periods`].
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialStatementTable {
    periods: Vec<String>,
    rows: Vec<StatementRow>,
}

impl FinancialStatementTable {
    pub fn new(periods: Vec<String>) -> Self {
        FinancialStatementTable {
            periods,
            rows: Vec::new(),
        }
    }

    /// Adds a line item. Values are padded or truncated to the period count.
    pub fn push_row(&mut self, item: impl Into<String>, mut values: Vec<Option<String>>) {
        values.resize(self.periods.len(), None);
        let item = item.into();
        self.rows.retain(|r| r.item != item);
        self.rows.push(StatementRow { item, values });
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn rows(&self) -> &[StatementRow] {
        &self.rows
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.item.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, item: &str, period: &str) -> Option<&str> {
        let col = self.periods.iter().position(|p| p == period)?;
        self.rows
            .iter()
            .find(|r| r.item == item)
            .and_then(|r| r.values[col].as_deref())
    }

    /// The value with thousands separators stripped; `None` for blanks such as `"-"`.
    pub fn numeric(&self, item: &str, period: &str) -> Option<f64> {
        self.value(item, period).and_then(parse_number_text)
    }

    /// Periods in the opposite order.
    pub fn reversed(mut self) -> Self {
        self.periods.reverse();
        for row in &mut self.rows {
            row.values.reverse();
        }
        self
    }
}
