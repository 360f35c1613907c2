//! Turns row-oriented JSON payloads into [`TimeSeries`].

use crate::core::error::{MarketError, Result};
use crate::core::series::{COMPACT_DATE_FORMAT, PriceField, PricePoint, TimeSeries};
use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Where a source keeps its rows and what it calls each column.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    /// JSON pointer to the row array; empty when the payload itself is the array.
    pub rows: &'static str,
    pub date: &'static str,
    pub open: Option<&'static str>,
    pub high: Option<&'static str>,
    pub low: Option<&'static str>,
    pub close: &'static str,
}

impl FieldMap {
    fn column(&self, field: PriceField) -> Option<&'static str> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => Some(self.close),
        }
    }
}

/// Naver daily candles (`/chart/{domestic,foreign}/item/{symbol}/day`).
pub const NAVER_DAILY_BARS: FieldMap = FieldMap {
    rows: "",
    date: "localDateTime",
    open: Some("openPrice"),
    high: Some("highPrice"),
    low: Some("lowPrice"),
    close: "closePrice",
};

/// Naver `pricesByPeriod` for exchange rates, which carry no open.
pub const NAVER_EXCHANGE_RATE: FieldMap = FieldMap {
    rows: "/result/priceInfos",
    date: "localDate",
    open: None,
    high: Some("highPrice"),
    low: Some("lowPrice"),
    close: "closePrice",
};

/// Naver `pricesByPeriod` for futures such as gold.
pub const NAVER_FUTURES: FieldMap = FieldMap {
    rows: "/result/priceInfos",
    date: "localDate",
    open: Some("openPrice"),
    high: Some("highPrice"),
    low: Some("lowPrice"),
    close: "closePrice",
};

pub fn normalize(payload: &Value, fields: &FieldMap) -> Result<TimeSeries> {
    let rows = if fields.rows.is_empty() {
        Some(payload)
    } else {
        payload.pointer(fields.rows)
    }
    .and_then(Value::as_array)
    .ok_or_else(|| {
        MarketError::Schema(format!(
            "row array '{}' not found in payload",
            if fields.rows.is_empty() { "/" } else { fields.rows }
        ))
    })?;

    let points = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let row = row
                .as_object()
                .ok_or_else(|| MarketError::Schema(format!("row {idx} is not an object")))?;
            normalize_row(idx, row, fields)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TimeSeries::from_points(points))
}

fn normalize_row(idx: usize, row: &Map<String, Value>, fields: &FieldMap) -> Result<PricePoint> {
    let date = match required(idx, row, fields.date)? {
        Value::String(s) => parse_date_key(s)?,
        Value::Number(n) => parse_date_key(&n.to_string())?,
        other => {
            return Err(MarketError::Schema(format!(
                "row {idx} has a non-text date: {other}"
            )));
        }
    };

    let mut point = PricePoint::empty(date);
    for field in PriceField::ALL {
        if let Some(name) = fields.column(field) {
            let value = parse_price(required(idx, row, name)?)
                .map_err(|e| MarketError::Schema(format!("row {idx} field '{name}': {e}")))?;
            point.set(field, value);
        }
    }
    Ok(point)
}

fn required<'a>(idx: usize, row: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    row.get(name).ok_or_else(|| {
        MarketError::Schema(format!("row {idx} is missing required field '{name}'"))
    })
}

/// Accepts `YYYYMMDD`, `YYYY-MM-DD` and ISO-8601 date-times.
pub fn parse_date_key(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let parsed = if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        NaiveDate::parse_from_str(value, COMPACT_DATE_FORMAT)
    } else {
        let date_part = value.split('T').next().unwrap_or(value);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
    };
    parsed.map_err(|e| MarketError::Schema(format!("unrecognised date '{value}': {e}")))
}

/// A price cell: JSON number, numeric text with separators, or null/blank for absent.
pub fn parse_price(value: &Value) -> std::result::Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "-" {
                return Ok(None);
            }
            parse_number_text(trimmed)
                .map(Some)
                .ok_or_else(|| format!("'{s}' is not a number"))
        }
        other => Err(format!("unexpected value {other}")),
    }
}

/// Parses vendor number text such as `"1,385.50"`, `"$182.52"`, `"-3.21%"` or `"+1.5"`.
pub fn parse_number_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | '+' | ' '))
        .collect();
    cleaned.parse::<f64>().ok()
}
