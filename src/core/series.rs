//! Daily price series and the date window they are requested over.

use crate::core::error::{MarketError, Result};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Compact date format used by the Naver endpoints and the public API.
pub const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// Calendar days requested when no start date is given.
pub const DEFAULT_WINDOW_DAYS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl PriceField {
    pub const ALL: [PriceField; 4] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
    ];
}

impl Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PriceField::Open => "open",
                PriceField::High => "high",
                PriceField::Low => "low",
                PriceField::Close => "close",
            }
        )
    }
}

/// One trading (or calendar) day. Fields a source does not publish stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

impl PricePoint {
    pub fn empty(date: NaiveDate) -> Self {
        PricePoint {
            date,
            open: None,
            high: None,
            low: None,
            close: None,
        }
    }

    pub fn ohlc(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        PricePoint {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
        }
    }

    pub fn get(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    pub fn set(&mut self, field: PriceField, value: Option<f64>) {
        match field {
            PriceField::Open => self.open = value,
            PriceField::High => self.high = value,
            PriceField::Low => self.low = value,
            PriceField::Close => self.close = value,
        }
    }
}

/// Points strictly increasing by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    points: Vec<PricePoint>,
}

impl TimeSeries {
    /// Sorts by date and keeps the last occurrence of a duplicated date.
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        // stable, so input order decides which duplicate is "last"
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            if let Some(last) = deduped.last_mut()
                && last.date == point.date
            {
                *last = point;
            } else {
                deduped.push(point);
            }
        }
        TimeSeries { points: deduped }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<PricePoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PricePoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| &self.points[idx])
    }

    pub fn column(&self, field: PriceField) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.get(field)).collect()
    }

    /// Close prices, failing if any point lacks one.
    pub fn closes(&self) -> Result<Vec<f64>> {
        self.points
            .iter()
            .map(|p| {
                p.close.ok_or_else(|| {
                    MarketError::Schema(format!("close price missing on {}", p.date))
                })
            })
            .collect()
    }

    pub fn within(&self, range: &DateRange) -> TimeSeries {
        TimeSeries {
            points: self
                .points
                .iter()
                .filter(|p| range.contains(p.date))
                .copied()
                .collect(),
        }
    }

    pub fn tail(&self, count: usize) -> TimeSeries {
        let skip = self.points.len().saturating_sub(count);
        TimeSeries {
            points: self.points[skip..].to_vec(),
        }
    }

    /// True when every calendar day between the first and last date is present.
    pub fn is_continuous(&self) -> bool {
        self.points
            .windows(2)
            .all(|pair| pair[1].date - pair[0].date == Duration::days(1))
    }
}

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(MarketError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(DateRange { start, end })
    }

    /// Parses `YYYYMMDD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_compact_date(start)?, parse_compact_date(end)?)
    }

    /// `[end - days, end]`, failing if the start falls outside the calendar.
    pub fn ending_on(end: NaiveDate, days: usize) -> Result<Self> {
        let start = i64::try_from(days)
            .ok()
            .and_then(Duration::try_days)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                MarketError::InvalidInput(format!(
                    "window of {days} days before {end} is out of range"
                ))
            })?;
        Self::new(start, end)
    }

    /// Resolves optional `YYYYMMDD` bounds. `end` defaults to today and `start`
    /// to [`DEFAULT_WINDOW_DAYS`] before `end`.
    pub fn from_optional(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let end = match end {
            Some(end) => parse_compact_date(end)?,
            None => Local::now().date_naive(),
        };
        match start {
            Some(start) => Self::new(parse_compact_date(start)?, end),
            None => Self::ending_on(end, DEFAULT_WINDOW_DAYS),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

pub fn parse_compact_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), COMPACT_DATE_FORMAT).map_err(|e| {
        MarketError::InvalidInput(format!("expected YYYYMMDD date, got '{value}': {e}"))
    })
}

pub fn format_compact_date(date: NaiveDate) -> String {
    date.format(COMPACT_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn close_at(d: u32, close: f64) -> PricePoint {
        PricePoint {
            close: Some(close),
            ..PricePoint::empty(day(d))
        }
    }

    #[test]
    fn test_from_points_sorts_and_keeps_last_duplicate() {
        let series = TimeSeries::from_points(vec![
            close_at(3, 30.0),
            close_at(1, 10.0),
            close_at(3, 31.0),
            close_at(2, 20.0),
        ]);

        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(series.get(day(3)).unwrap().close, Some(31.0));
        assert!(series.is_continuous());
    }

    #[test]
    fn test_within_and_tail() {
        let series = TimeSeries::from_points((1..=10).map(|d| close_at(d, d as f64)).collect());
        let range = DateRange::new(day(3), day(5)).unwrap();

        let windowed = series.within(&range);
        assert_eq!(windowed.closes().unwrap(), vec![3.0, 4.0, 5.0]);

        assert_eq!(series.tail(2).closes().unwrap(), vec![9.0, 10.0]);
        assert_eq!(series.tail(50).len(), 10);
    }

    #[test]
    fn test_closes_fails_on_missing_close() {
        let series = TimeSeries::from_points(vec![close_at(1, 1.0), PricePoint::empty(day(2))]);
        let err = series.closes().unwrap_err();
        assert!(err.to_string().contains("close price missing on 2024-01-02"));
    }

    #[test]
    fn test_date_range_parsing() {
        let range = DateRange::parse("20240101", "20240131").unwrap();
        assert_eq!(range.start, day(1));
        assert_eq!(range.end, day(31));
        assert_eq!(range.days().count(), 31);

        assert!(DateRange::parse("20240131", "20240101").is_err());
        assert!(DateRange::parse("2024-01-01", "20240131").is_err());
    }

    #[test]
    fn test_default_range_is_thirty_days() {
        let range = DateRange::from_optional(None, None).unwrap();
        assert_eq!(range.end - range.start, Duration::days(30));
        assert_eq!(range.end, Local::now().date_naive());

        let explicit = DateRange::from_optional(Some("20240105"), Some("20240110")).unwrap();
        assert_eq!(explicit, DateRange::new(day(5), day(10)).unwrap());
    }

    #[test]
    fn test_end_only_range_counts_back_from_end() {
        let range = DateRange::from_optional(None, Some("20240131")).unwrap();
        assert_eq!(range, DateRange::new(day(1), day(31)).unwrap());

        let range = DateRange::from_optional(None, Some("20240110")).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2023, 12, 11).unwrap());

        let err = DateRange::from_optional(Some("20240111"), Some("20240110")).unwrap_err();
        assert!(matches!(err, MarketError::InvalidInput(_)));
    }

    #[test]
    fn test_ending_on_rejects_windows_outside_calendar() {
        assert_eq!(
            DateRange::ending_on(day(31), 10).unwrap(),
            DateRange::new(day(21), day(31)).unwrap()
        );
        assert_eq!(DateRange::ending_on(day(31), 0).unwrap().days().count(), 1);

        for days in [1 << 50, usize::MAX] {
            let err = DateRange::ending_on(day(31), days).unwrap_err();
            assert!(matches!(err, MarketError::InvalidInput(_)));
        }
        assert!(DateRange::ending_on(NaiveDate::MIN, 1).is_err());
    }
}
