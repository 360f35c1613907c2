//! Merges a primary and a secondary daily series into one gap-free series.
//!
//! The primary source wins every date both sources cover. The merged set is
//! expanded to every calendar day between its first and last date and each
//! price field is filled independently by piecewise-linear interpolation,
//! extrapolating past the observed range with the slope of the boundary
//! segment. A field observed only once is held constant; a field never
//! observed stays absent.

use crate::core::series::{DateRange, PriceField, PricePoint, TimeSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

pub fn reconcile(primary: &TimeSeries, secondary: &TimeSeries, window: &DateRange) -> TimeSeries {
    let mut merged: BTreeMap<NaiveDate, PricePoint> = BTreeMap::new();
    for point in secondary.points() {
        merged.insert(point.date, *point);
    }
    for point in primary.points() {
        merged.insert(point.date, *point);
    }

    let (Some(first), Some(last)) = (
        merged.keys().next().copied(),
        merged.keys().next_back().copied(),
    ) else {
        return TimeSeries::default();
    };

    debug!(
        primary = primary.len(),
        secondary = secondary.len(),
        merged = merged.len(),
        %first,
        %last,
        "Reconciling daily series"
    );

    let mut points: Vec<PricePoint> = DateRange { start: first, end: last }
        .days()
        .map(|date| {
            merged
                .get(&date)
                .copied()
                .unwrap_or_else(|| PricePoint::empty(date))
        })
        .collect();

    for field in PriceField::ALL {
        fill_field(&mut points, first, field);
    }

    TimeSeries::from_points(points).within(window)
}

/// Reconciles a single source against nothing, filling its calendar gaps.
pub fn fill_gaps(series: &TimeSeries, window: &DateRange) -> TimeSeries {
    reconcile(series, &TimeSeries::default(), window)
}

fn fill_field(points: &mut [PricePoint], origin: NaiveDate, field: PriceField) {
    let known: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| p.get(field).map(|v| (day_offset(origin, p.date), v)))
        .collect();

    match known.len() {
        0 => {}
        1 => {
            let value = known[0].1;
            debug!(%field, value, "Single observation; holding it constant");
            for point in points.iter_mut() {
                point.set(field, Some(value));
            }
        }
        _ => {
            for point in points.iter_mut().filter(|p| p.get(field).is_none()) {
                let x = day_offset(origin, point.date);
                point.set(field, Some(interpolate(&known, x)));
            }
        }
    }
}

fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

/// Linear interpolant through `known` (sorted by x, at least two points),
/// extended past either end with the boundary segment's slope.
fn interpolate(known: &[(f64, f64)], x: f64) -> f64 {
    let idx = known.partition_point(|(kx, _)| *kx < x);
    let upper = idx.clamp(1, known.len() - 1);
    let (x0, y0) = known[upper - 1];
    let (x1, y1) = known[upper];
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn closes(points: &[(u32, f64)]) -> TimeSeries {
        TimeSeries::from_points(
            points
                .iter()
                .map(|(d, c)| PricePoint {
                    close: Some(*c),
                    ..PricePoint::empty(day(*d))
                })
                .collect(),
        )
    }

    fn window(start: u32, end: u32) -> DateRange {
        DateRange::new(day(start), day(end)).unwrap()
    }

    fn close_values(series: &TimeSeries) -> Vec<f64> {
        series.closes().unwrap()
    }

    #[test]
    fn test_primary_fills_from_secondary_on_missing_day() {
        let primary = closes(&[(1, 10.0), (3, 14.0)]);
        let secondary = closes(&[(1, 10.0), (2, 11.0), (3, 14.0)]);

        let merged = reconcile(&primary, &secondary, &window(1, 3));

        assert_eq!(close_values(&merged), vec![10.0, 11.0, 14.0]);
        assert_eq!(merged.first_date(), Some(day(1)));
        assert_eq!(merged.last_date(), Some(day(3)));
    }

    #[test]
    fn test_primary_wins_on_shared_dates() {
        let primary = closes(&[(1, 100.0), (3, 300.0), (5, 500.0)]);
        let secondary = closes(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0), (5, 5.0)]);

        let merged = reconcile(&primary, &secondary, &window(1, 5));

        assert_eq!(merged.get(day(1)).unwrap().close, Some(100.0));
        assert_eq!(merged.get(day(3)).unwrap().close, Some(300.0));
        assert_eq!(merged.get(day(5)).unwrap().close, Some(500.0));
        // dates only the secondary observed keep its values
        assert_eq!(merged.get(day(2)).unwrap().close, Some(2.0));
        assert_eq!(merged.get(day(4)).unwrap().close, Some(4.0));
    }

    #[test]
    fn test_gaps_are_linearly_interpolated() {
        let primary = closes(&[(1, 100.0), (3, 300.0), (5, 500.0)]);
        let secondary = closes(&[(1, 1.0), (3, 3.0), (5, 5.0)]);

        let merged = reconcile(&primary, &secondary, &window(1, 5));

        assert_eq!(
            close_values(&merged),
            vec![100.0, 200.0, 300.0, 400.0, 500.0]
        );
        assert!(merged.is_continuous());
    }

    #[test]
    fn test_uneven_gap_interpolation() {
        let merged = fill_gaps(&closes(&[(1, 10.0), (5, 18.0)]), &window(1, 5));
        assert_eq!(close_values(&merged), vec![10.0, 12.0, 14.0, 16.0, 18.0]);
    }

    #[test]
    fn test_gap_free_series_is_unchanged_except_window() {
        let series = closes(&[(1, 5.0), (2, 7.0), (3, 6.0), (4, 9.0), (5, 8.0)]);

        let full = fill_gaps(&series, &window(1, 5));
        assert_eq!(full, series);

        let windowed = fill_gaps(&series, &window(2, 4));
        assert_eq!(close_values(&windowed), vec![7.0, 6.0, 9.0]);
    }

    #[test]
    fn test_edge_values_are_extrapolated_per_field() {
        // high is missing on both edges while close spans the full range
        let points = vec![
            PricePoint {
                close: Some(10.0),
                ..PricePoint::empty(day(1))
            },
            PricePoint {
                high: Some(22.0),
                close: Some(11.0),
                ..PricePoint::empty(day(2))
            },
            PricePoint {
                high: Some(24.0),
                close: Some(12.0),
                ..PricePoint::empty(day(3))
            },
            PricePoint {
                close: Some(13.0),
                ..PricePoint::empty(day(4))
            },
        ];

        let merged = fill_gaps(&TimeSeries::from_points(points), &window(1, 4));
        let highs: Vec<_> = merged.column(PriceField::High);
        assert_eq!(highs, vec![Some(20.0), Some(22.0), Some(24.0), Some(26.0)]);
    }

    #[test]
    fn test_single_observation_is_held_constant() {
        let points = vec![
            PricePoint {
                open: Some(7.0),
                close: Some(1.0),
                ..PricePoint::empty(day(1))
            },
            PricePoint {
                close: Some(3.0),
                ..PricePoint::empty(day(3))
            },
        ];

        let merged = fill_gaps(&TimeSeries::from_points(points), &window(1, 3));
        assert_eq!(
            merged.column(PriceField::Open),
            vec![Some(7.0), Some(7.0), Some(7.0)]
        );
        // never-observed fields stay absent
        assert_eq!(merged.column(PriceField::Low), vec![None, None, None]);
    }

    #[test]
    fn test_window_outside_data_is_empty() {
        let merged = fill_gaps(&closes(&[(1, 1.0), (2, 2.0)]), &window(10, 12));
        assert!(merged.is_empty());
        assert!(reconcile(&TimeSeries::default(), &TimeSeries::default(), &window(1, 2)).is_empty());
    }
}
