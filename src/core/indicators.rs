//! Technical indicators over a close-price column.
//!
//! - Moving average (expanding until the window fills)
//! - RSI with EWM smoothing, center of mass `period - 1`
//! - Bollinger Bands over expanding-window mean and sample deviation

use crate::core::error::{MarketError, Result};
use crate::core::series::TimeSeries;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct RsiParams {
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BollingerParams {
    pub window: usize,
    /// Standard deviation multiplier.
    pub k: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self { window: 20, k: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBand {
    pub middle: f64,
    /// Sample standard deviation; undefined while the window holds one point.
    pub std_dev: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

fn ensure_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(MarketError::InvalidInput(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(())
}

/// Trailing mean with a minimum of one point, so every position is defined.
pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<f64>> {
    ensure_positive("moving average window", window)?;

    let averages = (0..values.len())
        .map(|i| {
            let trailing = &values[(i + 1).saturating_sub(window)..=i];
            trailing.iter().sum::<f64>() / trailing.len() as f64
        })
        .collect();
    Ok(averages)
}

/// RSI = 100 - 100 / (1 + avg_gain / avg_loss).
///
/// Averages are adjusted exponentially weighted means with `alpha = 1 / period`.
/// A position is `None` until `period` price changes have been seen. When the
/// average loss is zero the ratio is unbounded and RSI is reported as 100.
pub fn rsi(values: &[f64], params: RsiParams) -> Result<Vec<Option<f64>>> {
    ensure_positive("RSI period", params.period)?;

    let decay = 1.0 - 1.0 / params.period as f64;
    let mut result = Vec::with_capacity(values.len());
    if values.is_empty() {
        return Ok(result);
    }
    // no change exists for the first price
    result.push(None);

    let (mut gain_sum, mut loss_sum, mut weight_sum) = (0.0, 0.0, 0.0);
    for (observed, pair) in values.windows(2).enumerate() {
        let change = pair[1] - pair[0];
        gain_sum = change.max(0.0) + decay * gain_sum;
        loss_sum = (-change).max(0.0) + decay * loss_sum;
        weight_sum = 1.0 + decay * weight_sum;

        if observed + 1 < params.period {
            result.push(None);
            continue;
        }

        let avg_gain = gain_sum / weight_sum;
        let avg_loss = loss_sum / weight_sum;
        let value = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        result.push(Some(value));
    }
    Ok(result)
}

pub fn bollinger_bands(values: &[f64], params: BollingerParams) -> Result<Vec<BollingerBand>> {
    ensure_positive("Bollinger window", params.window)?;

    let bands = (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(params.window);
            let window = &values[start..=i];
            let n = window.len() as f64;
            let mean = window.iter().sum::<f64>() / n;

            let std_dev = (window.len() >= 2).then(|| {
                let variance =
                    window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
                variance.sqrt()
            });
            let width = std_dev.map(|sd| params.k * sd);

            BollingerBand {
                middle: mean,
                std_dev,
                upper: width.map(|w| mean + w),
                lower: width.map(|w| mean - w),
            }
        })
        .collect();
    Ok(bands)
}

/// A derived column aligned 1:1 with the series it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A series plus the indicator columns appended to it, in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichedSeries {
    pub series: TimeSeries,
    pub columns: Vec<IndicatorColumn>,
}

impl EnrichedSeries {
    pub fn new(series: TimeSeries) -> Self {
        EnrichedSeries {
            series,
            columns: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&IndicatorColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn push(&mut self, name: String, values: Vec<Option<f64>>) {
        self.columns.retain(|c| c.name != name);
        self.columns.push(IndicatorColumn { name, values });
    }

    /// Appends `RSI{period}` computed over close prices.
    pub fn with_rsi(mut self, params: RsiParams) -> Result<Self> {
        let values = rsi(&self.series.closes()?, params)?;
        self.push(format!("RSI{}", params.period), values);
        Ok(self)
    }

    /// Appends one `MA{window}` column per window.
    pub fn with_moving_averages(mut self, windows: &[usize]) -> Result<Self> {
        let closes = self.series.closes()?;
        for window in windows {
            let values = moving_average(&closes, *window)?;
            self.push(format!("MA{window}"), values.into_iter().map(Some).collect());
        }
        Ok(self)
    }

    /// Appends `BB_MIDDLE`, `BB_UPPER` and `BB_LOWER`.
    pub fn with_bollinger_bands(mut self, params: BollingerParams) -> Result<Self> {
        let bands = bollinger_bands(&self.series.closes()?, params)?;
        self.push(
            "BB_MIDDLE".to_string(),
            bands.iter().map(|b| Some(b.middle)).collect(),
        );
        self.push("BB_UPPER".to_string(), bands.iter().map(|b| b.upper).collect());
        self.push("BB_LOWER".to_string(), bands.iter().map(|b| b.lower).collect());
        Ok(self)
    }
}
