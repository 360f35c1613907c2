use crate::core::error::{MarketError, Result};
use crate::core::provider::DailySeriesProvider;
use crate::core::series::{DateRange, PricePoint, TimeSeries};
use crate::providers::util::{RequestProfile, RetryPolicy, get_json, url_with_params};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// Daily chart bars from Yahoo Finance, used as the secondary source when
/// reconciling index series.
pub struct YahooFinanceProvider {
    base_url: String,
    client: Client,
    profile: RequestProfile,
    retry: RetryPolicy,
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug, Default)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn epoch_seconds(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Exchange-local calendar day of a bar timestamp.
fn local_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

fn chart_to_series(symbol: &str, raw: Value) -> Result<TimeSeries> {
    let response: YahooChartResponse = serde_json::from_value(raw)
        .map_err(|e| MarketError::Schema(format!("Yahoo chart for {symbol}: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(MarketError::Schema(format!(
            "Yahoo chart for {symbol} failed: {} {}",
            error.code.unwrap_or_default(),
            error.description.unwrap_or_default()
        )));
    }

    let item = response
        .chart
        .result
        .and_then(|items| items.into_iter().next())
        .ok_or_else(|| MarketError::Schema(format!("No chart data found for symbol: {symbol}")))?;

    let timestamps = item.timestamp.unwrap_or_default();
    let quote = item.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |values: &[Option<f64>], idx: usize| values.get(idx).copied().flatten();

    let points = timestamps
        .iter()
        .enumerate()
        .filter_map(|(idx, ts)| {
            let date = local_date(*ts, item.meta.gmtoffset)?;
            let point = PricePoint {
                date,
                open: at(&quote.open, idx),
                high: at(&quote.high, idx),
                low: at(&quote.low, idx),
                close: at(&quote.close, idx),
            };
            // holidays come back as all-null rows
            let has_price = point.open.is_some()
                || point.high.is_some()
                || point.low.is_some()
                || point.close.is_some();
            has_price.then_some(point)
        })
        .collect();

    Ok(TimeSeries::from_points(points))
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, client: Client, retry: RetryPolicy) -> Self {
        YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            profile: RequestProfile::plain(),
            retry,
        }
    }

    /// `period2` is exclusive, so it is set to the day after `range.end`.
    pub fn chart_url(&self, symbol: &str, range: &DateRange) -> Result<String> {
        let period1 = epoch_seconds(range.start).to_string();
        let period2 = epoch_seconds(range.end + Duration::days(1)).to_string();
        url_with_params(
            &format!("{}/v8/finance/chart/{}", self.base_url, symbol),
            &[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
            ],
        )
    }
}

#[async_trait]
impl DailySeriesProvider for YahooFinanceProvider {
    #[instrument(name = "YahooChartFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_daily(&self, symbol: &str, range: &DateRange) -> Result<TimeSeries> {
        let url = self.chart_url(symbol, range)?;
        let raw = get_json(&self.client, &url, &self.profile, &self.retry).await?;
        let series = chart_to_series(symbol, raw)?.within(range);
        debug!("Yahoo returned {} bars for {}", series.len(), symbol);
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(symbol: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(base_url: &str) -> YahooFinanceProvider {
        YahooFinanceProvider::new(
            base_url,
            Client::new(),
            RetryPolicy::new(2, StdDuration::from_millis(5)),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_chart_url_period_bounds() {
        let range = DateRange::new(day(2), day(4)).unwrap();
        let url = provider("https://query1.finance.yahoo.com")
            .chart_url("GC=F", &range)
            .unwrap();
        assert_eq!(
            url,
            "https://query1.finance.yahoo.com/v8/finance/chart/GC=F?period1=1704153600&period2=1704412800&interval=1d"
        );
    }

    #[tokio::test]
    async fn test_fetch_daily_bars_in_exchange_time() {
        // 2024-01-02 and 2024-01-03 23:00 UTC, New York offset -5h; the middle row is a holiday
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": {"currency": "USD", "symbol": "GC=F", "gmtoffset": -18000},
                    "timestamp": [1704236400, 1704279600, 1704322800],
                    "indicators": {"quote": [{
                        "open":  [2072.0, null, 2050.1],
                        "high":  [2080.5, null, 2055.0],
                        "low":   [2060.0, null, 2040.2],
                        "close": [2073.9, null, 2042.8]
                    }]}
                }],
                "error": null
            }
        }"#;

        let mock_server = create_mock_server("GC=F", mock_response).await;
        let range = DateRange::new(day(1), day(5)).unwrap();
        let series = provider(&mock_server.uri())
            .fetch_daily("GC=F", &range)
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date, day(2));
        assert_eq!(series.points()[1].date, day(3));
        assert_eq!(series.closes().unwrap(), vec![2073.9, 2042.8]);
    }

    #[tokio::test]
    async fn test_chart_error_is_schema_error() {
        let mock_response = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;

        let mock_server = create_mock_server("NOPE", mock_response).await;
        let range = DateRange::new(day(1), day(5)).unwrap();
        let err = provider(&mock_server.uri())
            .fetch_daily("NOPE", &range)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Schema(_)));
        assert!(err.to_string().contains("symbol may be delisted"));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_schema_error() {
        let mock_server = create_mock_server("KRW=X", r#"{"chart": {"results": []}}"#).await;
        let range = DateRange::new(day(1), day(5)).unwrap();
        let err = provider(&mock_server.uri())
            .fetch_daily("KRW=X", &range)
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("No chart data found for symbol: KRW=X")
        );
    }
}
