use crate::core::error::{MarketError, Result};
use crate::core::normalize::{NAVER_DAILY_BARS, normalize};
use crate::core::provider::DailySeriesProvider;
use crate::core::series::{DateRange, TimeSeries, format_compact_date};
use crate::providers::util::{RequestProfile, RetryPolicy, get_json};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

/// Korean listings are six-digit codes; anything else is a Naver foreign ticker
/// such as `AAPL.O`.
pub fn is_domestic_symbol(symbol: &str) -> bool {
    symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit())
}

/// Daily candles from `api.stock.naver.com`.
pub struct NaverChartProvider {
    base_url: String,
    client: Client,
    profile: RequestProfile,
    retry: RetryPolicy,
}

impl NaverChartProvider {
    pub fn new(base_url: &str, client: Client, retry: RetryPolicy) -> Self {
        NaverChartProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            profile: RequestProfile::naver(),
            retry,
        }
    }

    pub fn daily_chart_url(&self, symbol: &str, range: &DateRange) -> String {
        let market = if is_domestic_symbol(symbol) {
            "domestic"
        } else {
            "foreign"
        };
        format!(
            "{}/chart/{}/item/{}/day?startDateTime={}0000&endDateTime={}0000",
            self.base_url,
            market,
            symbol,
            format_compact_date(range.start),
            format_compact_date(range.end)
        )
    }

    /// The undecoded candle array, newest first as Naver sends it.
    #[instrument(name = "NaverChartFetch", skip(self), fields(symbol = %symbol))]
    pub async fn fetch_raw(&self, symbol: &str, range: &DateRange) -> Result<Value> {
        if symbol.trim().is_empty() || symbol.contains('/') {
            return Err(MarketError::InvalidInput(format!(
                "invalid ticker symbol: '{symbol}'"
            )));
        }
        let url = self.daily_chart_url(symbol, range);
        get_json(&self.client, &url, &self.profile, &self.retry).await
    }
}

#[async_trait]
impl DailySeriesProvider for NaverChartProvider {
    async fn fetch_daily(&self, symbol: &str, range: &DateRange) -> Result<TimeSeries> {
        let raw = self.fetch_raw(symbol, range).await?;
        let series = normalize(&raw, &NAVER_DAILY_BARS)?;
        debug!("Fetched {} daily bars for {}", series.len(), symbol);
        Ok(series)
    }
}
