//! End-to-end retrieval pipelines: fetch, normalize, reconcile, enrich.

use crate::core::config::AppConfig;
use crate::core::error::{MarketError, Result};
use crate::core::indicators::{EnrichedSeries, RsiParams};
use crate::core::provider::{DailySeriesProvider, IndexSeriesProvider, MarketIndex};
use crate::core::reconcile::{fill_gaps, reconcile};
use crate::core::series::{DateRange, TimeSeries};
use crate::core::statements::FinancialStatementTable;
use crate::providers::util::build_client;
use crate::providers::{
    MarketMover, NasdaqScreenerProvider, NaverChartProvider, NaverFinanceProvider,
    NaverIndexProvider, NaverRankingProvider, ScreenerRow, YahooFinanceProvider,
};
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

/// Daily bars with `RSI14` and one `MA{n}` column per window.
pub async fn stock_series_with_indicators(
    provider: &dyn DailySeriesProvider,
    symbol: &str,
    range: &DateRange,
    moving_averages: &[usize],
) -> Result<EnrichedSeries> {
    let series = provider.fetch_daily(symbol, range).await?;
    enrich(series, moving_averages)
}

/// The last `days` bars up to `today`. Twice as many calendar days are
/// requested so weekends and holidays still leave enough trading days.
pub async fn recent_series_with_indicators(
    provider: &dyn DailySeriesProvider,
    symbol: &str,
    today: NaiveDate,
    days: usize,
    moving_averages: &[usize],
) -> Result<EnrichedSeries> {
    if days == 0 {
        return Err(MarketError::InvalidInput(
            "number of days must be greater than zero".to_string(),
        ));
    }
    let window = days.checked_mul(2).ok_or_else(|| {
        MarketError::InvalidInput(format!("number of days {days} is too large"))
    })?;
    let range = DateRange::ending_on(today, window)?;
    let series = provider.fetch_daily(symbol, &range).await?.tail(days);
    enrich(series, moving_averages)
}

fn enrich(series: TimeSeries, moving_averages: &[usize]) -> Result<EnrichedSeries> {
    EnrichedSeries::new(series)
        .with_rsi(RsiParams::default())?
        .with_moving_averages(moving_averages)
}

/// Primary index series merged with the vendor's bars for the same instrument.
pub async fn reconciled_index_series(
    primary: &dyn IndexSeriesProvider,
    secondary: &dyn DailySeriesProvider,
    index: MarketIndex,
    range: &DateRange,
) -> Result<TimeSeries> {
    let primary_series = primary.fetch_index(index).await?;
    let secondary_series = secondary
        .fetch_daily(index.vendor_symbol(), range)
        .await?;
    info!(
        "Reconciling {}: {} primary and {} secondary points",
        index,
        primary_series.len(),
        secondary_series.len()
    );
    Ok(reconcile(&primary_series, &secondary_series, range))
}

/// Primary index series on its own with calendar gaps interpolated.
pub async fn gap_filled_index_series(
    primary: &dyn IndexSeriesProvider,
    index: MarketIndex,
    range: &DateRange,
) -> Result<TimeSeries> {
    let series = primary.fetch_index(index).await?;
    Ok(fill_gaps(&series, range))
}

/// Every data source, wired from configuration.
pub struct MarketData {
    chart: NaverChartProvider,
    index: NaverIndexProvider,
    vendor: YahooFinanceProvider,
    finance: NaverFinanceProvider,
    screener: NasdaqScreenerProvider,
    ranking: NaverRankingProvider,
}

impl MarketData {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.http_timeout())?;
        let retry = config.http.retry.to_policy();
        let providers = &config.providers;
        debug!(?retry, "Creating market data providers");

        Ok(MarketData {
            chart: NaverChartProvider::new(&providers.naver.api_base_url, client.clone(), retry),
            index: NaverIndexProvider::new(
                &providers.naver.mobile_base_url,
                client.clone(),
                retry,
            ),
            vendor: YahooFinanceProvider::new(&providers.yahoo.base_url, client.clone(), retry),
            finance: NaverFinanceProvider::new(
                &providers.naver.api_base_url,
                &providers.naver.mobile_base_url,
                client.clone(),
                retry,
            ),
            screener: NasdaqScreenerProvider::new(
                &providers.nasdaq.base_url,
                client.clone(),
                retry,
            ),
            ranking: NaverRankingProvider::new(&providers.naver.mobile_base_url, client, retry),
        })
    }

    /// Bars between `YYYYMMDD` bounds with `RSI14` and moving averages.
    pub async fn stock_data_by_date_range(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
        moving_averages: &[usize],
    ) -> Result<EnrichedSeries> {
        let range = DateRange::parse(start, end)?;
        stock_series_with_indicators(&self.chart, symbol, &range, moving_averages).await
    }

    pub async fn stock_data(
        &self,
        symbol: &str,
        range: &DateRange,
        moving_averages: &[usize],
    ) -> Result<EnrichedSeries> {
        stock_series_with_indicators(&self.chart, symbol, range, moving_averages).await
    }

    pub async fn recent_stock_data(
        &self,
        symbol: &str,
        days: usize,
        moving_averages: &[usize],
    ) -> Result<EnrichedSeries> {
        let today = Local::now().date_naive();
        recent_series_with_indicators(&self.chart, symbol, today, days, moving_averages).await
    }

    /// USD/KRW from Naver alone, gaps interpolated.
    pub async fn exchange_rate(&self, range: &DateRange) -> Result<TimeSeries> {
        gap_filled_index_series(&self.index, MarketIndex::UsdKrw, range).await
    }

    /// USD/KRW from Naver, backfilled with Yahoo `KRW=X`.
    pub async fn exchange_rate_reconciled(&self, range: &DateRange) -> Result<TimeSeries> {
        reconciled_index_series(&self.index, &self.vendor, MarketIndex::UsdKrw, range).await
    }

    /// Gold futures from Naver, backfilled with Yahoo `GC=F`.
    pub async fn gold_prices(&self, range: &DateRange) -> Result<TimeSeries> {
        reconciled_index_series(&self.index, &self.vendor, MarketIndex::Gold, range).await
    }

    pub async fn financial_statements(&self, code: &str) -> Result<FinancialStatementTable> {
        self.finance.fetch_annual(code).await
    }

    pub async fn nasdaq_listing(&self, symbol: Option<&str>) -> Result<Vec<ScreenerRow>> {
        self.screener.fetch_listing(symbol).await
    }

    pub async fn kospi_decliners(&self, count: usize) -> Result<Vec<MarketMover>> {
        self.ranking.fetch_kospi_decliners(count).await
    }
}
