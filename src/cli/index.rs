use super::stock::enriched_table;
use super::ui;
use crate::core::indicators::{BollingerParams, EnrichedSeries};
use crate::core::provider::MarketIndex;
use crate::core::series::{DateRange, TimeSeries};
use crate::market::MarketData;
use anyhow::{Context, Result};

fn print_series(index: MarketIndex, series: TimeSeries, bollinger: bool) -> Result<()> {
    println!("\n{}", ui::style_text(&index.to_string(), ui::StyleType::Title));
    if series.is_empty() {
        println!("{}", ui::style_text("No data in range", ui::StyleType::Subtle));
        return Ok(());
    }

    let mut enriched = EnrichedSeries::new(series);
    if bollinger {
        enriched = enriched.with_bollinger_bands(BollingerParams::default())?;
    }
    println!("{}", enriched_table(&enriched));
    Ok(())
}

/// USD/KRW, Naver only unless `reconcile` asks for the Yahoo backfill.
pub async fn run_fx(
    market: &MarketData,
    range: &DateRange,
    reconcile: bool,
    bollinger: bool,
) -> Result<()> {
    let series = if reconcile {
        market.exchange_rate_reconciled(range).await
    } else {
        market.exchange_rate(range).await
    }
    .context("Failed to fetch USD/KRW exchange rate")?;
    print_series(MarketIndex::UsdKrw, series, bollinger)
}

pub async fn run_gold(market: &MarketData, range: &DateRange, bollinger: bool) -> Result<()> {
    let series = market
        .gold_prices(range)
        .await
        .context("Failed to fetch gold prices")?;
    print_series(MarketIndex::Gold, series, bollinger)
}
