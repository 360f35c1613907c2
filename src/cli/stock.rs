use super::ui;
use crate::core::indicators::{BollingerParams, EnrichedSeries};
use crate::core::series::DateRange;
use crate::market::MarketData;
use anyhow::Result;
use comfy_table::{Cell, Table};
use futures::future::join_all;

/// Date, OHLC, then every indicator column in insertion order.
pub fn enriched_table(enriched: &EnrichedSeries) -> Table {
    let mut table = ui::new_styled_table();
    let mut headers = vec!["Date", "Open", "High", "Low", "Close"];
    headers.extend(enriched.columns.iter().map(|c| c.name.as_str()));
    table.set_header(ui::header_row(&headers));

    for (idx, point) in enriched.series.points().iter().enumerate() {
        let mut row = vec![
            Cell::new(point.date.format("%Y-%m-%d")),
            ui::price_cell(point.open),
            ui::price_cell(point.high),
            ui::price_cell(point.low),
            ui::price_cell(point.close),
        ];
        row.extend(
            enriched
                .columns
                .iter()
                .map(|c| ui::price_cell(c.values.get(idx).copied().flatten())),
        );
        table.add_row(row);
    }
    table
}

fn print_result(symbol: &str, result: Result<EnrichedSeries>) {
    println!("\nSymbol: {}", ui::style_text(symbol, ui::StyleType::Title));
    match result {
        Ok(enriched) if enriched.series.is_empty() => {
            println!("{}", ui::style_text("No data in range", ui::StyleType::Subtle));
        }
        Ok(enriched) => println!("{}", enriched_table(&enriched)),
        Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
    }
}

/// Fetches every symbol concurrently and prints one table each.
pub async fn run(
    market: &MarketData,
    symbols: &[String],
    range: &DateRange,
    moving_averages: &[usize],
    bollinger: bool,
) -> Result<()> {
    let pb = ui::new_progress_bar(symbols.len() as u64, false);
    let futures = symbols.iter().map(|symbol| {
        let pb_clone = pb.clone();
        async move {
            let result = market
                .stock_data(symbol, range, moving_averages)
                .await
                .and_then(|enriched| {
                    if bollinger {
                        enriched.with_bollinger_bands(BollingerParams::default())
                    } else {
                        Ok(enriched)
                    }
                });
            pb_clone.inc(1);
            (symbol, result)
        }
    });
    let results = join_all(futures).await;
    pb.finish_and_clear();

    let mut failures = 0;
    for (symbol, result) in results {
        failures += usize::from(result.is_err());
        print_result(symbol, result.map_err(anyhow::Error::from));
    }

    if failures == symbols.len() && !symbols.is_empty() {
        anyhow::bail!("Failed to fetch data for every requested symbol");
    }
    Ok(())
}

pub async fn run_recent(
    market: &MarketData,
    symbol: &str,
    days: usize,
    moving_averages: &[usize],
) -> Result<()> {
    let enriched = market
        .recent_stock_data(symbol, days, moving_averages)
        .await?;
    print_result(symbol, Ok(enriched));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::indicators::RsiParams;
    use crate::core::series::{PricePoint, TimeSeries};
    use chrono::NaiveDate;

    #[test]
    fn test_enriched_table_columns() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let series = TimeSeries::from_points(vec![
            PricePoint::ohlc(start, 1.0, 2.0, 0.5, 1.5),
            PricePoint::ohlc(start.succ_opt().unwrap(), 1.5, 2.5, 1.0, 2.0),
        ]);
        let enriched = EnrichedSeries::new(series)
            .with_rsi(RsiParams::default())
            .unwrap()
            .with_moving_averages(&[2])
            .unwrap();

        let rendered = enriched_table(&enriched).to_string();
        assert!(rendered.contains("RSI14"));
        assert!(rendered.contains("MA2"));
        assert!(rendered.contains("2024-01-03"));
        assert!(rendered.contains("1.75"));
    }
}
