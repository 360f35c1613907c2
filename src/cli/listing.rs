use super::ui;
use crate::market::MarketData;
use crate::providers::{MarketMover, ScreenerRow};
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

pub fn screener_table(rows: &[ScreenerRow]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(ui::header_row(&[
        "Symbol", "Name", "Last Sale", "Change", "% Change", "Market Cap", "Country", "IPO",
        "Volume", "Sector", "Industry",
    ]));
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.symbol),
            Cell::new(&row.name),
            ui::price_cell(row.last_sale_value()),
            ui::text_cell(&row.net_change),
            ui::change_cell(row.percent_change_value(), "%"),
            ui::text_cell(&row.market_cap),
            ui::text_cell(&row.country),
            ui::text_cell(&row.ipo_year),
            ui::text_cell(&row.volume),
            ui::text_cell(&row.sector),
            ui::text_cell(&row.industry),
        ]);
    }
    table
}

pub fn movers_table(movers: &[MarketMover]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(ui::header_row(&[
        "Code", "Name", "Close", "Change", "Ratio", "Volume",
    ]));
    for mover in movers {
        table.add_row(vec![
            Cell::new(&mover.item_code),
            Cell::new(&mover.name),
            ui::price_cell(mover.close_price),
            ui::change_cell(mover.change, ""),
            ui::change_cell(mover.fluctuation_ratio, "%"),
            ui::format_optional_cell(mover.volume, |v| format!("{v:.0}")),
        ]);
    }
    table
}

/// The screener is large; `limit` caps how many rows are printed.
pub async fn run_nasdaq(market: &MarketData, symbol: Option<&str>, limit: usize) -> Result<()> {
    let rows = market
        .nasdaq_listing(symbol)
        .await
        .context("Failed to fetch Nasdaq listing")?;

    if rows.is_empty() {
        println!(
            "{}",
            ui::style_text("No matching listings", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    let shown = rows.len().min(limit);
    println!("{}", screener_table(&rows[..shown]));
    if shown < rows.len() {
        println!(
            "{}",
            ui::style_text(
                &format!("Showing {} of {} listings", shown, rows.len()),
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

pub async fn run_decliners(market: &MarketData, count: usize) -> Result<()> {
    let movers = market
        .kospi_decliners(count)
        .await
        .context("Failed to fetch KOSPI decliners")?;
    println!("\n{}", ui::style_text("KOSPI decliners", ui::StyleType::Title));
    println!("{}", movers_table(&movers));
    Ok(())
}
