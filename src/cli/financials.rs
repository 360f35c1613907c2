use super::ui;
use crate::core::statements::FinancialStatementTable;
use crate::market::MarketData;
use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment, Table};

pub fn statement_table(statements: &FinancialStatementTable) -> Table {
    let mut table = ui::new_styled_table();
    let mut headers = vec!["Item"];
    headers.extend(statements.periods().iter().map(String::as_str));
    table.set_header(ui::header_row(&headers));

    for row in statements.rows() {
        let mut cells = vec![Cell::new(&row.item)];
        cells.extend(row.values.iter().map(|v| {
            ui::text_cell(v.as_deref().unwrap_or_default()).set_alignment(CellAlignment::Right)
        }));
        table.add_row(cells);
    }
    table
}

pub async fn run(market: &MarketData, code: &str) -> Result<()> {
    let statements = market
        .financial_statements(code)
        .await
        .with_context(|| format!("Failed to fetch financial statements for {code}"))?;

    println!(
        "\nAnnual financials: {}",
        ui::style_text(code, ui::StyleType::Title)
    );
    if statements.is_empty() {
        println!("{}", ui::style_text("No statements published", ui::StyleType::Subtle));
    } else {
        println!("{}", statement_table(&statements));
    }
    Ok(())
}
