use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// One header cell per title.
pub fn header_row<S: AsRef<str>>(titles: &[S]) -> Vec<Cell> {
    titles.iter().map(|t| header_cell(t.as_ref())).collect()
}

/// Formats an `Option<T>` into a right-aligned `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Prices keep two decimals; large Korean won prices read fine that way too.
pub fn price_cell(value: Option<f64>) -> Cell {
    format_optional_cell(value, |v| format!("{v:.2}"))
}

/// Colored by sign: green up, red down.
pub fn change_cell(change: Option<f64>, suffix: &str) -> Cell {
    match change {
        Some(change) => {
            let color = if change >= 0.0 { Color::Green } else { Color::Red };
            Cell::new(format!("{change:.2}{suffix}"))
                .fg(color)
                .set_alignment(CellAlignment::Right)
        }
        None => format_optional_cell(None::<f64>, |v| v.to_string()),
    }
}

/// Plain text cell; blank or "-" values are shown as "N/A".
pub fn text_cell(text: &str) -> Cell {
    if text.is_empty() || text == "-" {
        Cell::new("N/A").fg(Color::DarkGrey)
    } else {
        Cell::new(text)
    }
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64, with_message: bool) -> ProgressBar {
    let template = if with_message {
        "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    } else {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    };

    let pb = ProgressBar::new(len);
    let bar_style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(bar_style);
    pb
}
