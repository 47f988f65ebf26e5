use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};
use serde_json::Value;

use crate::report::Report;

/// Table and cell creation helpers
fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Renders a report as a terminal table with a cyan header row.
pub fn render_report(report: &Report) -> Table {
    let mut table = create_table();
    table.set_header(
        report
            .headers
            .iter()
            .map(|label| Cell::new(label).fg(TableColor::Cyan)),
    );
    for row in &report.rows {
        table.add_row(row.iter().map(|value| Cell::new(cell_text(value))));
    }
    table
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
