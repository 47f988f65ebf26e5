use std::io::Write;

use anyhow::Result;
use serde_json::Value;

use crate::config::OutputFormat;
use crate::report::Report;

use super::tables::render_report;

/// Writes a report in the requested format.
///
/// - Table: the same comfy-table rendering the terminal shows
/// - JSON: programmatic access, optionally pretty-printed
/// - CSV: spreadsheet analysis and reporting
pub fn export_report(
    report: &Report,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Table => writeln!(output, "{}", render_report(report))?,
        OutputFormat::Json => export_json(report, pretty, output)?,
        OutputFormat::Csv => export_csv(report, output)?,
    }
    Ok(())
}

fn export_json(report: &Report, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{}", json)?;
    Ok(())
}

fn export_csv(report: &Report, output: &mut dyn Write) -> Result<()> {
    writeln!(
        output,
        "{}",
        report
            .headers
            .iter()
            .map(|h| csv_cell(&Value::String(h.clone())))
            .collect::<Vec<_>>()
            .join(",")
    )?;
    for row in &report.rows {
        writeln!(
            output,
            "{}",
            row.iter().map(csv_cell).collect::<Vec<_>>().join(",")
        )?;
    }
    Ok(())
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::String(text) => format!("\"{}\"", text.replace('"', "\"\"")),
        other => other.to_string(),
    }
}
