use serde_json::Value;

use crate::analytics::{drop_incomplete_rows, AnalyticsRecord, Row, ANALYTICS_COLLECTION};
use crate::error::{Error, Result};
use crate::storage::Database;

const REPORT_HEADING: &str = "Social media data for the past 30 days:\n\n";

/// Render the most recently stored Analytics Record as text.
pub async fn generate_report(db: &Database, drop_incomplete: bool) -> Result<String> {
    let record: AnalyticsRecord = db
        .find_latest(ANALYTICS_COLLECTION, &serde_json::json!({}))
        .await?
        .ok_or_else(|| Error::NotFound("no analytics data has been fetched yet".into()))?;

    let rows = if drop_incomplete {
        drop_incomplete_rows(record.data)
    } else {
        record.data
    };

    Ok(format!("{REPORT_HEADING}{}", render_table(&rows)))
}

/// Right-aligned text table, one header line then one line per row.
/// Columns appear in first-seen order; missing cells render as `NaN`.
pub fn render_table(rows: &[Row]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    if columns.is_empty() {
        return "Empty table".to_string();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(*c).map(cell_text).unwrap_or_else(|| "NaN".to_string()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:>w$}", w = *w))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut lines = vec![line(columns.clone())];
    for row in &cells {
        lines.push(line(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => "NaN".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
