use serde_json::Value;

use super::Row;
use crate::error::{Error, Result};

/// Turn an analytics report body into tabular rows.
///
/// `rows` must be present. Array rows are keyed by `columnHeaders[].name`
/// (with the `ga:` prefix dropped), or by position when headers are missing
/// or too short. Object rows are flattened with `.`-joined keys.
pub fn normalize_rows(report: &Value) -> Result<Vec<Row>> {
    let rows = report
        .get("rows")
        .ok_or_else(|| Error::malformed("analytics", "response has no 'rows' field"))?
        .as_array()
        .ok_or_else(|| Error::malformed("analytics", "'rows' is not an array"))?;

    let headers = column_names(report);

    Ok(rows
        .iter()
        .map(|row| match row {
            Value::Array(cells) => cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let name = headers.get(i).cloned().unwrap_or_else(|| i.to_string());
                    (name, cell.clone())
                })
                .collect(),
            Value::Object(map) => {
                let mut out = Row::new();
                flatten_into(&mut out, None, map);
                out
            }
            scalar => {
                let mut out = Row::new();
                out.insert("0".to_string(), scalar.clone());
                out
            }
        })
        .collect())
}

fn column_names(report: &Value) -> Vec<String> {
    report
        .get("columnHeaders")
        .and_then(Value::as_array)
        .map(|headers| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    h.get("name")
                        .and_then(Value::as_str)
                        .map(|n| n.strip_prefix("ga:").unwrap_or(n).to_string())
                        .unwrap_or_else(|| i.to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

fn flatten_into(out: &mut Row, prefix: Option<&str>, map: &serde_json::Map<String, Value>) {
    for (key, value) in map {
        let name = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&name), inner),
            other => {
                out.insert(name, other.clone());
            }
        }
    }
}

/// Drop rows with any null cell.
pub fn drop_incomplete_rows(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| row.values().all(|v| !v.is_null()))
        .collect()
}
