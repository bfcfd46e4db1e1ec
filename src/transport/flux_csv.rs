//! Annotated CSV decoding
//!
//! Query responses arrive as CSV with one row per (series, field) value:
//!
//! ```text
//! ,result,table,_start,_stop,_time,_value,_field,_measurement,tag
//! ,_result,0,2024-01-01T00:00:00Z,...,10,field,20,test tag
//! ```
//!
//! Rows are pivoted back into one row per (time, measurement, tag set) with
//! each `_field` becoming a column holding its `_value`. Values stay strings;
//! record hydration coerces them to declared kinds.

use chrono::DateTime;
use std::collections::HashMap;

use crate::schema::{Row, Value, MEASUREMENT_COLUMN, TIME_COLUMN};

use super::TransportError;

const FIELD_COLUMN: &str = "_field";
const VALUE_COLUMN: &str = "_value";

/// Decode and pivot an annotated CSV body
pub(crate) fn decode(body: &str) -> Result<Vec<Row>, TransportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut order: Vec<Vec<String>> = Vec::new();
    let mut pivot: HashMap<Vec<String>, Row> = HashMap::new();

    for record in reader.records() {
        let record = record.map_err(|e| TransportError::Decode(e.to_string()))?;
        let cells: Vec<&str> = record.iter().collect();

        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        if cells.first().map_or(false, |c| c.starts_with('#')) {
            continue;
        }
        if is_header(&cells) {
            header = Some(cells.iter().map(|c| c.to_string()).collect());
            continue;
        }

        let Some(columns) = header.as_ref() else {
            return Err(TransportError::Decode("Data row before header".into()));
        };

        if let Some(idx) = columns.iter().position(|c| c == "error") {
            let message = cells.get(idx).copied().unwrap_or_default();
            return Err(TransportError::Api {
                status: 400,
                message: message.to_string(),
            });
        }

        let cell = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .and_then(|i| cells.get(i).copied())
        };

        let mut key = vec![
            cell(TIME_COLUMN).unwrap_or_default().to_string(),
            cell(MEASUREMENT_COLUMN).unwrap_or_default().to_string(),
        ];
        let mut columns_seen = Vec::new();
        for (i, name) in columns.iter().enumerate() {
            if is_user_column(name) {
                let value = cells.get(i).copied().unwrap_or_default();
                key.push(format!("{}={}", name, value));
                columns_seen.push((name.as_str(), value));
            }
        }

        if !pivot.contains_key(&key) {
            order.push(key.clone());
        }
        let row = pivot.entry(key).or_default();

        if let Some(time) = cell(TIME_COLUMN) {
            row.insert(TIME_COLUMN.to_string(), parse_time(time));
        }
        if let Some(measurement) = cell(MEASUREMENT_COLUMN) {
            row.insert(
                MEASUREMENT_COLUMN.to_string(),
                Value::String(measurement.to_string()),
            );
        }
        for (name, value) in columns_seen {
            if !value.is_empty() {
                row.insert(name.to_string(), Value::String(value.to_string()));
            }
        }
        if let (Some(field), Some(value)) = (cell(FIELD_COLUMN), cell(VALUE_COLUMN)) {
            row.insert(field.to_string(), Value::String(value.to_string()));
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|key| pivot.remove(&key))
        .collect())
}

fn is_header(cells: &[&str]) -> bool {
    (cells.contains(&"result") && cells.contains(&"table"))
        || (cells.contains(&"error") && cells.contains(&"reference"))
}

/// Tag or already-pivoted columns: everything the store did not add
fn is_user_column(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('_') && name != "result" && name != "table"
}

/// RFC 3339 to unix nanoseconds; unparseable times are kept as text
fn parse_time(s: &str) -> Value {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .and_then(|dt| dt.timestamp_nanos_opt())
        .map(Value::Integer)
        .unwrap_or_else(|| Value::String(s.to_string()))
}
