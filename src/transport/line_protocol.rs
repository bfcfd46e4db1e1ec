//! Line protocol encoding
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp]
//! ```
//!
//! Integers carry an `i` suffix, strings are double-quoted, timestamps are
//! nanoseconds.

use std::fmt::Write as _;

use crate::schema::Value;

use super::DataPoint;

/// Encode one point
pub fn to_line(point: &DataPoint) -> String {
    let mut line = escape(&point.measurement, &[',', ' ']);

    for (key, value) in &point.tags {
        let _ = write!(
            line,
            ",{}={}",
            escape(key, &[',', '=', ' ']),
            escape(value, &[',', '=', ' '])
        );
    }

    let fields: Vec<String> = point
        .fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), field_value(value)))
        .collect();
    line.push(' ');
    line.push_str(&fields.join(","));

    if let Some(ts) = point.timestamp {
        let _ = write!(line, " {}", ts);
    }

    line
}

/// Encode a batch, one point per line
pub fn to_lines(points: &[DataPoint]) -> String {
    points.iter().map(to_line).collect::<Vec<_>>().join("\n")
}

fn field_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", escape(s, &['"', '\\'])),
        Value::Integer(i) => format!("{}i", i),
        Value::Float(f) => format!("{}", f),
        Value::Boolean(b) => format!("{}", b),
    }
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_point() {
        let point = DataPoint::new("20")
            .tag("tag", "test tag")
            .field("field", 10i64)
            .at(1_700_000_000_000_000_000);

        assert_eq!(
            to_line(&point),
            "20,tag=test\\ tag field=10i 1700000000000000000"
        );
    }

    #[test]
    fn test_field_kinds() {
        let point = DataPoint::new("cpu")
            .field("a", 1.5)
            .field("b", true)
            .field("c", "say \"hi\"");

        assert_eq!(to_line(&point), "cpu a=1.5,b=true,c=\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_escapes_keys_and_measurement() {
        let point = DataPoint::new("my cpu,1")
            .tag("host=name", "a,b")
            .field("load avg", 1i64);

        assert_eq!(
            to_line(&point),
            "my\\ cpu\\,1,host\\=name=a\\,b load\\ avg=1i"
        );
    }

    #[test]
    fn test_batch() {
        let points = vec![
            DataPoint::new("m").field("v", 1i64).at(1),
            DataPoint::new("m").field("v", 2i64).at(2),
        ];
        assert_eq!(to_lines(&points), "m v=1i 1\nm v=2i 2");
    }
}
