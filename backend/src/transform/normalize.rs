//! Cell normalization into JSON values.
//!
//! Rules, applied in order:
//!
//! 1. empty cells, error cells and NaN become `null`
//! 2. dates become ISO-8601 strings (`2024-01-05T00:00:00`, with `.ffffff`
//!    only when there are sub-second digits, and `+HH:MM` when an offset is
//!    known); durations become ISO-8601 durations
//! 3. floats with no fractional part become integers (`10.0` -> `10`)
//! 4. everything else passes through unchanged

use chrono::{NaiveDateTime, Timelike};
use serde_json::Value;

use crate::parser::Cell;

/// Normalize one raw cell.
pub fn normalize(cell: &Cell) -> Value {
    match cell {
        Cell::Empty | Cell::Error(_) => Value::Null,
        Cell::Float(f) if f.is_nan() => Value::Null,
        Cell::DateTime(dt) => Value::String(iso_datetime(dt)),
        Cell::DateTimeTz(dt) => {
            Value::String(format!("{}{}", iso_datetime(&dt.naive_local()), dt.offset()))
        }
        Cell::Duration(d) => Value::String(iso_duration(d)),
        Cell::Float(f) => match as_whole_i64(*f) {
            Some(i) => Value::from(i),
            None => Value::from(*f),
        },
        Cell::Int(i) => Value::from(*i),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Text(s) => Value::String(s.clone()),
    }
}

/// `Some` when `f` has no fractional part and fits in an `i64`.
fn as_whole_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict bound
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// `YYYY-MM-DDTHH:MM:SS`, plus `.ffffff` when microseconds are non-zero.
pub fn iso_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// ISO-8601 duration in `PnDTnHnMnS` form.
pub fn iso_duration(d: &chrono::Duration) -> String {
    let sign = if *d < chrono::Duration::zero() { "-" } else { "" };
    let d = d.abs();

    let total = d.num_seconds();
    let micros = (d - chrono::Duration::seconds(total)).num_microseconds().unwrap_or(0);
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, seconds) = (rem / 60, rem % 60);

    let seconds = if micros == 0 {
        seconds.to_string()
    } else {
        format!("{}.{:06}", seconds, micros)
            .trim_end_matches('0')
            .to_string()
    };

    format!("{}P{}DT{}H{}M{}S", sign, days, hours, minutes, seconds)
}
