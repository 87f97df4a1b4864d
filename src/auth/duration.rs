//! Token lifetime parsing.
//!
//! Accepts one or more `<number><unit>` segments such as `24h`, `1h30m` or
//! `1.5h`. Units: `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`.

use chrono::Duration;

use crate::errors::{Error, Result};

const NANOS_PER_MICRO: f64 = 1e3;
const NANOS_PER_MILLI: f64 = 1e6;
const NANOS_PER_SECOND: f64 = 1e9;

fn unit_scale(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60.0 * NANOS_PER_SECOND),
        "h" => Some(3600.0 * NANOS_PER_SECOND),
        _ => None,
    }
}

fn invalid(input: &str, reason: &str) -> Error {
    Error::config(format!("Invalid token duration '{}': {}", input, reason))
}

/// Parse a positive lifetime string.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let value = input.trim();
    if value.is_empty() {
        return Err(invalid(input, "empty duration"));
    }

    let mut rest = value;
    let mut total_nanos = 0.0_f64;

    while !rest.is_empty() {
        let number_len =
            rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() {
            return Err(invalid(input, "expected a number"));
        }
        let quantity: f64 = number.parse().map_err(|_| invalid(input, "malformed number"))?;

        let unit_len = tail.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        let scale = unit_scale(unit).ok_or_else(|| {
            invalid(input, "expected a unit of ns, us, ms, s, m or h after each number")
        })?;

        total_nanos += quantity * scale;
        rest = next;
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return Err(invalid(input, "duration out of range"));
    }
    let nanos = total_nanos.round() as i64;
    if nanos < NANOS_PER_SECOND as i64 {
        return Err(invalid(input, "duration must be at least one second"));
    }
    // Token timestamps have one-second resolution.
    if nanos % NANOS_PER_SECOND as i64 != 0 {
        return Err(invalid(input, "duration must be a whole number of seconds"));
    }

    Ok(Duration::nanoseconds(nanos))
}
