//! Duration flags such as `--duration 15s`.

use std::time::Duration;

use thiserror::Error;

/// A duration flag value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration {0:?}: expected a number with an optional ms, s, m or h suffix")]
pub struct InvalidDuration(pub String);

/// Parse a duration like `500ms`, `15s`, `1.5m`, `2h` or a bare number of
/// seconds.
///
/// Negative values parse as zero, which the scan command treats as "use the
/// default".
///
/// # Errors
///
/// Returns [`InvalidDuration`] for an empty value, an unknown unit or a
/// value that does not fit in a [`Duration`].
pub fn parse_duration(value: &str) -> Result<Duration, InvalidDuration> {
    let invalid = || InvalidDuration(value.to_string());

    let trimmed = value.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let split = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, unit) = unsigned.split_at(split);
    if number.is_empty() {
        return Err(invalid());
    }

    let amount: f64 = number.parse().map_err(|_| invalid())?;
    let scale = match unit.trim() {
        "ms" => 0.001,
        "" | "s" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        _ => return Err(invalid()),
    };

    if negative {
        return Ok(Duration::ZERO);
    }
    Duration::try_from_secs_f64(amount * scale).map_err(|_| invalid())
}

/// Render a duration rounded to whole seconds, e.g. `1m30s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if duration.subsec_millis() >= 500 {
        secs += 1;
    }
    if secs == 0 {
        return "0s".to_string();
    }

    let hours = secs / 3600;
    let minutes = secs % 3600 / 60;
    let seconds = secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&format!("{seconds}s"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("1.5m").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
    }

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!(parse_duration(" 20 ").unwrap(), Duration::from_secs(20));
    }

    #[test]
    fn negative_values_become_zero() {
        assert_eq!(parse_duration("-5s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn rejects_garbage() {
        for value in ["", "s", "fast", "10x", "1.2.3s"] {
            let err = parse_duration(value).unwrap_err();
            assert_eq!(err, InvalidDuration(value.to_string()));
        }
    }

    #[test]
    fn formats_rounded_seconds() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(1400)), "1s");
        assert_eq!(format_duration(Duration::from_secs(15)), "15s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
    }
}
