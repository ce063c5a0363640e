//! Compound duration values such as `1m30s` or `250ms`.

use std::fmt::Write as _;
use std::time::Duration;

use crate::error::ValueError;
use crate::value::{FlagType, ValueKind};

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

fn split_digits(s: &str) -> (&str, &str) {
    s.split_at(s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len()))
}

/// Parses a sequence of decimal numbers, each with an optional fraction and
/// a required unit suffix (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`).
///
/// A bare `0` is accepted. Negative durations are rejected, except for a
/// negated zero such as `-0s`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cmder_flag::parse_duration;
///
/// assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
/// assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5400)));
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(text: &str) -> Result<Duration, ValueError> {
    let invalid = || ValueError::InvalidDuration(text.to_string());
    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(unsigned) => (true, unsigned),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, tail) = split_digits(rest);
        let (fraction, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", tail),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_end = tail
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let scale = unit_nanos(unit).ok_or_else(invalid)?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;
        if !fraction.is_empty() {
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| invalid())?;
            nanos = nanos
                .checked_add(numerator * scale / 10u128.pow(digits.len() as u32))
                .ok_or_else(invalid)?;
        }

        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = tail;
    }

    if negative && total != 0 {
        return Err(invalid());
    }
    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Renders `value / scale` with the fractional part trimmed of trailing
/// zeros.
fn fixed_point(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let width = scale.ilog10() as usize;
    let digits = format!("{fraction:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Renders a duration in canonical compound form.
///
/// Durations under a second use the largest fitting sub-second unit;
/// longer ones are written as hours, minutes and (fractional) seconds,
/// omitting leading zero components.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cmder_flag::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(60)), "1m0s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
/// assert_eq!(format_duration(Duration::from_micros(250)), "250µs");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        let (unit, scale) = if nanos < 1_000 {
            ("ns", 1)
        } else if nanos < 1_000_000 {
            ("µs", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        return format!("{}{unit}", fixed_point(nanos, scale));
    }

    let secs = nanos / NANOS_PER_SEC;
    let (hours, minutes) = (secs / 3_600, secs % 3_600 / 60);
    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let seconds = nanos - (hours * 3_600 + minutes * 60) * NANOS_PER_SEC;
    let _ = write!(out, "{}s", fixed_point(seconds, NANOS_PER_SEC));
    out
}

impl FlagType for Duration {
    fn kind() -> ValueKind {
        ValueKind::Duration
    }

    fn apply(&mut self, text: &str) -> Result<(), ValueError> {
        *self = parse_duration(text)?;
        Ok(())
    }

    fn render(&self) -> String {
        format_duration(*self)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_parse_compound_units() {
        let cases = [
            ("0", Duration::ZERO),
            ("0s", Duration::ZERO),
            ("-0", Duration::ZERO),
            ("-0.0ms", Duration::ZERO),
            ("+5s", Duration::from_secs(5)),
            ("300ms", Duration::from_millis(300)),
            ("1h15m", Duration::from_secs(4_500)),
            ("2h45m30.5s", Duration::from_millis(9_930_500)),
            ("1.5µs", Duration::from_nanos(1_500)),
            ("7us", Duration::from_micros(7)),
            (".5s", Duration::from_millis(500)),
            ("1.s", Duration::from_secs(1)),
            ("10ns", Duration::from_nanos(10)),
        ];
        for (text, expected) in cases {
            assert_eq!(parse_duration(text), Ok(expected), "{text}");
        }
    }

    #[test]
    fn test_parse_rejections() {
        let overflowing = [
            "94522879700260684295381835.9h",
            "18446744073709551616s",
        ];
        for text in ["", "s", "5", "-5s", "1d", "1.5.5s", ".s", "1m30"]
            .into_iter()
            .chain(overflowing)
        {
            assert_eq!(
                parse_duration(text),
                Err(ValueError::InvalidDuration(text.to_string())),
                "{text}"
            );
        }
    }

    #[test]
    fn test_format_canonical() {
        let cases = [
            (Duration::ZERO, "0s"),
            (Duration::from_nanos(999), "999ns"),
            (Duration::from_nanos(1_500), "1.5µs"),
            (Duration::from_millis(100), "100ms"),
            (Duration::from_secs(1), "1s"),
            (Duration::from_secs(90), "1m30s"),
            (Duration::from_secs(3_600), "1h0m0s"),
            (Duration::from_millis(61_250), "1m1.25s"),
            (Duration::from_secs(3_601), "1h0m1s"),
        ];
        for (duration, expected) in cases {
            assert_eq!(format_duration(duration), expected);
        }
    }

    proptest! {
        #[test]
        fn rendered_durations_parse_back(secs in 0u64..1_000_000, nanos in 0u32..1_000_000_000) {
            let duration = Duration::new(secs, nanos);
            prop_assert_eq!(parse_duration(&format_duration(duration)), Ok(duration));
        }
    }
}
