//! Boolean, integer, floating-point and string values.

use crate::error::ValueError;
use crate::value::{FlagType, ValueKind};

/// Parses the conventional boolean spellings, ignoring case.
///
/// # Examples
///
/// ```
/// use cmder_flag::parse_bool;
///
/// assert_eq!(parse_bool("T"), Ok(true));
/// assert_eq!(parse_bool("0"), Ok(false));
/// assert!(parse_bool("yes").is_err());
/// ```
pub fn parse_bool(text: &str) -> Result<bool, ValueError> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(ValueError::InvalidBool(text.to_string())),
    }
}

/// Splits an integer literal into sign, radix and digits.
///
/// Accepts an optional sign followed by decimal digits or a `0x`, `0o` or
/// `0b` prefixed literal. Underscore separators are only allowed after a
/// prefix.
fn split_int(text: &str) -> Result<(bool, u32, String), ValueError> {
    let invalid = || ValueError::InvalidInt(text.to_string());
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let lower = rest.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else {
        (10, lower.as_str())
    };

    if radix == 10 && digits.contains('_') {
        return Err(invalid());
    }
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }
    Ok((negative, radix, digits))
}

/// Parses a signed integer literal into a 128-bit intermediate.
pub(crate) fn parse_signed(text: &str) -> Result<i128, ValueError> {
    let (negative, radix, digits) = split_int(text)?;
    let magnitude = u128::from_str_radix(&digits, radix)
        .map_err(|_| ValueError::IntOutOfRange(text.to_string()))?;
    let magnitude =
        i128::try_from(magnitude).map_err(|_| ValueError::IntOutOfRange(text.to_string()))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parses an unsigned integer literal; a leading `-` is rejected.
pub(crate) fn parse_unsigned(text: &str) -> Result<u128, ValueError> {
    let (negative, radix, digits) = split_int(text)?;
    if negative {
        return Err(ValueError::InvalidInt(text.to_string()));
    }
    u128::from_str_radix(&digits, radix).map_err(|_| ValueError::IntOutOfRange(text.to_string()))
}

impl FlagType for bool {
    fn kind() -> ValueKind {
        ValueKind::Bool
    }

    fn is_bool_flag() -> bool {
        true
    }

    fn apply(&mut self, text: &str) -> Result<(), ValueError> {
        *self = parse_bool(text)?;
        Ok(())
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

macro_rules! int_flag_type {
    ($parse:ident, $kind:ident: $($ty:ty),+) => {$(
        impl FlagType for $ty {
            fn kind() -> ValueKind {
                ValueKind::$kind
            }

            fn apply(&mut self, text: &str) -> Result<(), ValueError> {
                *self = <$ty>::try_from($parse(text)?)
                    .map_err(|_| ValueError::IntOutOfRange(text.to_string()))?;
                Ok(())
            }

            fn render(&self) -> String {
                self.to_string()
            }
        }
    )+};
}

int_flag_type!(parse_signed, Int: i8, i16, i32, i64, isize);
int_flag_type!(parse_unsigned, Uint: u8, u16, u32, u64, usize);

macro_rules! float_flag_type {
    ($($ty:ty),+) => {$(
        impl FlagType for $ty {
            fn kind() -> ValueKind {
                ValueKind::Float
            }

            fn apply(&mut self, text: &str) -> Result<(), ValueError> {
                *self = text
                    .parse::<$ty>()
                    .map_err(|_| ValueError::InvalidFloat(text.to_string()))?;
                Ok(())
            }

            fn render(&self) -> String {
                self.to_string()
            }
        }
    )+};
}

float_flag_type!(f32, f64);

impl FlagType for String {
    fn kind() -> ValueKind {
        ValueKind::String
    }

    fn apply(&mut self, text: &str) -> Result<(), ValueError> {
        text.clone_into(self);
        Ok(())
    }

    fn render(&self) -> String {
        self.clone()
    }
}
