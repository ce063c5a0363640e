//! String list and string map values, and the quoting convention they share.
//!
//! Both forms are comma-separated. Double quotes protect commas, `=` and
//! whitespace; inside quotes `\"` and `\\` are escapes. Unquoted whitespace
//! at the edges of an entry, key or value is trimmed, interior whitespace is
//! kept.
//!
//! ```text
//! --tag alpha,"beta, gamma"          -> ["alpha", "beta, gamma"]
//! --env HOME=/root, MOTD="hi, there" -> {HOME: "/root", MOTD: "hi, there"}
//! ```
//!
//! Input is parsed completely before the target is touched, so a malformed
//! value never leaves a partial update behind.

use std::collections::BTreeMap;

use crate::error::ValueError;
use crate::value::{FlagType, ValueKind};

/// Characters of one field, each tagged with whether it was quoted.
#[derive(Default)]
struct Field {
    chars: Vec<(char, bool)>,
    quoted: bool,
}

impl Field {
    fn push(&mut self, c: char, quoted: bool) {
        self.chars.push((c, quoted));
    }

    /// Field text with unquoted edge whitespace removed.
    fn finish(&self) -> String {
        let loose = |&(c, quoted): &(char, bool)| !quoted && c.is_whitespace();
        let start = self
            .chars
            .iter()
            .position(|ch| !loose(ch))
            .unwrap_or(self.chars.len());
        let end = self
            .chars
            .iter()
            .rposition(|ch| !loose(ch))
            .map_or(start, |i| i + 1);
        self.chars[start..end].iter().map(|&(c, _)| c).collect()
    }

    fn is_blank(&self) -> bool {
        !self.quoted && self.finish().is_empty()
    }
}

/// Tracks an open quote and a pending escape.
#[derive(Default)]
struct Quote {
    open_at: Option<usize>,
    escaped: bool,
}

impl Quote {
    /// Feeds a character seen inside quotes; returns it if it is content.
    fn inside(&mut self, c: char) -> Option<char> {
        if self.escaped {
            self.escaped = false;
            return Some(c);
        }
        match c {
            '\\' => {
                self.escaped = true;
                None
            }
            '"' => {
                self.open_at = None;
                None
            }
            _ => Some(c),
        }
    }

    fn check_closed(&self) -> Result<(), ValueError> {
        match self.open_at {
            Some(position) => Err(ValueError::malformed(position, "unterminated quote")),
            None => Ok(()),
        }
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Parses a comma-separated list of entries.
///
/// # Errors
///
/// Fails on an unterminated quote or on an empty unquoted entry (`a,,b`,
/// a trailing comma, empty input). Write `""` for an empty entry.
///
/// # Examples
///
/// ```
/// use cmder_flag::parse_list;
///
/// let items = parse_list(r#"alpha, "beta, gamma" ,"""#).unwrap();
/// assert_eq!(items, ["alpha", "beta, gamma", ""]);
/// assert!(parse_list("alpha,,beta").is_err());
/// ```
pub fn parse_list(text: &str) -> Result<Vec<String>, ValueError> {
    let mut items = Vec::new();
    let mut field = Field::default();
    let mut quote = Quote::default();

    for (position, c) in text.char_indices() {
        if quote.open_at.is_some() {
            if let Some(c) = quote.inside(c) {
                field.push(c, true);
            }
            continue;
        }
        match c {
            '"' => {
                quote.open_at = Some(position);
                field.quoted = true;
            }
            ',' => {
                if field.is_blank() {
                    return Err(ValueError::malformed(position, "empty entry"));
                }
                items.push(std::mem::take(&mut field).finish());
            }
            _ => field.push(c, false),
        }
    }

    quote.check_closed()?;
    if field.is_blank() {
        return Err(ValueError::malformed(text.len(), "empty entry"));
    }
    items.push(field.finish());
    Ok(items)
}

/// Renders list entries in canonical form, quoting only where needed.
pub fn format_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| {
            let needs_quotes = item.is_empty()
                || item.contains([',', '"'])
                || item.starts_with(char::is_whitespace)
                || item.ends_with(char::is_whitespace);
            if needs_quotes {
                quote(item)
            } else {
                item.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses comma-separated `key=value` pairs.
///
/// Only values may be quoted. The first unquoted `=` of a pair separates key
/// from value; later ones are part of the value. Later duplicates of a key
/// win.
///
/// # Errors
///
/// Fails with the byte position of the problem on a quote in a key, a pair
/// without `=`, an empty key, a trailing comma or an unterminated quote.
///
/// # Examples
///
/// ```
/// use cmder_flag::parse_map;
///
/// let map = parse_map(r#"HELLO = WORLD, GREETING="hi, there""#).unwrap();
/// assert_eq!(map["HELLO"], "WORLD");
/// assert_eq!(map["GREETING"], "hi, there");
///
/// assert!(parse_map(r#""HELLO"=WORLD"#).is_err());
/// assert!(parse_map("HELLO=WORLD,").is_err());
/// ```
pub fn parse_map(text: &str) -> Result<BTreeMap<String, String>, ValueError> {
    let mut entries = BTreeMap::new();
    let mut key = Field::default();
    let mut value = Field::default();
    let mut in_value = false;
    let mut quote = Quote::default();

    let missing = |key: &Field, position: usize| {
        let reason = if key.is_blank() {
            "missing key"
        } else {
            "missing value"
        };
        ValueError::malformed(position, reason)
    };

    for (position, c) in text.char_indices() {
        if quote.open_at.is_some() {
            if let Some(c) = quote.inside(c) {
                value.push(c, true);
            }
            continue;
        }
        match c {
            '"' if !in_value => {
                return Err(ValueError::malformed(position, "quote in key position"));
            }
            '"' => {
                quote.open_at = Some(position);
                value.quoted = true;
            }
            '=' if !in_value => {
                if key.is_blank() {
                    return Err(ValueError::malformed(position, "missing key"));
                }
                in_value = true;
            }
            ',' if !in_value => return Err(missing(&key, position)),
            ',' => {
                entries.insert(
                    std::mem::take(&mut key).finish(),
                    std::mem::take(&mut value).finish(),
                );
                in_value = false;
            }
            _ if in_value => value.push(c, false),
            _ => key.push(c, false),
        }
    }

    quote.check_closed()?;
    if !in_value {
        return Err(missing(&key, text.len()));
    }
    entries.insert(key.finish(), value.finish());
    Ok(entries)
}

/// Renders a map as `key="value"` pairs in key order.
pub fn format_map(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(key, value)| format!("{key}={}", quote(value)))
        .collect::<Vec<_>>()
        .join(",")
}

impl FlagType for Vec<String> {
    fn kind() -> ValueKind {
        ValueKind::Strings
    }

    /// Appends the parsed entries.
    fn apply(&mut self, text: &str) -> Result<(), ValueError> {
        self.extend(parse_list(text)?);
        Ok(())
    }

    fn render(&self) -> String {
        format_list(self)
    }
}

impl FlagType for BTreeMap<String, String> {
    fn kind() -> ValueKind {
        ValueKind::Map
    }

    /// Merges the parsed pairs; incoming keys override existing ones.
    fn apply(&mut self, text: &str) -> Result<(), ValueError> {
        self.extend(parse_map(text)?);
        Ok(())
    }

    fn render(&self) -> String {
        format_map(self)
    }
}
