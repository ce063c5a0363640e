//! RFC 3339 timestamp values.

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::error::ValueError;
use crate::value::{FlagType, ValueKind};

impl FlagType for DateTime<FixedOffset> {
    fn kind() -> ValueKind {
        ValueKind::Time
    }

    fn apply(&mut self, text: &str) -> Result<(), ValueError> {
        *self = DateTime::parse_from_rfc3339(text).map_err(|e| ValueError::InvalidTime {
            value: text.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// RFC 3339 with `Z` for UTC and fractional seconds only when present.
    fn render(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}
