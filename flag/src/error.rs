//! Error types for flag registration, value conversion and parsing.

use thiserror::Error;

/// A flag value rejected its textual input.
///
/// Returned by [`Value::set`](crate::Value::set) implementations. Structured
/// variants carry the byte position of the offending character so callers can
/// point at it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Text is not one of the accepted boolean spellings.
    #[error("invalid boolean syntax: {0:?}")]
    InvalidBool(String),
    /// Text is not a valid integer literal.
    #[error("invalid integer syntax: {0:?}")]
    InvalidInt(String),
    /// Integer literal does not fit the target type.
    #[error("integer out of range: {0:?}")]
    IntOutOfRange(String),
    /// Text is not a valid floating-point literal.
    #[error("invalid float syntax: {0:?}")]
    InvalidFloat(String),
    /// Text is not a valid duration.
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),
    /// Text is not an RFC 3339 timestamp.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTime { value: String, reason: String },
    /// Structured (list or map) input is malformed.
    #[error("malformed value at position {position}: {reason}")]
    Malformed {
        position: usize,
        reason: &'static str,
    },
    /// Free-form failure reported by a custom value.
    #[error("{0}")]
    Custom(String),
}

impl ValueError {
    /// Builds a [`ValueError::Custom`] from any displayable message.
    pub fn custom(message: impl std::fmt::Display) -> Self {
        Self::Custom(message.to_string())
    }

    pub(crate) fn malformed(position: usize, reason: &'static str) -> Self {
        Self::Malformed { position, reason }
    }
}

/// A flag name was rejected at registration time.
///
/// These are programming errors in the flag wiring. [`FlagSet::var`] panics
/// with the message; [`FlagSet::try_var`] hands the error back instead.
///
/// [`FlagSet::var`]: crate::FlagSet::var
/// [`FlagSet::try_var`]: crate::FlagSet::try_var
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagNameError {
    #[error("flag name cannot be empty")]
    Empty,
    #[error("flag {0:?} begins with '-'")]
    LeadingDash(String),
    #[error("flag {0:?} ends with '-'")]
    TrailingDash(String),
    #[error("flag {name:?} contains illegal character {ch:?}")]
    IllegalCharacter { name: String, ch: char },
    #[error("flag redefined: {0}")]
    Duplicate(String),
}

/// Failure while parsing an argument vector or setting a flag by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// `-h` or `--help` was given and no flag by that name is registered.
    #[error("help requested")]
    HelpRequested,
    /// The named flag is not registered. The name carries its dashes when it
    /// came from the command line (`--all`, `-a`).
    #[error("flag '{0}' does not exist")]
    UnknownFlag(String),
    /// A non-boolean flag ended the argument vector without a value.
    #[error("missing argument to flag '{0}'")]
    MissingArgument(String),
    /// The flag's value rejected the supplied text.
    #[error("invalid value {value:?} for flag '{flag}': {source}")]
    InvalidValue {
        flag: String,
        value: String,
        #[source]
        source: ValueError,
    },
}

impl FlagError {
    /// Returns `true` for the help-requested control signal.
    pub fn is_help(&self) -> bool {
        matches!(self, Self::HelpRequested)
    }
}
