//! Error types for command execution.

use cmder_flag::{FlagError, ValueError};
use thiserror::Error;

/// Errors returned by [`execute`](crate::execute) and the configuration
/// loaders.
#[derive(Debug, Error)]
pub enum Error {
    /// The command tree is wired incorrectly.
    #[error("illegal command configuration: {0}")]
    IllegalConfiguration(String),

    /// Command-line arguments for `command` could not be parsed.
    #[error("{command}: {source}")]
    Parse {
        command: String,
        #[source]
        source: FlagError,
    },

    /// An environment variable held a value the flag rejected.
    #[error("failed to set flag '{flag}' from environment variable {variable}: {source}")]
    EnvironmentBind {
        flag: String,
        variable: String,
        #[source]
        source: ValueError,
    },

    /// A lifecycle hook asked for usage to be shown; usage of `command` has
    /// been rendered.
    #[error("{command}: {message}")]
    ShowUsage { command: String, message: String },

    /// A lifecycle hook failed. The hook's error is passed through as is.
    #[error(transparent)]
    Command(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// `true` when parsing stopped because `-h`/`--help` had no flag to bind.
    pub fn is_help(&self) -> bool {
        matches!(self, Self::Parse { source, .. } if source.is_help())
    }

    /// Conventional process exit status for this error.
    ///
    /// Argument and usage problems map to `2`, an unhandled help request to
    /// `0`, everything else to `1`.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Parse { source, .. } if source.is_help() => 0,
            Self::Parse { .. } | Self::EnvironmentBind { .. } | Self::ShowUsage { .. } => 2,
            _ => 1,
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let parse = Error::Parse {
            command: "app".to_string(),
            source: FlagError::UnknownFlag("--nope".to_string()),
        };
        assert_eq!(parse.exit_code(), 2);
        assert_eq!(parse.to_string(), "app: flag '--nope' does not exist");

        let help = Error::Parse {
            command: "app".to_string(),
            source: FlagError::HelpRequested,
        };
        assert!(help.is_help());
        assert_eq!(help.exit_code(), 0);

        let failed = Error::Command(anyhow::anyhow!("disk full"));
        assert_eq!(failed.exit_code(), 1);
        assert_eq!(failed.to_string(), "disk full");
    }

    #[test]
    fn test_environment_bind_message_names_variable() {
        let err = Error::EnvironmentBind {
            flag: "count".to_string(),
            variable: "APP_COUNT".to_string(),
            source: ValueError::InvalidInt("many".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "failed to set flag 'count' from environment variable APP_COUNT: invalid integer syntax: \"many\""
        );
        assert_eq!(err.exit_code(), 2);
    }
}
