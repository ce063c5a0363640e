//! Execution options.
//!
//! [`ExecuteConfig`] holds the plain settings and can be loaded from YAML.
//! [`ExecuteOptions`] adds the inputs that can't be serialised: arguments,
//! environment lookup and the usage writer. Anything left unset falls back to
//! the process defaults when [`execute`](crate::execute) starts.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::io::{self, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::usage::UsageStyle;

/// Looks up an environment variable by name.
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Serialisable execution settings.
///
/// ```
/// use cmder::{ExecuteConfig, UsageStyle};
///
/// let config = ExecuteConfig::from_yaml_str("bind_env: true\nenv_prefix: APP_\n").unwrap();
/// assert!(config.bind_env);
/// assert!(!config.interspersed);
/// assert_eq!(config.env_prefix, "APP_");
/// assert_eq!(config.usage_style, UsageStyle::Standard);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteConfig {
    /// Allow flags after positional arguments on leaf commands.
    pub interspersed: bool,
    /// Read flag defaults from environment variables.
    pub bind_env: bool,
    /// Prepended verbatim to every environment variable name.
    pub env_prefix: String,
    pub usage_style: UsageStyle,
}

impl ExecuteConfig {
    /// Loads settings from a file: JSON for a `.json` extension, YAML
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or doesn't parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = if path.extension() == Some(OsStr::new("json")) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(config)
    }

    /// Parses settings from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if `yaml` isn't a valid settings document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Inputs for one [`execute`](crate::execute) call.
#[derive(Default)]
pub struct ExecuteOptions {
    args: Option<Vec<String>>,
    config: ExecuteConfig,
    env: Option<EnvLookup>,
    usage_output: Option<Box<dyn Write>>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments to resolve, without the program name. Defaults to the
    /// process arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Lets leaf commands take flags after positional arguments.
    pub fn with_interspersed_args(mut self) -> Self {
        self.config.interspersed = true;
        self
    }

    /// Reads flag defaults from environment variables.
    pub fn with_environment_binding(mut self) -> Self {
        self.config.bind_env = true;
        self
    }

    /// Reads flag defaults from environment variables starting with
    /// `prefix`.
    pub fn with_prefixed_environment_binding(mut self, prefix: impl Into<String>) -> Self {
        self.config.bind_env = true;
        self.config.env_prefix = prefix.into();
        self
    }

    /// Replaces the process environment as the source of variables.
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.env = Some(Box::new(lookup));
        self
    }

    /// Uses a fixed set of variables instead of the process environment.
    pub fn with_env_vars<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.with_env_lookup(move |name| vars.get(name).cloned())
    }

    /// Destination of rendered usage text. Defaults to stderr.
    pub fn with_usage_output(mut self, out: impl Write + 'static) -> Self {
        self.usage_output = Some(Box::new(out));
        self
    }

    pub fn with_usage_style(mut self, style: UsageStyle) -> Self {
        self.config.usage_style = style;
        self
    }

    /// Replaces every serialisable setting at once.
    pub fn with_config(mut self, config: ExecuteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecuteConfig {
        &self.config
    }

    /// Fills every unset input from the process.
    pub(crate) fn resolve(self) -> Resolved {
        Resolved {
            args: self
                .args
                .unwrap_or_else(|| std::env::args().skip(1).collect()),
            config: self.config,
            env: self
                .env
                .unwrap_or_else(|| Box::new(|name: &str| std::env::var(name).ok())),
            usage_output: self
                .usage_output
                .unwrap_or_else(|| Box::new(io::stderr())),
        }
    }
}

impl fmt::Debug for ExecuteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteOptions")
            .field("args", &self.args)
            .field("config", &self.config)
            .field("env", &self.env.as_ref().map(|_| ".."))
            .field("usage_output", &self.usage_output.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Options with every default applied.
pub(crate) struct Resolved {
    pub args: Vec<String>,
    pub config: ExecuteConfig,
    pub env: EnvLookup,
    pub usage_output: Box<dyn Write>,
}
