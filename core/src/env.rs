//! Environment variables as flag defaults.

use std::sync::LazyLock;

use cmder_flag::{FlagError, FlagSet, ValueError};
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static regex must compile"));

fn component(text: &str) -> String {
    NON_ALPHANUMERIC.replace_all(text, "").to_uppercase()
}

/// Environment variable consulted for flag `flag` of the command at `path`.
///
/// `path` runs from the root command to the command owning the flag. Each
/// component loses every character outside `[A-Za-z0-9]` and is upper-cased;
/// components are joined with `_` and `prefix` is prepended as is.
///
/// ```
/// use cmder::env_var_name;
///
/// assert_eq!(env_var_name("", &["bind-env", "show"], "count"), "BINDENV_SHOW_COUNT");
/// assert_eq!(env_var_name("MY_", &["app"], "web.listen-addr"), "MY_APP_WEBLISTENADDR");
/// ```
pub fn env_var_name<S: AsRef<str>>(prefix: &str, path: &[S], flag: &str) -> String {
    let parts: Vec<String> = path
        .iter()
        .map(|p| component(p.as_ref()))
        .chain(std::iter::once(component(flag)))
        .collect();
    format!("{prefix}{}", parts.join("_"))
}

/// Applies environment variables to the flags of `fs` as defaults.
///
/// Flags named in `skip` are left alone. Values are set without marking the
/// flag as explicitly set, so a later parse of the command line overrides
/// them.
///
/// Collection flags (string lists and maps) merge on every set, so the
/// environment value is a starting point rather than a default: occurrences
/// on the command line are added to it instead of replacing it.
///
/// # Errors
///
/// Returns [`Error::EnvironmentBind`] naming the variable when a flag rejects
/// its value.
pub fn bind_environment<S: AsRef<str>>(
    fs: &mut FlagSet,
    path: &[S],
    prefix: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    skip: &[&str],
) -> Result<()> {
    let names: Vec<String> = fs
        .flags()
        .map(|f| f.name().to_string())
        .filter(|name| !skip.contains(&name.as_str()))
        .collect();

    for name in names {
        let variable = env_var_name(prefix, path, &name);
        let Some(text) = lookup(&variable) else {
            continue;
        };
        debug!(flag = %name, variable = %variable, "applying environment variable");
        fs.set_implicit(&name, &text).map_err(|e| {
            let source = match e {
                FlagError::InvalidValue { source, .. } => source,
                other => ValueError::custom(other.to_string()),
            };
            Error::EnvironmentBind {
                flag: name.clone(),
                variable,
                source,
            }
        })?;
    }
    Ok(())
}
