//! The flag registry.
//!
//! A [`FlagSet`] maps flag names to [`Flag`]s. Single-character names are
//! short flags (`-c`), longer names are long flags (`--count`). Short/long
//! pairs are aliases: two names registered against the same shared value.
//!
//! # Examples
//!
//! ```
//! use cmder_flag::FlagSet;
//!
//! let mut fs = FlagSet::new("show");
//! let count = fs.uint("count", 12, "number of `results`");
//! fs.alias("count", "c");
//!
//! fs.parse(["-c", "20", "extra"]).unwrap();
//!
//! assert_eq!(count.get(), 20);
//! assert!(fs.is_set("c"));
//! assert_eq!(fs.args(), ["extra"]);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::error::{FlagError, FlagNameError, ValueError};
use crate::value::{
    BoolFuncValue, FlagType, FuncValue, Hidden, SharedValue, TextValue, Value, ValueKind, Var,
    value_identity,
};

/// A registered flag.
#[derive(Clone)]
pub struct Flag {
    name: String,
    usage: String,
    value: SharedValue,
    default: String,
}

impl Flag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Text of the value at registration time.
    pub fn default_text(&self) -> &str {
        &self.default
    }

    pub fn value(&self) -> &SharedValue {
        &self.value
    }

    /// Current value as text.
    pub fn text(&self) -> String {
        self.value.borrow().to_text()
    }

    pub fn is_bool(&self) -> bool {
        self.value.borrow().is_bool_flag()
    }

    pub fn is_hidden(&self) -> bool {
        self.value.borrow().is_hidden()
    }

    pub fn kind(&self) -> ValueKind {
        self.value.borrow().kind()
    }

    /// `true` for single-character names.
    pub fn is_short(&self) -> bool {
        self.name.chars().count() == 1
    }

    /// Identity of the underlying value; aliases share it.
    pub fn identity(&self) -> usize {
        value_identity(&self.value)
    }

    /// Extracts the placeholder name and cleaned usage text.
    ///
    /// The first back-quoted word of the usage text names the placeholder and
    /// loses its quotes. Without one, the placeholder comes from the value
    /// kind. Boolean flags never have a placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmder_flag::FlagSet;
    ///
    /// let mut fs = FlagSet::new("cp");
    /// fs.string("output", "-", "write to `file`");
    /// fs.uint("count", 0, "number of results");
    /// fs.bool("all", false, "show `all`");
    ///
    /// let output = fs.lookup("output").unwrap().unquote_usage();
    /// assert_eq!(output, ("file".to_string(), "write to file".to_string()));
    /// assert_eq!(fs.lookup("count").unwrap().unquote_usage().0, "uint");
    /// assert_eq!(fs.lookup("all").unwrap().unquote_usage().0, "");
    /// ```
    pub fn unquote_usage(&self) -> (String, String) {
        let usage = &self.usage;
        let quoted = usage
            .find('`')
            .and_then(|open| Some((open, usage[open + 1..].find('`')?)));
        if let Some((open, len)) = quoted {
            let name = &usage[open + 1..open + 1 + len];
            let cleaned = format!("{}{}{}", &usage[..open], name, &usage[open + 2 + len..]);
            let name = if self.is_bool() { "" } else { name };
            return (name.to_string(), cleaned);
        }
        (self.kind().placeholder().to_string(), usage.clone())
    }
}

impl std::fmt::Debug for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("value", &self.text())
            .field("default", &self.default)
            .finish()
    }
}

/// Checks a flag name against the allowed alphabet `[A-Za-z0-9.-]`.
///
/// Names may not be empty or begin or end with `-`.
pub fn validate_flag_name(name: &str) -> Result<(), FlagNameError> {
    if name.is_empty() {
        return Err(FlagNameError::Empty);
    }
    if name.starts_with('-') {
        return Err(FlagNameError::LeadingDash(name.to_string()));
    }
    if name.ends_with('-') {
        return Err(FlagNameError::TrailingDash(name.to_string()));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.')))
    {
        return Err(FlagNameError::IllegalCharacter {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

/// A set of named flags and the state of its most recent parse.
#[derive(Debug)]
pub struct FlagSet {
    name: String,
    flags: BTreeMap<String, Flag>,
    set: BTreeSet<String>,
    pub(crate) args: Vec<String>,
    pub(crate) parsed: bool,
    pub(crate) terminated: bool,
}

impl FlagSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: BTreeMap::new(),
            set: BTreeSet::new(),
            args: Vec::new(),
            parsed: false,
            terminated: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a shared value under `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`FlagNameError`] if the name is malformed or already taken.
    pub fn try_var_shared(
        &mut self,
        value: SharedValue,
        name: &str,
        usage: &str,
    ) -> Result<(), FlagNameError> {
        validate_flag_name(name)?;
        if self.flags.contains_key(name) {
            return Err(FlagNameError::Duplicate(name.to_string()));
        }
        let default = value.borrow().to_text();
        self.flags.insert(
            name.to_string(),
            Flag {
                name: name.to_string(),
                usage: usage.to_string(),
                value,
                default,
            },
        );
        Ok(())
    }

    /// Registers `value` under `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`FlagNameError`] if the name is malformed or already taken.
    pub fn try_var(
        &mut self,
        value: impl Value + 'static,
        name: &str,
        usage: &str,
    ) -> Result<(), FlagNameError> {
        self.try_var_shared(Rc::new(RefCell::new(value)), name, usage)
    }

    /// Registers `value` under `name`.
    ///
    /// # Panics
    ///
    /// Panics if the name is malformed or already registered. Both are
    /// mistakes in the program's flag definitions.
    pub fn var(&mut self, value: impl Value + 'static, name: &str, usage: &str) {
        if let Err(e) = self.try_var(value, name, usage) {
            panic!("{}: {e}", self.name);
        }
    }

    /// Registers the value of flag `name` again under `alias`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not registered or `alias` is not a valid, unused
    /// name.
    pub fn alias(&mut self, name: &str, alias: &str) {
        let Some(flag) = self.flags.get(name) else {
            panic!("{}: cannot alias unknown flag {name:?}", self.name);
        };
        let (value, usage) = (Rc::clone(&flag.value), flag.usage.clone());
        if let Err(e) = self.try_var_shared(value, alias, &usage) {
            panic!("{}: {e}", self.name);
        }
    }

    /// Hides flag `name` from listings. Its aliases stay visible.
    ///
    /// Returns `false` if no such flag exists.
    pub fn hide(&mut self, name: &str) -> bool {
        let Some(flag) = self.flags.get_mut(name) else {
            return false;
        };
        let hidden: SharedValue = Rc::new(RefCell::new(Hidden(Rc::clone(&flag.value))));
        flag.value = hidden;
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    /// Sets flag `name` from text and records it as explicitly set.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::UnknownFlag`] if no such flag exists, or
    /// [`FlagError::InvalidValue`] if the value rejects the text.
    pub fn set(&mut self, name: &str, text: &str) -> Result<(), FlagError> {
        self.apply(name, name, text)?;
        self.set.insert(name.to_string());
        Ok(())
    }

    /// Sets flag `name` from text without recording it as explicitly set.
    ///
    /// Used for defaults that come from outside the command line.
    ///
    /// # Errors
    ///
    /// Same as [`FlagSet::set`].
    pub fn set_implicit(&mut self, name: &str, text: &str) -> Result<(), FlagError> {
        self.apply(name, name, text)
    }

    /// Applies `text` to flag `name`; `spelling` is how the flag appears in
    /// errors.
    pub(crate) fn apply(&self, name: &str, spelling: &str, text: &str) -> Result<(), FlagError> {
        let flag = self
            .flags
            .get(name)
            .ok_or_else(|| FlagError::UnknownFlag(spelling.to_string()))?;
        flag.value
            .borrow_mut()
            .set(text)
            .map_err(|source| FlagError::InvalidValue {
                flag: spelling.to_string(),
                value: text.to_string(),
                source,
            })
    }

    pub(crate) fn mark_set(&mut self, name: &str) {
        self.set.insert(name.to_string());
    }

    /// Returns `true` if flag `name` was set on the command line or through
    /// [`FlagSet::set`].
    pub fn is_set(&self, name: &str) -> bool {
        self.set.contains(name)
    }

    /// All flags in name order.
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    /// Explicitly set flags in name order.
    pub fn set_flags(&self) -> impl Iterator<Item = &Flag> {
        self.set.iter().filter_map(|name| self.flags.get(name))
    }

    /// Arguments left over after the last parse.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    /// Number of flags that have been set.
    pub fn num_flags(&self) -> usize {
        self.set.len()
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// `true` if the last parse stopped at a `--` terminator.
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Writes one entry per visible flag, in name order.
    ///
    /// ```text
    ///    -c <uint> (default 12)
    ///         number of results
    ///   --output <file> (default "-")
    ///         output file location
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_defaults(&self, out: &mut dyn Write) -> io::Result<()> {
        for flag in self.flags().filter(|f| !f.is_hidden()) {
            let (placeholder, usage) = flag.unquote_usage();
            let mut line = if flag.is_short() {
                format!("   -{}", flag.name)
            } else {
                format!("  --{}", flag.name)
            };
            if !placeholder.is_empty() {
                line.push_str(&format!(" <{placeholder}>"));
            }
            if !flag.default.is_empty() {
                if flag.kind() == ValueKind::String {
                    line.push_str(&format!(" (default {:?})", flag.default));
                } else {
                    line.push_str(&format!(" (default {})", flag.default));
                }
            }
            writeln!(out, "{line}")?;
            writeln!(out, "        {}", usage.replace('\n', "\n        "))?;
        }
        Ok(())
    }

    /// Registers a typed value initialised to `default` and returns its
    /// handle.
    pub fn typed<T: FlagType + 'static>(&mut self, name: &str, default: T, usage: &str) -> Var<T> {
        let var = Var::new(default);
        self.var(var.clone(), name, usage);
        var
    }

    /// Stores `default` in `var` and registers it under `name`.
    pub fn typed_var<T: FlagType + 'static>(
        &mut self,
        var: &Var<T>,
        name: &str,
        default: T,
        usage: &str,
    ) {
        var.replace(default);
        self.var(var.clone(), name, usage);
    }

    pub fn bool(&mut self, name: &str, default: bool, usage: &str) -> Var<bool> {
        self.typed(name, default, usage)
    }

    pub fn bool_var(&mut self, var: &Var<bool>, name: &str, default: bool, usage: &str) {
        self.typed_var(var, name, default, usage);
    }

    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> Var<String> {
        self.typed(name, default.to_string(), usage)
    }

    pub fn string_var(&mut self, var: &Var<String>, name: &str, default: &str, usage: &str) {
        self.typed_var(var, name, default.to_string(), usage);
    }

    pub fn int(&mut self, name: &str, default: i64, usage: &str) -> Var<i64> {
        self.typed(name, default, usage)
    }

    pub fn int_var(&mut self, var: &Var<i64>, name: &str, default: i64, usage: &str) {
        self.typed_var(var, name, default, usage);
    }

    pub fn uint(&mut self, name: &str, default: u64, usage: &str) -> Var<u64> {
        self.typed(name, default, usage)
    }

    pub fn uint_var(&mut self, var: &Var<u64>, name: &str, default: u64, usage: &str) {
        self.typed_var(var, name, default, usage);
    }

    pub fn float(&mut self, name: &str, default: f64, usage: &str) -> Var<f64> {
        self.typed(name, default, usage)
    }

    pub fn float_var(&mut self, var: &Var<f64>, name: &str, default: f64, usage: &str) {
        self.typed_var(var, name, default, usage);
    }

    pub fn duration(&mut self, name: &str, default: Duration, usage: &str) -> Var<Duration> {
        self.typed(name, default, usage)
    }

    pub fn duration_var(&mut self, var: &Var<Duration>, name: &str, default: Duration, usage: &str) {
        self.typed_var(var, name, default, usage);
    }

    pub fn time(
        &mut self,
        name: &str,
        default: DateTime<FixedOffset>,
        usage: &str,
    ) -> Var<DateTime<FixedOffset>> {
        self.typed(name, default, usage)
    }

    /// Registers a list flag; every occurrence appends its entries.
    pub fn strings(&mut self, name: &str, usage: &str) -> Var<Vec<String>> {
        self.typed(name, Vec::new(), usage)
    }

    /// Registers an existing list; its current entries become the default.
    pub fn strings_var(&mut self, var: &Var<Vec<String>>, name: &str, usage: &str) {
        self.var(var.clone(), name, usage);
    }

    /// Registers a `key=value` map flag; every occurrence merges its pairs.
    pub fn map(&mut self, name: &str, usage: &str) -> Var<BTreeMap<String, String>> {
        self.typed(name, BTreeMap::new(), usage)
    }

    /// Registers an existing map; its current pairs become the default.
    pub fn map_var(&mut self, var: &Var<BTreeMap<String, String>>, name: &str, usage: &str) {
        self.var(var.clone(), name, usage);
    }

    /// Registers a flag for any type parsed with `FromStr` and rendered with
    /// `Display`, and returns its handle.
    pub fn text<T>(&mut self, name: &str, default: T, usage: &str) -> Var<T>
    where
        T: FromStr + fmt::Display + 'static,
        T::Err: fmt::Display,
    {
        let var = Var::new(default);
        self.text_var(&var, name, usage);
        var
    }

    /// Registers `var` as a text flag; its current value becomes the default.
    pub fn text_var<T>(&mut self, var: &Var<T>, name: &str, usage: &str)
    where
        T: FromStr + fmt::Display + 'static,
        T::Err: fmt::Display,
    {
        self.var(TextValue::new(var.clone()), name, usage);
    }

    /// Registers a flag that calls `f` with each value given.
    pub fn func(
        &mut self,
        name: &str,
        usage: &str,
        f: impl FnMut(&str) -> Result<(), ValueError> + 'static,
    ) {
        self.var(FuncValue::new(f), name, usage);
    }

    /// Registers a boolean flag that calls `f` with each value given
    /// (`"true"` when none is).
    pub fn bool_func(
        &mut self,
        name: &str,
        usage: &str,
        f: impl FnMut(&str) -> Result<(), ValueError> + 'static,
    ) {
        self.var(BoolFuncValue::new(f), name, usage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_flag_name() {
        assert_eq!(validate_flag_name("web.listen-address"), Ok(()));
        assert_eq!(validate_flag_name("c"), Ok(()));
        assert_eq!(validate_flag_name(""), Err(FlagNameError::Empty));
        assert_eq!(
            validate_flag_name("-a"),
            Err(FlagNameError::LeadingDash("-a".to_string()))
        );
        assert_eq!(
            validate_flag_name("all-"),
            Err(FlagNameError::TrailingDash("all-".to_string()))
        );
        assert_eq!(
            validate_flag_name("a=b"),
            Err(FlagNameError::IllegalCharacter {
                name: "a=b".to_string(),
                ch: '='
            })
        );
        assert!(validate_flag_name("naïve").is_err());
    }

    #[test]
    fn test_try_var_rejects_duplicates() {
        let mut fs = FlagSet::new("test");
        fs.try_var(Var::new(1i64), "count", "").unwrap();
        assert_eq!(
            fs.try_var(Var::new(2i64), "count", ""),
            Err(FlagNameError::Duplicate("count".to_string()))
        );
    }

    #[test]
    #[should_panic(expected = "flag redefined: count")]
    fn test_var_panics_on_duplicate() {
        let mut fs = FlagSet::new("test");
        fs.uint("count", 0, "");
        fs.uint("count", 0, "");
    }

    #[test]
    #[should_panic(expected = "begins with '-'")]
    fn test_var_panics_on_dashed_name() {
        FlagSet::new("test").bool("-a", false, "");
    }

    #[test]
    #[should_panic(expected = "cannot alias unknown flag")]
    fn test_alias_panics_on_missing_target() {
        FlagSet::new("test").alias("count", "c");
    }

    #[test]
    fn test_typed_var_updates_default() {
        let mut fs = FlagSet::new("test");
        let output = Var::new(String::new());
        fs.string_var(&output, "output", "-", "output file");
        assert_eq!(output.get(), "-");
        assert_eq!(fs.lookup("output").unwrap().default_text(), "-");
    }

    #[test]
    fn test_text_flag_parses_user_types() {
        use std::net::SocketAddr;

        let mut fs = FlagSet::new("test");
        let listen = fs.text("listen", SocketAddr::from(([0, 0, 0, 0], 8080)), "listen `address`");
        fs.alias("listen", "l");
        assert_eq!(fs.lookup("listen").unwrap().default_text(), "0.0.0.0:8080");
        assert_eq!(fs.lookup("listen").unwrap().kind(), ValueKind::Other);

        fs.parse(["-l", "127.0.0.1:9000"]).unwrap();
        assert_eq!(listen.get(), SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(fs.lookup("listen").unwrap().text(), "127.0.0.1:9000");

        let err = fs.set("listen", "localhost").unwrap_err();
        assert!(matches!(
            err,
            FlagError::InvalidValue { ref flag, source: ValueError::Custom(_), .. } if flag == "listen"
        ));
        assert_eq!(listen.get().port(), 9000);

        let retries = Var::new(3u8);
        fs.text_var(&retries, "retries", "");
        assert_eq!(fs.lookup("retries").unwrap().default_text(), "3");
    }

    #[test]
    fn test_lookup_is_pure() {
        let mut fs = FlagSet::new("test");
        fs.bool("all", false, "");
        assert!(fs.lookup("all").is_some());
        assert!(fs.lookup("missing").is_none());
        assert!(!fs.is_set("all"));
        assert_eq!(fs.num_flags(), 0);
    }

    #[test]
    fn test_set_records_explicit_flags() {
        let mut fs = FlagSet::new("test");
        let count = fs.uint("count", 0, "");
        fs.alias("count", "c");
        fs.bool("all", false, "");

        fs.set("c", "9").unwrap();
        assert_eq!(count.get(), 9);
        assert!(fs.is_set("c"));
        assert!(!fs.is_set("count"));

        let names: Vec<&str> = fs.set_flags().map(Flag::name).collect();
        assert_eq!(names, ["c"]);
        let all: Vec<&str> = fs.flags().map(Flag::name).collect();
        assert_eq!(all, ["all", "c", "count"]);

        assert_eq!(
            fs.set("missing", "x"),
            Err(FlagError::UnknownFlag("missing".to_string()))
        );
    }

    #[test]
    fn test_set_implicit_is_not_recorded() {
        let mut fs = FlagSet::new("test");
        let count = fs.uint("count", 0, "");
        fs.set_implicit("count", "3").unwrap();
        assert_eq!(count.get(), 3);
        assert!(!fs.is_set("count"));
    }

    #[test]
    fn test_set_reports_invalid_value() {
        let mut fs = FlagSet::new("test");
        fs.uint("count", 7, "");
        let err = fs.set("count", "-1").unwrap_err();
        assert_eq!(
            err,
            FlagError::InvalidValue {
                flag: "count".to_string(),
                value: "-1".to_string(),
                source: ValueError::InvalidInt("-1".to_string()),
            }
        );
        assert_eq!(fs.lookup("count").unwrap().text(), "7");
    }

    #[test]
    fn test_alias_shares_identity() {
        let mut fs = FlagSet::new("test");
        fs.uint("count", 12, "");
        fs.alias("count", "c");
        fs.uint("other", 12, "");
        let id = |name| fs.lookup(name).unwrap().identity();
        assert_eq!(id("c"), id("count"));
        assert_ne!(id("c"), id("other"));
    }

    #[test]
    fn test_hide_keeps_identity_and_parses() {
        let mut fs = FlagSet::new("test");
        let debug = fs.bool("debug", false, "");
        fs.alias("debug", "d");
        let before = fs.lookup("debug").unwrap().identity();

        assert!(fs.hide("debug"));
        assert!(!fs.hide("missing"));

        let flag = fs.lookup("debug").unwrap();
        assert!(flag.is_hidden());
        assert!(flag.is_bool());
        assert_eq!(flag.identity(), before);
        assert!(!fs.lookup("d").unwrap().is_hidden());

        fs.set("debug", "true").unwrap();
        assert!(debug.get());
    }

    #[test]
    fn test_write_defaults_single_flags() {
        let mut fs = FlagSet::new("test");
        fs.uint("c", 12, "number of results");
        let mut out = Vec::new();
        fs.write_defaults(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "   -c <uint> (default 12)\n        number of results\n"
        );

        let mut fs = FlagSet::new("test");
        fs.uint("count", 12, "number of results");
        let mut out = Vec::new();
        fs.write_defaults(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "  --count <uint> (default 12)\n        number of results\n"
        );
    }

    #[test]
    fn test_write_defaults_lexical_order() {
        let mut fs = FlagSet::new("test");
        fs.string("output", "-", "output `file`");
        fs.alias("output", "o");
        fs.uint("count", 12, "number of `number`s");
        fs.alias("count", "c");
        fs.bool("all", false, "show all");
        fs.alias("all", "a");
        fs.bool("secret", false, "not listed");
        fs.hide("secret");

        let mut out = Vec::new();
        fs.write_defaults(&mut out).unwrap();
        let expected = r#"   -a (default false)
        show all
  --all (default false)
        show all
   -c <number> (default 12)
        number of numbers
  --count <number> (default 12)
        number of numbers
   -o <file> (default "-")
        output file
  --output <file> (default "-")
        output file
"#;
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}
