//! getopt-style argument parsing.
//!
//! | Argument       | Meaning                                              |
//! |----------------|------------------------------------------------------|
//! | `-`            | positional; parsing stops, `-` is the first residual |
//! | `--`           | terminator; parsing stops, `--` is dropped           |
//! | `--name=value` | long flag with inline value                          |
//! | `--name`       | long flag; booleans take `true`, others the next arg |
//! | `-abc`         | clustered short flags                                |
//! | `-ovalue`      | short flag with stuck value                          |
//! | anything else  | positional; parsing stops                            |
//!
//! In a short cluster, boolean flags are set to `true` and scanning moves to
//! the next character. The first non-boolean flag takes the rest of the
//! token as its value, or the next argument when nothing is left, and ends
//! the token.

use crate::error::FlagError;
use crate::flagset::FlagSet;

impl FlagSet {
    /// Parses `args` against the registered flags.
    ///
    /// Parsed flags are recorded as set. Whatever follows the last flag is
    /// available from [`FlagSet::args`]. A later occurrence of a flag
    /// overrides an earlier one.
    ///
    /// # Errors
    ///
    /// - [`FlagError::HelpRequested`] for `-h`/`--help` when no such flag is
    ///   registered.
    /// - [`FlagError::UnknownFlag`] for any other unregistered flag.
    /// - [`FlagError::MissingArgument`] when a flag that needs a value ends
    ///   the arguments.
    /// - [`FlagError::InvalidValue`] when a value rejects its text.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmder_flag::FlagSet;
    ///
    /// let mut fs = FlagSet::new("ls");
    /// let all = fs.bool("a", false, "show all");
    /// let long = fs.bool("l", false, "long listing");
    /// let sort = fs.string("sort", "name", "sort key");
    ///
    /// fs.parse(["-al", "--sort=size", "src", "--sort=time"]).unwrap();
    ///
    /// assert!(all.get() && long.get());
    /// assert_eq!(sort.get(), "size");
    /// assert_eq!(fs.args(), ["src", "--sort=time"]);
    /// ```
    pub fn parse<I, S>(&mut self, args: I) -> Result<(), FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.parsed = true;
        self.terminated = false;

        let mut index = 0;
        let result = loop {
            let Some(arg) = args.get(index) else {
                break Ok(());
            };
            if arg == "-" {
                break Ok(());
            }
            if arg == "--" {
                self.terminated = true;
                index += 1;
                break Ok(());
            }
            let step = if let Some(body) = arg.strip_prefix("--") {
                self.parse_long(body, &args, index)
            } else if let Some(body) = arg.strip_prefix('-') {
                self.parse_short(body, &args, index)
            } else {
                break Ok(());
            };
            match step {
                Ok(next) => index = next,
                Err(e) => break Err(e),
            }
        };

        self.args = args[index.min(args.len())..].to_vec();
        result
    }

    /// Like [`FlagSet::parse`], but flags may follow positional arguments.
    ///
    /// Each positional is collected and parsing resumes after it. Once a
    /// `--` terminator is seen every remaining argument is positional.
    ///
    /// # Errors
    ///
    /// Same as [`FlagSet::parse`]. Positionals collected before the error
    /// are not kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmder_flag::FlagSet;
    ///
    /// let mut fs = FlagSet::new("cp");
    /// let force = fs.bool("f", false, "overwrite");
    /// let mode = fs.string("mode", "", "file mode");
    ///
    /// fs.parse_interspersed(["a", "-f", "b", "--mode=644", "--", "-c"]).unwrap();
    ///
    /// assert!(force.get());
    /// assert_eq!(mode.get(), "644");
    /// assert_eq!(fs.args(), ["a", "b", "-c"]);
    /// ```
    pub fn parse_interspersed<I, S>(&mut self, args: I) -> Result<(), FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rest: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut positional = Vec::new();
        loop {
            self.parse(std::mem::take(&mut rest))?;
            if self.terminated {
                positional.append(&mut self.args);
                break;
            }
            let mut residual = std::mem::take(&mut self.args).into_iter();
            match residual.next() {
                Some(first) => {
                    positional.push(first);
                    rest = residual.collect();
                }
                None => break,
            }
        }
        self.args = positional;
        Ok(())
    }

    /// Handles `--name[=value]` at `args[index]`; returns the next index.
    fn parse_long(&mut self, body: &str, args: &[String], index: usize) -> Result<usize, FlagError> {
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let spelling = format!("--{name}");
        let Some(flag) = self.lookup(name) else {
            if name == "help" {
                return Err(FlagError::HelpRequested);
            }
            return Err(FlagError::UnknownFlag(spelling));
        };

        let (value, next) = match inline {
            Some(value) => (value, index + 1),
            None if flag.is_bool() => ("true", index + 1),
            None => match args.get(index + 1) {
                Some(value) => (value.as_str(), index + 2),
                None => return Err(FlagError::MissingArgument(spelling)),
            },
        };

        self.apply(name, &spelling, value)?;
        self.mark_set(name);
        Ok(next)
    }

    /// Handles a short cluster `-abc` at `args[index]`; returns the next
    /// index.
    fn parse_short(&mut self, body: &str, args: &[String], index: usize) -> Result<usize, FlagError> {
        for (position, c) in body.char_indices() {
            let mut buf = [0u8; 4];
            let name: &str = c.encode_utf8(&mut buf);
            let spelling = format!("-{name}");
            let Some(flag) = self.lookup(name) else {
                if c == 'h' {
                    return Err(FlagError::HelpRequested);
                }
                return Err(FlagError::UnknownFlag(spelling));
            };

            if flag.is_bool() {
                self.apply(name, &spelling, "true")?;
                self.mark_set(name);
                continue;
            }

            let stuck = &body[position + c.len_utf8()..];
            let (value, next) = if !stuck.is_empty() {
                (stuck, index + 1)
            } else {
                match args.get(index + 1) {
                    Some(value) => (value.as_str(), index + 2),
                    None => return Err(FlagError::MissingArgument(spelling)),
                }
            };
            self.apply(name, &spelling, value)?;
            self.mark_set(name);
            return Ok(next);
        }
        Ok(index + 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ValueError;
    use crate::value::Var;

    use super::*;

    struct Fixture {
        fs: FlagSet,
        all: Var<bool>,
        count: Var<u64>,
        output: Var<String>,
        verbose: Var<bool>,
    }

    /// `-a/--all` (bool), `-c/--count` (uint), `-o/--output` (string), `-v`
    /// (bool).
    fn fixture() -> Fixture {
        let mut fs = FlagSet::new("test");
        let all = fs.bool("all", false, "show all");
        fs.alias("all", "a");
        let count = fs.uint("count", 12, "number of results");
        fs.alias("count", "c");
        let output = fs.string("output", "-", "output file");
        fs.alias("output", "o");
        let verbose = fs.bool("v", false, "verbose");
        Fixture {
            fs,
            all,
            count,
            output,
            verbose,
        }
    }

    #[test]
    fn test_long_flags() {
        let mut f = fixture();
        f.fs.parse(["--all", "--count", "3", "--output=out.txt", "rest"])
            .unwrap();
        assert!(f.all.get());
        assert_eq!(f.count.get(), 3);
        assert_eq!(f.output.get(), "out.txt");
        assert_eq!(f.fs.args(), ["rest"]);
        assert!(f.fs.parsed());
    }

    #[test]
    fn test_long_bool_with_explicit_value() {
        let mut f = fixture();
        f.all.replace(true);
        f.fs.parse(["--all=false"]).unwrap();
        assert!(!f.all.get());
        assert!(f.fs.args().is_empty());
    }

    #[test]
    fn test_inline_value_splits_on_first_equals() {
        let mut f = fixture();
        f.fs.parse(["--output=a=b"]).unwrap();
        assert_eq!(f.output.get(), "a=b");
    }

    #[test]
    fn test_short_cluster_and_stuck_value() {
        let mut f = fixture();
        f.fs.parse(["-av", "-ootest.out", "-c5"]).unwrap();
        assert!(f.all.get());
        assert!(f.verbose.get());
        assert_eq!(f.output.get(), "otest.out");
        assert_eq!(f.count.get(), 5);
    }

    #[test]
    fn test_cluster_equivalent_to_separate_flags() {
        let mut clustered = fixture();
        clustered.fs.parse(["-avo", "x", "tail"]).unwrap();

        let mut separate = fixture();
        separate.fs.parse(["-a", "-v", "-o", "x", "tail"]).unwrap();

        assert_eq!(clustered.all.get(), separate.all.get());
        assert_eq!(clustered.verbose.get(), separate.verbose.get());
        assert_eq!(clustered.output.get(), separate.output.get());
        assert_eq!(clustered.fs.args(), separate.fs.args());
    }

    #[test]
    fn test_non_bool_ends_cluster_scan() {
        let mut f = fixture();
        f.fs.parse(["-oav"]).unwrap();
        assert_eq!(f.output.get(), "av");
        assert!(!f.all.get());
        assert!(!f.verbose.get());
    }

    #[test]
    fn test_terminator_is_dropped() {
        let mut f = fixture();
        f.fs.parse(["-a", "--", "-c", "1"]).unwrap();
        assert!(f.all.get());
        assert_eq!(f.count.get(), 12);
        assert_eq!(f.fs.args(), ["-c", "1"]);
        assert!(f.fs.terminated());
    }

    #[test]
    fn test_bare_hyphen_is_positional() {
        let mut f = fixture();
        f.fs.parse(["-a", "-", "-v"]).unwrap();
        assert!(f.all.get());
        assert!(!f.verbose.get());
        assert_eq!(f.fs.args(), ["-", "-v"]);
        assert!(!f.fs.terminated());
    }

    #[test]
    fn test_positional_stops_parsing() {
        let mut f = fixture();
        f.fs.parse(["file", "-a"]).unwrap();
        assert!(!f.all.get());
        assert_eq!(f.fs.args(), ["file", "-a"]);
    }

    #[test]
    fn test_later_occurrence_wins() {
        let mut f = fixture();
        f.fs.parse(["-c", "1", "--count=2", "-c3"]).unwrap();
        assert_eq!(f.count.get(), 3);
    }

    #[test]
    fn test_value_may_look_like_flag() {
        let mut f = fixture();
        f.fs.parse(["--output", "--all"]).unwrap();
        assert_eq!(f.output.get(), "--all");
        assert!(!f.all.get());
    }

    #[test]
    fn test_unknown_flags() {
        let mut f = fixture();
        assert_eq!(
            f.fs.parse(["-aU"]),
            Err(FlagError::UnknownFlag("-U".to_string()))
        );
        let mut f = fixture();
        assert_eq!(
            f.fs.parse(["--unknown=1"]),
            Err(FlagError::UnknownFlag("--unknown".to_string()))
        );
    }

    #[test]
    fn test_missing_arguments() {
        let mut f = fixture();
        assert_eq!(
            f.fs.parse(["--count"]),
            Err(FlagError::MissingArgument("--count".to_string()))
        );
        let mut f = fixture();
        assert_eq!(
            f.fs.parse(["-ac"]),
            Err(FlagError::MissingArgument("-c".to_string()))
        );
    }

    #[test]
    fn test_invalid_value_names_spelling() {
        let mut f = fixture();
        assert_eq!(
            f.fs.parse(["-c", "many"]),
            Err(FlagError::InvalidValue {
                flag: "-c".to_string(),
                value: "many".to_string(),
                source: ValueError::InvalidInt("many".to_string()),
            })
        );
    }

    #[test]
    fn test_help_requested_when_unregistered() {
        let mut f = fixture();
        assert_eq!(f.fs.parse(["--help"]), Err(FlagError::HelpRequested));
        let mut f = fixture();
        assert_eq!(f.fs.parse(["-ah"]), Err(FlagError::HelpRequested));
        assert!(f.all.get());
    }

    #[test]
    fn test_user_defined_help_flags_win() {
        let mut fs = FlagSet::new("test");
        let help = fs.bool("help", false, "custom help");
        fs.alias("help", "h");
        fs.parse(["-h"]).unwrap();
        assert!(help.get());
        help.replace(false);
        fs.parse(["--help"]).unwrap();
        assert!(help.get());
    }

    #[test]
    fn test_records_set_flags_by_spelling() {
        let mut f = fixture();
        f.fs.parse(["-a", "--count=1"]).unwrap();
        assert!(f.fs.is_set("a"));
        assert!(f.fs.is_set("count"));
        assert!(!f.fs.is_set("all"));
        assert_eq!(f.fs.num_flags(), 2);
    }

    #[test]
    fn test_interspersed_collects_positionals() {
        let mut f = fixture();
        f.fs
            .parse_interspersed(["x", "-a", "-", "--count", "4", "y"])
            .unwrap();
        assert!(f.all.get());
        assert_eq!(f.count.get(), 4);
        assert_eq!(f.fs.args(), ["x", "-", "y"]);
        assert!(!f.fs.terminated());
    }

    #[test]
    fn test_interspersed_stops_at_terminator() {
        let mut f = fixture();
        f.fs
            .parse_interspersed(["x", "--", "-a", "--", "y"])
            .unwrap();
        assert!(!f.all.get());
        assert!(f.fs.terminated());
        assert_eq!(f.fs.args(), ["x", "-a", "--", "y"]);
    }

    #[test]
    fn test_interspersed_reports_late_errors() {
        let mut f = fixture();
        assert_eq!(
            f.fs.parse_interspersed(["x", "--bogus"]),
            Err(FlagError::UnknownFlag("--bogus".to_string()))
        );
    }
}
