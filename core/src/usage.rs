//! Usage text rendering.

use std::collections::BTreeMap;
use std::io::{self, Write};

use cmder_flag::{Flag, FlagSet, ValueKind};
use serde::{Deserialize, Serialize};

use crate::command::Command;

/// Layout of rendered usage text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStyle {
    /// Sectioned layout: help, usage, examples, commands and grouped flags.
    #[default]
    Standard,
    /// The usage line followed by a plain flag listing.
    Compact,
}

/// Flags sharing one value, i.e. a flag and its aliases.
#[derive(Debug)]
pub struct FlagGroup<'a> {
    /// Longest name of the group; groups sort by it.
    pub key: &'a str,
    /// Members ordered by name length, then name.
    pub flags: Vec<&'a Flag>,
}

/// Groups the visible flags of `fs` by value identity.
pub fn flag_groups(fs: &FlagSet) -> Vec<FlagGroup<'_>> {
    let mut by_identity: BTreeMap<usize, Vec<&Flag>> = BTreeMap::new();
    for flag in fs.flags().filter(|f| !f.is_hidden()) {
        by_identity.entry(flag.identity()).or_default().push(flag);
    }

    let mut groups: Vec<FlagGroup<'_>> = by_identity
        .into_values()
        .map(|mut flags| {
            flags.sort_by(|a, b| {
                (a.name().len(), a.name()).cmp(&(b.name().len(), b.name()))
            });
            let key = flags.last().map_or("", |f| f.name());
            FlagGroup { key, flags }
        })
        .collect();
    groups.sort_by(|a, b| a.key.cmp(b.key));
    groups
}

/// Writes the usage text of `command`, whose parsed flags are `fs`.
///
/// # Errors
///
/// Propagates write failures.
pub fn render_usage(
    command: &dyn Command,
    fs: &FlagSet,
    style: UsageStyle,
    out: &mut dyn Write,
) -> io::Result<()> {
    match style {
        UsageStyle::Standard => render_standard(command, fs, out),
        UsageStyle::Compact => {
            writeln!(out, "Usage: {}", command.usage_line())?;
            fs.write_defaults(out)
        }
    }
}

fn render_standard(command: &dyn Command, fs: &FlagSet, out: &mut dyn Write) -> io::Result<()> {
    let help = command.help().trim();
    if !help.is_empty() {
        writeln!(out, "{help}")?;
        writeln!(out)?;
    }

    writeln!(out, "Usage:")?;
    writeln!(out, "  {}", command.usage_line())?;

    let examples = command.examples().trim();
    if !examples.is_empty() {
        writeln!(out)?;
        writeln!(out, "Examples:")?;
        for line in examples.lines() {
            writeln!(out, "  {}", line.trim())?;
        }
    }

    let has_subcommands = !command.subcommands().is_empty();
    let visible: Vec<_> = command
        .subcommands()
        .iter()
        .filter(|c| !c.hidden())
        .collect();
    if !visible.is_empty() {
        writeln!(out)?;
        writeln!(out, "Available Commands:")?;
        for sub in visible {
            writeln!(out, "  {:<13}  {}", sub.name(), sub.short_help())?;
        }
    }

    let groups = flag_groups(fs);
    if !groups.is_empty() {
        writeln!(out)?;
        writeln!(out, "Flags:")?;
        for (i, group) in groups.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            write_group(group, out)?;
        }
    }

    if has_subcommands {
        writeln!(out)?;
        writeln!(
            out,
            "Use \"{} [command] --help\" for more information about a command.",
            command.name()
        )?;
    }
    Ok(())
}

fn write_group(group: &FlagGroup<'_>, out: &mut dyn Write) -> io::Result<()> {
    let Some(first) = group.flags.first() else {
        return Ok(());
    };
    let (placeholder, usage) = first.unquote_usage();

    let names: Vec<String> = group
        .flags
        .iter()
        .map(|flag| match (flag.is_short(), placeholder.is_empty()) {
            (true, true) => format!("-{}", flag.name()),
            (true, false) => format!("-{} <{placeholder}>", flag.name()),
            (false, true) => format!("--{}", flag.name()),
            (false, false) => format!("--{}=<{placeholder}>", flag.name()),
        })
        .collect();

    let mut line = format!("  {}", names.join(", "));
    let default = first.default_text();
    if !default.is_empty() {
        if first.kind() == ValueKind::String {
            line.push_str(&format!(" (default {default:?})"));
        } else {
            line.push_str(&format!(" (default {default})"));
        }
    }
    writeln!(out, "{line}")?;
    if !usage.is_empty() {
        writeln!(out, "      {}", usage.replace('\n', "\n      "))?;
    }
    Ok(())
}
