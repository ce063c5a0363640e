//! Resolution of arguments into a call stack.
//!
//! Starting at the root, each level gets a fresh [`FlagSet`] which the
//! command populates and the level's arguments are parsed against. If the
//! first leftover argument names a subcommand, it is consumed and resolution
//! continues there with the rest. Otherwise that level is the leaf and the
//! leftovers are its positional arguments, even when they look like a
//! subcommand that doesn't exist.

use cmder_flag::{FlagSet, Var};
use tracing::{debug, trace};

use crate::command::Command;
use crate::env::bind_environment;
use crate::error::{Error, Result};
use crate::options::ExecuteConfig;

const HELP_NAMES: [&str; 2] = ["h", "help"];

/// One resolved level of a call stack.
#[derive(Debug)]
pub struct Frame {
    name: String,
    index: Option<usize>,
    flags: FlagSet,
    args: Vec<String>,
    help: Var<bool>,
}

impl Frame {
    /// Name of the command at this level.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of this level's command among its parent's subcommands;
    /// `None` for the root.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The parsed flags of this level.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Arguments left after this level's flags. For a non-leaf level the
    /// first one is the subcommand name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// `true` if `-h`/`--help` was given at this level and the command
    /// didn't define those flags itself.
    pub fn help_requested(&self) -> bool {
        self.help.get()
    }
}

/// Resolved levels, root first.
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The last level, whose command runs.
    pub fn leaf(&self) -> &Frame {
        // A stack always holds at least the root frame.
        &self.frames[self.frames.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// `true` if help was requested at any level.
    pub fn help_requested(&self) -> bool {
        self.frames.iter().any(Frame::help_requested)
    }

    /// Command names from the root down.
    pub fn path(&self) -> Vec<&str> {
        self.frames.iter().map(Frame::name).collect()
    }

    /// Follows the frame indices from `root` to the leaf command.
    ///
    /// Returns `None` if `root` is not the tree this stack was built from.
    pub fn leaf_command<'a>(&self, root: &'a dyn Command) -> Option<&'a dyn Command> {
        let mut command = root;
        for frame in &self.frames[1..] {
            let child = command.subcommands().get(frame.index?)?;
            if child.name() != frame.name {
                return None;
            }
            command = child.as_ref();
        }
        Some(command)
    }
}

/// Registers whichever of `-h`/`--help` the command left free, sharing one
/// hidden value. Returns the value and the names registered.
fn register_help_flags(fs: &mut FlagSet) -> (Var<bool>, Vec<&'static str>) {
    let help = Var::new(false);
    let mut registered = Vec::new();
    for name in HELP_NAMES {
        if fs.lookup(name).is_some() {
            continue;
        }
        fs.bool_var(&help, name, false, "show help");
        fs.hide(name);
        registered.push(name);
    }
    (help, registered)
}

/// Resolves `args` against the command tree under `root`.
///
/// # Errors
///
/// - [`Error::IllegalConfiguration`] for a command with an empty name.
/// - [`Error::EnvironmentBind`] when binding is enabled and a variable holds
///   a value its flag rejects.
/// - [`Error::Parse`] for the first level whose arguments don't parse.
pub fn build_call_stack(
    root: &mut dyn Command,
    args: &[String],
    config: &ExecuteConfig,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<CallStack> {
    let mut frames = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut remaining = args.to_vec();
    let mut index = None;
    let mut command = root;

    loop {
        let name = command.name().to_string();
        if name.is_empty() {
            return Err(Error::IllegalConfiguration(format!(
                "command at depth {} has an empty name",
                path.len()
            )));
        }
        path.push(name.clone());

        let mut fs = FlagSet::new(name.clone());
        command.initialize_flags(&mut fs);
        let (help, auto_help) = register_help_flags(&mut fs);

        if config.bind_env {
            bind_environment(&mut fs, path.as_slice(), &config.env_prefix, env, &auto_help)?;
        }

        let leaf_only = command.subcommands().is_empty();
        let parsed = if config.interspersed && leaf_only {
            fs.parse_interspersed(remaining)
        } else {
            fs.parse(remaining)
        };
        parsed.map_err(|source| Error::Parse {
            command: name.clone(),
            source,
        })?;

        let residual = fs.args().to_vec();
        let next = residual.first().and_then(|token| {
            command
                .subcommands()
                .iter()
                .rposition(|c| c.name() == token.as_str())
        });
        trace!(command = %name, args = ?residual, "parsed frame");

        let rest: Vec<String> = residual.iter().skip(1).cloned().collect();
        frames.push(Frame {
            name,
            index,
            flags: fs,
            args: residual,
            help,
        });

        let Some(position) = next else {
            break;
        };
        remaining = rest;
        index = Some(position);
        command = command.subcommands_mut()[position].as_mut();
    }

    debug!(path = ?path, "built call stack");
    Ok(CallStack { frames })
}
