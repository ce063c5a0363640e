//! The command model.
//!
//! A command is any type implementing [`Command`]. Beyond a name, a run
//! behaviour and its documentation, a command opts into extra capabilities by
//! overriding the matching provided methods:
//!
//! | Capability        | Methods                                   |
//! |-------------------|-------------------------------------------|
//! | flag-owning       | [`Command::initialize_flags`]             |
//! | lifecycle-owning  | [`Command::initialize`], [`Command::destroy`] |
//! | subcommand-owning | [`Command::subcommands`], [`Command::subcommands_mut`] |
//! | hidden            | [`Documented::hidden`]                    |
//!
//! Commands that don't override a capability get the no-op default.
//! [`BaseCommand`] builds a command out of closures when defining a type is
//! overkill.

use cmder_flag::FlagSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::Context;

/// Help and usage text of a command.
pub trait Documented {
    /// One-line synopsis, e.g. `cp [flags] <src> <dst>`.
    fn usage_line(&self) -> &str;

    /// Summary shown in the parent's command listing.
    fn short_help(&self) -> &str {
        ""
    }

    /// Full description shown at the top of the usage text.
    fn help(&self) -> &str {
        ""
    }

    fn examples(&self) -> &str {
        ""
    }

    /// Hidden commands are left out of command listings but still run.
    fn hidden(&self) -> bool {
        false
    }
}

/// A command that can be resolved from arguments and executed.
///
/// # Lifecycle
///
/// For the call stack `root -> child`, hooks run as
/// `root.initialize`, `child.initialize`, `child.run`, `child.destroy`,
/// `root.destroy`. The first error stops everything: the remaining hooks,
/// including every pending `destroy`, are skipped.
///
/// Each hook receives the arguments left after that level's flags were
/// parsed. For a non-leaf level this includes the subcommand name.
///
/// # Examples
///
/// ```
/// use cmder::{Command, Context, Documented, ExecuteOptions, FlagSet, Var, execute};
///
/// #[derive(Default)]
/// struct Greet {
///     shout: Var<bool>,
///     greeting: Option<String>,
/// }
///
/// impl Documented for Greet {
///     fn usage_line(&self) -> &str {
///         "greet [-s] <name>"
///     }
/// }
///
/// impl Command for Greet {
///     fn name(&self) -> &str {
///         "greet"
///     }
///
///     fn initialize_flags(&mut self, fs: &mut FlagSet) {
///         fs.bool_var(&self.shout, "s", false, "shout the greeting");
///     }
///
///     fn run(&mut self, _ctx: &Context, args: &[String]) -> anyhow::Result<()> {
///         let name = args.first().map_or("world", String::as_str);
///         let text = format!("hello {name}");
///         self.greeting = Some(if self.shout.get() { text.to_uppercase() } else { text });
///         Ok(())
///     }
/// }
///
/// let mut cmd = Greet::default();
/// execute(&Context::new(), &mut cmd, ExecuteOptions::new().with_args(["-s", "ferris"])).unwrap();
/// assert_eq!(cmd.greeting.as_deref(), Some("HELLO FERRIS"));
/// ```
pub trait Command: Documented {
    /// Name used to select this command as a subcommand and to derive
    /// environment variable names.
    fn name(&self) -> &str;

    /// Runs the command. Only called on the last command of a call stack.
    ///
    /// # Errors
    ///
    /// Any error aborts execution and is returned from
    /// [`execute`](crate::execute) unchanged. Return [`ShowUsage`] (or an
    /// error wrapping it) to have usage printed instead.
    fn run(&mut self, ctx: &Context, args: &[String]) -> anyhow::Result<()>;

    /// Registers this command's flags. Called before its arguments are
    /// parsed.
    fn initialize_flags(&mut self, _fs: &mut FlagSet) {}

    /// Called top-down before `run` or the subcommand's lifecycle.
    ///
    /// # Errors
    ///
    /// Same contract as [`Command::run`].
    fn initialize(&mut self, _ctx: &Context, _args: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called bottom-up after `run` or the subcommand's lifecycle succeeded.
    ///
    /// # Errors
    ///
    /// Same contract as [`Command::run`].
    fn destroy(&mut self, _ctx: &Context, _args: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    /// Child commands. When two share a name, the last one wins.
    fn subcommands(&self) -> &[Box<dyn Command>] {
        &[]
    }

    /// Mutable view of the same children, in the same order, as
    /// [`Command::subcommands`].
    fn subcommands_mut(&mut self) -> &mut [Box<dyn Command>] {
        &mut []
    }
}

/// Returned from a lifecycle hook to print the command's usage and exit
/// with status 2.
///
/// Wrapping it (`anyhow::Error::context`, a `#[source]` field) works too.
///
/// ```
/// use anyhow::Context as _;
/// use cmder::{ShowUsage, is_show_usage};
///
/// let err = Err::<(), _>(ShowUsage).context("missing <name>").unwrap_err();
/// assert!(is_show_usage(&err));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("show usage")]
pub struct ShowUsage;

/// Returns `true` if `err` is, or wraps, [`ShowUsage`].
pub fn is_show_usage(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ShowUsage>().is_some() || err.chain().any(|e| e.is::<ShowUsage>())
}

/// Plain documentation record implementing [`Documented`].
///
/// Serializable so command docs can live next to other configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandDocumentation {
    pub usage: String,
    pub short_help: String,
    pub help: String,
    pub examples: String,
    pub hidden: bool,
}

impl Documented for CommandDocumentation {
    fn usage_line(&self) -> &str {
        &self.usage
    }

    fn short_help(&self) -> &str {
        &self.short_help
    }

    fn help(&self) -> &str {
        &self.help
    }

    fn examples(&self) -> &str {
        &self.examples
    }

    fn hidden(&self) -> bool {
        self.hidden
    }
}

type FlagsHook = Box<dyn FnMut(&mut FlagSet)>;
type LifecycleHook = Box<dyn FnMut(&Context, &[String]) -> anyhow::Result<()>>;

/// A command assembled from closures.
///
/// Every hook is optional; a missing `run` does nothing.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use cmder::{BaseCommand, Context, ExecuteOptions, execute};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
///
/// let mut root = BaseCommand::new("tool")
///     .with_usage("tool <command>")
///     .with_subcommand(
///         BaseCommand::new("echo")
///             .with_usage("echo [args...]")
///             .with_short_help("print arguments")
///             .on_run(move |_ctx, args| {
///                 sink.borrow_mut().extend(args.iter().cloned());
///                 Ok(())
///             }),
///     );
///
/// execute(&Context::new(), &mut root, ExecuteOptions::new().with_args(["echo", "a", "b"])).unwrap();
/// assert_eq!(*seen.borrow(), ["a", "b"]);
/// ```
#[derive(Default)]
pub struct BaseCommand {
    name: String,
    docs: CommandDocumentation,
    init_flags: Option<FlagsHook>,
    init: Option<LifecycleHook>,
    run: Option<LifecycleHook>,
    destroy: Option<LifecycleHook>,
    children: Vec<Box<dyn Command>>,
}

impl BaseCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.docs.usage = usage.into();
        self
    }

    pub fn with_short_help(mut self, short_help: impl Into<String>) -> Self {
        self.docs.short_help = short_help.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.docs.help = help.into();
        self
    }

    pub fn with_examples(mut self, examples: impl Into<String>) -> Self {
        self.docs.examples = examples.into();
        self
    }

    /// Replaces all documentation at once.
    pub fn with_documentation(mut self, docs: CommandDocumentation) -> Self {
        self.docs = docs;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.docs.hidden = true;
        self
    }

    pub fn with_flags(mut self, f: impl FnMut(&mut FlagSet) + 'static) -> Self {
        self.init_flags = Some(Box::new(f));
        self
    }

    pub fn on_initialize(
        mut self,
        f: impl FnMut(&Context, &[String]) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.init = Some(Box::new(f));
        self
    }

    pub fn on_run(
        mut self,
        f: impl FnMut(&Context, &[String]) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.run = Some(Box::new(f));
        self
    }

    pub fn on_destroy(
        mut self,
        f: impl FnMut(&Context, &[String]) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.destroy = Some(Box::new(f));
        self
    }

    pub fn with_subcommand(mut self, command: impl Command + 'static) -> Self {
        self.children.push(Box::new(command));
        self
    }
}

fn call(hook: &mut Option<LifecycleHook>, ctx: &Context, args: &[String]) -> anyhow::Result<()> {
    match hook {
        Some(f) => f(ctx, args),
        None => Ok(()),
    }
}

impl Documented for BaseCommand {
    fn usage_line(&self) -> &str {
        self.docs.usage_line()
    }

    fn short_help(&self) -> &str {
        self.docs.short_help()
    }

    fn help(&self) -> &str {
        self.docs.help()
    }

    fn examples(&self) -> &str {
        self.docs.examples()
    }

    fn hidden(&self) -> bool {
        self.docs.hidden()
    }
}

impl Command for BaseCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, ctx: &Context, args: &[String]) -> anyhow::Result<()> {
        call(&mut self.run, ctx, args)
    }

    fn initialize_flags(&mut self, fs: &mut FlagSet) {
        if let Some(f) = &mut self.init_flags {
            f(fs);
        }
    }

    fn initialize(&mut self, ctx: &Context, args: &[String]) -> anyhow::Result<()> {
        call(&mut self.init, ctx, args)
    }

    fn destroy(&mut self, ctx: &Context, args: &[String]) -> anyhow::Result<()> {
        call(&mut self.destroy, ctx, args)
    }

    fn subcommands(&self) -> &[Box<dyn Command>] {
        &self.children
    }

    fn subcommands_mut(&mut self) -> &mut [Box<dyn Command>] {
        &mut self.children
    }
}

impl std::fmt::Debug for BaseCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseCommand")
            .field("name", &self.name)
            .field("docs", &self.docs)
            .field(
                "subcommands",
                &self.children.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
