//! Command trees for command-line applications.
//!
//! A program is a tree of [`Command`]s. [`execute`] resolves an argument
//! vector against the tree, parsing each level's flags with its own
//! [`FlagSet`], and then drives the initialize/run/destroy lifecycle of the
//! resolved call stack:
//!
//! - [`Command`] / [`Documented`] — the command model. Flags, lifecycle hooks
//!   and subcommands are opt-in capabilities with no-op defaults.
//! - [`BaseCommand`] — a command assembled from closures.
//! - [`build_call_stack`] — argument resolution into [`Frame`]s.
//! - [`ExecuteOptions`] / [`ExecuteConfig`] — interspersed flags, environment
//!   variable defaults and usage output.
//! - [`flag`] — the getopt-style flag registry and parser.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use cmder::{BaseCommand, Context, ExecuteOptions, Outcome, execute};
//!
//! let port = Rc::new(RefCell::new(None));
//! let seen = Rc::clone(&port);
//! let flag = cmder::Var::new(0u64);
//! let handle = flag.clone();
//!
//! let mut app = BaseCommand::new("app")
//!     .with_usage("app <command>")
//!     .with_subcommand(
//!         BaseCommand::new("serve")
//!             .with_usage("serve [-p port]")
//!             .with_flags(move |fs| {
//!                 fs.uint_var(&flag, "port", 8080, "listen `port`");
//!                 fs.alias("port", "p");
//!             })
//!             .on_run(move |_ctx, _args| {
//!                 *seen.borrow_mut() = Some(handle.get());
//!                 Ok(())
//!             }),
//!     );
//!
//! let options = ExecuteOptions::new()
//!     .with_args(["serve"])
//!     .with_environment_binding()
//!     .with_env_vars([("APP_SERVE_PORT", "9000")]);
//! let outcome = execute(&Context::new(), &mut app, options).unwrap();
//!
//! assert_eq!(outcome, Outcome::Completed);
//! assert_eq!(*port.borrow(), Some(9000));
//! ```

mod command;
mod context;
mod env;
mod error;
mod execute;
mod options;
mod stack;
mod usage;

pub use cmder_flag as flag;
pub use cmder_flag::{FlagSet, Value, Var};
pub use command::{BaseCommand, Command, CommandDocumentation, Documented, ShowUsage, is_show_usage};
pub use context::Context;
pub use env::{bind_environment, env_var_name};
pub use error::{Error, Result};
pub use execute::{Outcome, execute, run};
pub use options::{EnvLookup, ExecuteConfig, ExecuteOptions};
pub use stack::{CallStack, Frame, build_call_stack};
pub use usage::{FlagGroup, UsageStyle, flag_groups, render_usage};
