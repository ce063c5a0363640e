//! Lifecycle execution.

use std::io::Write;
use std::process::ExitCode;

use tracing::{debug, trace, warn};

use crate::command::{Command, is_show_usage};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::options::{ExecuteOptions, Resolved};
use crate::stack::{CallStack, Frame, build_call_stack};
use crate::usage::{UsageStyle, render_usage};

/// How a successful [`execute`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The leaf command ran and every lifecycle hook succeeded.
    Completed,
    /// Help was requested; usage was rendered and no hook ran.
    HelpShown,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        0
    }
}

/// Resolves the arguments in `options` against `command` and runs the
/// resulting call stack.
///
/// Hooks run under a child of `ctx` that is cancelled before this returns.
///
/// # Errors
///
/// - Resolution errors from [`build_call_stack`].
/// - [`Error::ShowUsage`] after rendering usage, when a hook returned
///   [`ShowUsage`](crate::ShowUsage).
/// - [`Error::Command`] with the first error any other hook returned.
/// - [`Error::Io`] if usage can't be written.
pub fn execute(ctx: &Context, command: &mut dyn Command, options: ExecuteOptions) -> Result<Outcome> {
    let Resolved {
        args,
        config,
        env,
        mut usage_output,
    } = options.resolve();

    let stack = build_call_stack(command, &args, &config, &*env)?;

    if stack.help_requested() {
        debug!(command = stack.leaf().name(), "help requested");
        render_leaf_usage(command, &stack, config.usage_style, &mut *usage_output)?;
        return Ok(Outcome::HelpShown);
    }

    let ctx = ctx.child();
    let _cancel_on_return = ctx.token().clone().drop_guard();

    match run_frames(&ctx, command, stack.frames()) {
        Ok(()) => Ok(Outcome::Completed),
        Err(Error::Command(err)) if is_show_usage(&err) => {
            debug!(command = stack.leaf().name(), "usage requested by command");
            render_leaf_usage(command, &stack, config.usage_style, &mut *usage_output)?;
            Err(Error::ShowUsage {
                command: stack.leaf().name().to_string(),
                message: format!("{err:#}"),
            })
        }
        Err(err) => Err(err),
    }
}

/// Runs the lifecycle of `frames[0]` on `command`, descending into the
/// remaining frames in place of `run` when there are any.
fn run_frames(ctx: &Context, command: &mut dyn Command, frames: &[Frame]) -> Result<()> {
    let Some((frame, rest)) = frames.split_first() else {
        return Ok(());
    };
    let ctx = ctx.child();
    let _cancel_on_return = ctx.token().clone().drop_guard();
    let args = frame.args();

    trace!(command = frame.name(), "initialize");
    command.initialize(&ctx, args).map_err(Error::Command)?;

    match rest.first() {
        None => {
            trace!(command = frame.name(), "run");
            command.run(&ctx, args).map_err(Error::Command)?;
        }
        Some(next) => {
            let child = next
                .index()
                .and_then(|i| command.subcommands_mut().get_mut(i))
                .filter(|c| c.name() == next.name());
            let Some(child) = child else {
                return Err(Error::IllegalConfiguration(format!(
                    "subcommand {:?} of {:?} changed during execution",
                    next.name(),
                    frame.name()
                )));
            };
            run_frames(&ctx, child.as_mut(), rest)?;
        }
    }

    trace!(command = frame.name(), "destroy");
    command.destroy(&ctx, args).map_err(Error::Command)?;
    Ok(())
}

fn render_leaf_usage(
    root: &dyn Command,
    stack: &CallStack,
    style: UsageStyle,
    out: &mut dyn Write,
) -> Result<()> {
    let leaf = stack.leaf_command(root).ok_or_else(|| {
        Error::IllegalConfiguration(format!(
            "command {:?} is no longer in the tree",
            stack.leaf().name()
        ))
    })?;
    render_usage(leaf, stack.leaf().flags(), style, out)?;
    out.flush()?;
    Ok(())
}

/// Executes `command` under a fresh context and maps the result to a
/// process exit status.
///
/// Failures are logged and printed to stderr. Use it as the body of `main`:
///
/// ```no_run
/// use std::process::ExitCode;
/// use cmder::{BaseCommand, ExecuteOptions, run};
///
/// fn main() -> ExitCode {
///     let mut app = BaseCommand::new("app")
///         .with_usage("app [flags]")
///         .on_run(|_ctx, _args| Ok(()));
///     run(&mut app, ExecuteOptions::new().with_environment_binding())
/// }
/// ```
pub fn run(command: &mut dyn Command, options: ExecuteOptions) -> ExitCode {
    let ctx = Context::new();
    match execute(&ctx, command, options) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            warn!(command = command.name(), error = %err, "execution failed");
            if !err.is_help() {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(err.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::command::{BaseCommand, ShowUsage};

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorded(log: &Log, name: &str, fail_run: bool) -> BaseCommand {
        let (init, run, destroy) = (Rc::clone(log), Rc::clone(log), Rc::clone(log));
        let (n1, n2, n3) = (name.to_string(), name.to_string(), name.to_string());
        BaseCommand::new(name)
            .on_initialize(move |_, _| {
                init.borrow_mut().push(format!("{n1}.initialize"));
                Ok(())
            })
            .on_run(move |_, _| {
                run.borrow_mut().push(format!("{n2}.run"));
                if fail_run {
                    anyhow::bail!("{n2} failed");
                }
                Ok(())
            })
            .on_destroy(move |_, _| {
                destroy.borrow_mut().push(format!("{n3}.destroy"));
                Ok(())
            })
    }

    #[test]
    fn test_lifecycle_order() {
        let log = Log::default();
        let mut root = recorded(&log, "root", false).with_subcommand(recorded(&log, "child", false));

        let outcome = execute(&Context::new(), &mut root, ExecuteOptions::new().with_args(["child"]));
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        assert_eq!(
            *log.borrow(),
            [
                "root.initialize",
                "child.initialize",
                "child.run",
                "child.destroy",
                "root.destroy"
            ]
        );
    }

    #[test]
    fn test_failure_skips_every_destroy() {
        let log = Log::default();
        let mut root = recorded(&log, "root", false).with_subcommand(recorded(&log, "child", true));

        let err = execute(&Context::new(), &mut root, ExecuteOptions::new().with_args(["child"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "child failed");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            *log.borrow(),
            ["root.initialize", "child.initialize", "child.run"]
        );
    }

    #[test]
    fn test_show_usage_renders_leaf() {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let mut root = BaseCommand::new("root").with_subcommand(
            BaseCommand::new("child")
                .with_usage("child <arg>")
                .on_run(|_, _| Err(ShowUsage.into())),
        );

        let options = ExecuteOptions::new()
            .with_args(["child"])
            .with_usage_style(UsageStyle::Compact)
            .with_usage_output(SharedBuffer(Rc::clone(&buffer)));
        let err = execute(&Context::new(), &mut root, options).unwrap_err();

        assert!(matches!(&err, Error::ShowUsage { command, .. } if command == "child"));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            String::from_utf8(buffer.borrow().clone()).unwrap(),
            "Usage: child <arg>\n"
        );
    }

    #[test]
    fn test_help_skips_lifecycle() {
        let log = Log::default();
        let mut root = recorded(&log, "root", false).with_subcommand(recorded(&log, "child", false));

        let options = ExecuteOptions::new()
            .with_args(["child", "--help"])
            .with_usage_output(std::io::sink());
        let outcome = execute(&Context::new(), &mut root, options).unwrap();
        assert_eq!(outcome, Outcome::HelpShown);
        assert_eq!(outcome.exit_code(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_hook_context_cancelled_after_return() {
        let seen: Rc<RefCell<Option<Context>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let mut root = BaseCommand::new("root").on_run(move |ctx, _| {
            assert!(!ctx.is_cancelled());
            *sink.borrow_mut() = Some(ctx.clone());
            Ok(())
        });

        let parent = Context::new();
        execute(&parent, &mut root, ExecuteOptions::new().with_args(Vec::<String>::new())).unwrap();

        assert!(seen.borrow().as_ref().unwrap().is_cancelled());
        assert!(!parent.is_cancelled());
    }

    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
