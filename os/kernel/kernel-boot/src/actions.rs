//! # Action Dispatch
//!
//! Whatever is left on the command line after the options is a sequence of
//! actions, each a name followed by a fixed number of arguments:
//!
//! ```text
//! run 'echo hi' ls cat README
//! └─────┬─────┘ └┘ └───┬────┘
//!     run(2)   ls(1)  cat(2)
//! ```
//!
//! Actions run strictly left to right. The first unknown name, missing
//! argument or failing handler ends the boot.

use crate::capabilities::Capabilities;
use crate::config::BootConfiguration;
use crate::error::ActionError;
use core::fmt;

/// Runs an action; gets the action's tokens, its name included.
pub type ActionHandler<C> = fn(&mut C, &[&str]) -> Result<(), &'static str>;

/// One row of the action table.
pub struct ActionTableEntry<C> {
    pub name: &'static str,
    /// Tokens the action consumes, its name included.
    pub argc: usize,
    pub requires: Capabilities,
    /// Usage form, e.g. `cat FILE`.
    pub synopsis: &'static str,
    pub help: &'static str,
    /// Printed above this entry in the usage text.
    pub heading: Option<&'static str>,
    pub handler: ActionHandler<C>,
}

impl<C> ActionTableEntry<C> {
    #[must_use]
    pub const fn is_available(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(self.requires)
    }
}

impl<C> Clone for ActionTableEntry<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ActionTableEntry<C> {}

impl<C> fmt::Debug for ActionTableEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTableEntry")
            .field("name", &self.name)
            .field("argc", &self.argc)
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

/// What the built-in actions need from the kernel.
///
/// Filesystem and user-program hooks default to failing, so a kernel
/// without those subsystems only has to run tests.
pub trait BootContext {
    fn config(&self) -> &BootConfiguration;

    fn config_mut(&mut self) -> &mut BootConfiguration;

    /// Subsystems compiled into this kernel.
    fn capabilities(&self) -> Capabilities;

    /// Run a built-in kernel test by name.
    ///
    /// # Errors
    /// The test does not exist or failed.
    fn run_test(&mut self, name: &str) -> Result<(), &'static str>;

    /// Start a user program and wait for it to exit.
    ///
    /// # Errors
    /// The program could not be started.
    fn run_program(&mut self, _command_line: &str) -> Result<(), &'static str> {
        Err("user programs are not supported")
    }

    /// List the root directory.
    ///
    /// # Errors
    /// No filesystem.
    fn ls(&mut self) -> Result<(), &'static str> {
        Err("no file system")
    }

    /// Print a file to the console.
    ///
    /// # Errors
    /// No filesystem, or no such file.
    fn cat(&mut self, _file: &str) -> Result<(), &'static str> {
        Err("no file system")
    }

    /// # Errors
    /// No filesystem, or no such file.
    fn rm(&mut self, _file: &str) -> Result<(), &'static str> {
        Err("no file system")
    }

    /// Copy a file from the scratch disk into the filesystem.
    ///
    /// # Errors
    /// No filesystem, or the scratch disk holds nothing usable.
    fn put(&mut self, _file: &str) -> Result<(), &'static str> {
        Err("no file system")
    }

    /// Copy a file from the filesystem onto the scratch disk.
    ///
    /// # Errors
    /// No filesystem, or no such file.
    fn get(&mut self, _file: &str) -> Result<(), &'static str> {
        Err("no file system")
    }
}

/// Runs the task named by `run`, logging around it.
///
/// Without user-program support, or under `-threads-tests`, the task is a
/// built-in test; otherwise it is a program command line.
fn run_task<C: BootContext>(ctx: &mut C, args: &[&str]) -> Result<(), &'static str> {
    let &[_, task] = args else {
        return Err("run takes exactly one task");
    };

    log::info!("Executing '{task}':");
    if ctx.config().test_mode || !ctx.capabilities().contains(Capabilities::USER_PROGRAMS) {
        ctx.run_test(task)?;
    } else {
        ctx.run_program(task)?;
    }
    log::info!("Execution of '{task}' complete.");
    Ok(())
}

fn ls<C: BootContext>(ctx: &mut C, _args: &[&str]) -> Result<(), &'static str> {
    ctx.ls()
}

fn cat<C: BootContext>(ctx: &mut C, args: &[&str]) -> Result<(), &'static str> {
    let &[_, file] = args else {
        return Err("cat takes one file");
    };
    ctx.cat(file)
}

fn rm<C: BootContext>(ctx: &mut C, args: &[&str]) -> Result<(), &'static str> {
    let &[_, file] = args else {
        return Err("rm takes one file");
    };
    ctx.rm(file)
}

fn put<C: BootContext>(ctx: &mut C, args: &[&str]) -> Result<(), &'static str> {
    let &[_, file] = args else {
        return Err("put takes one file");
    };
    ctx.put(file)
}

fn get<C: BootContext>(ctx: &mut C, args: &[&str]) -> Result<(), &'static str> {
    let &[_, file] = args else {
        return Err("get takes one file");
    };
    ctx.get(file)
}

/// The kernel's own action table.
///
/// `run` documents itself differently with and without user programs.
#[must_use]
pub fn builtin_actions<C: BootContext>(capabilities: Capabilities) -> [ActionTableEntry<C>; 6] {
    let (run_synopsis, run_help) = if capabilities.contains(Capabilities::USER_PROGRAMS) {
        ("run 'PROG [ARG...]'", "Run PROG and wait for it to complete.")
    } else {
        ("run TEST", "Run TEST.")
    };

    [
        ActionTableEntry {
            name: "run",
            argc: 2,
            requires: Capabilities::NONE,
            synopsis: run_synopsis,
            help: run_help,
            heading: None,
            handler: run_task::<C>,
        },
        ActionTableEntry {
            name: "ls",
            argc: 1,
            requires: Capabilities::FILESYSTEM,
            synopsis: "ls",
            help: "List files in the root directory.",
            heading: None,
            handler: ls::<C>,
        },
        ActionTableEntry {
            name: "cat",
            argc: 2,
            requires: Capabilities::FILESYSTEM,
            synopsis: "cat FILE",
            help: "Print FILE to the console.",
            heading: None,
            handler: cat::<C>,
        },
        ActionTableEntry {
            name: "rm",
            argc: 2,
            requires: Capabilities::FILESYSTEM,
            synopsis: "rm FILE",
            help: "Delete FILE.",
            heading: None,
            handler: rm::<C>,
        },
        ActionTableEntry {
            name: "put",
            argc: 2,
            requires: Capabilities::FILESYSTEM,
            synopsis: "put FILE",
            help: "Put FILE into file system from scratch disk.",
            heading: Some("Use these actions indirectly via the host runner's -g and -p options:"),
            handler: put::<C>,
        },
        ActionTableEntry {
            name: "get",
            argc: 2,
            requires: Capabilities::FILESYSTEM,
            synopsis: "get FILE",
            help: "Get FILE from file system into scratch disk.",
            heading: None,
            handler: get::<C>,
        },
    ]
}

/// Run every action in `argv`, in order, against `table`.
///
/// Entries the build lacks capabilities for are invisible. Returns the
/// number of actions run.
///
/// # Errors
/// The first action that is unknown, short of arguments, or failed. Nothing
/// after it runs.
pub fn run_actions<'a, C>(
    ctx: &mut C,
    table: &[ActionTableEntry<C>],
    capabilities: Capabilities,
    argv: &[&'a str],
) -> Result<usize, ActionError<'a>> {
    let mut rest = argv;
    let mut ran = 0;

    while let Some(&name) = rest.first() {
        let action = table
            .iter()
            .find(|a| a.name == name && a.is_available(capabilities))
            .ok_or(ActionError::UnknownAction { name })?;

        let take = action.argc.max(1);
        let Some((args, tail)) = rest.split_at_checked(take) else {
            return Err(ActionError::MissingArgument {
                action: name,
                required: take - 1,
            });
        };

        (action.handler)(ctx, args)
            .map_err(|reason| ActionError::ActionFailed { action: name, reason })?;

        rest = tail;
        ran += 1;
    }

    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: Capabilities = Capabilities::FILESYSTEM.union(Capabilities::USER_PROGRAMS);

    struct Recorder {
        config: BootConfiguration,
        capabilities: Capabilities,
        calls: Vec<String>,
    }

    impl Recorder {
        fn new(capabilities: Capabilities) -> Self {
            Self {
                config: BootConfiguration::default(),
                capabilities,
                calls: Vec::new(),
            }
        }
    }

    impl BootContext for Recorder {
        fn config(&self) -> &BootConfiguration {
            &self.config
        }

        fn config_mut(&mut self) -> &mut BootConfiguration {
            &mut self.config
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        fn run_test(&mut self, name: &str) -> Result<(), &'static str> {
            if name == "bogus" {
                return Err("no such test");
            }
            self.calls.push(format!("test({name})"));
            Ok(())
        }

        fn run_program(&mut self, command_line: &str) -> Result<(), &'static str> {
            self.calls.push(format!("program({command_line})"));
            Ok(())
        }

        fn ls(&mut self) -> Result<(), &'static str> {
            self.calls.push("ls()".into());
            Ok(())
        }

        fn cat(&mut self, file: &str) -> Result<(), &'static str> {
            self.calls.push(format!("cat({file})"));
            Ok(())
        }
    }

    fn dispatch<'a>(ctx: &mut Recorder, argv: &[&'a str]) -> Result<usize, ActionError<'a>> {
        let caps = ctx.capabilities;
        run_actions(ctx, &builtin_actions(caps), caps, argv)
    }

    #[test]
    fn runs_actions_left_to_right() {
        let mut ctx = Recorder::new(FULL);
        assert_eq!(dispatch(&mut ctx, &["run", "echo hi", "ls"]), Ok(2));
        assert_eq!(ctx.calls, ["program(echo hi)", "ls()"]);
    }

    #[test]
    fn filesystem_actions_are_unknown_without_a_filesystem() {
        let mut ctx = Recorder::new(Capabilities::NONE);
        assert_eq!(
            dispatch(&mut ctx, &["ls"]),
            Err(ActionError::UnknownAction { name: "ls" })
        );
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn missing_argument_is_reported_before_the_handler_runs() {
        let mut ctx = Recorder::new(FULL);
        assert_eq!(
            dispatch(&mut ctx, &["cat"]),
            Err(ActionError::MissingArgument { action: "cat", required: 1 })
        );
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn aborts_at_the_first_bad_action() {
        let mut ctx = Recorder::new(FULL);
        assert_eq!(
            dispatch(&mut ctx, &["ls", "frobnicate", "ls"]),
            Err(ActionError::UnknownAction { name: "frobnicate" })
        );
        assert_eq!(ctx.calls, ["ls()"]);
    }

    #[test]
    fn repeated_actions_dispatch_independently() {
        let mut ctx = Recorder::new(FULL);
        assert_eq!(dispatch(&mut ctx, &["cat", "a", "cat", "b", "ls", "ls"]), Ok(4));
        assert_eq!(ctx.calls, ["cat(a)", "cat(b)", "ls()", "ls()"]);
    }

    #[test]
    fn run_goes_to_the_test_runner_without_user_programs_or_in_test_mode() {
        let mut ctx = Recorder::new(Capabilities::NONE);
        dispatch(&mut ctx, &["run", "alarm-single"]).unwrap();
        assert_eq!(ctx.calls, ["test(alarm-single)"]);

        let mut ctx = Recorder::new(FULL);
        ctx.config_mut().test_mode = true;
        dispatch(&mut ctx, &["run", "priority-donate-one"]).unwrap();
        assert_eq!(ctx.calls, ["test(priority-donate-one)"]);
    }

    #[test]
    fn handler_failures_carry_their_reason() {
        let mut ctx = Recorder::new(Capabilities::NONE);
        let err = dispatch(&mut ctx, &["run", "bogus", "run", "alarm-single"]).unwrap_err();
        assert_eq!(
            err,
            ActionError::ActionFailed { action: "run", reason: "no such test" }
        );
        assert_eq!(err.to_string(), "action `run' failed: no such test");
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn unimplemented_hooks_fail() {
        let mut ctx = Recorder::new(FULL);
        assert_eq!(
            dispatch(&mut ctx, &["rm", "x"]),
            Err(ActionError::ActionFailed { action: "rm", reason: "no file system" })
        );
    }

    #[test]
    fn empty_action_list_does_nothing() {
        let mut ctx = Recorder::new(FULL);
        assert_eq!(dispatch(&mut ctx, &[]), Ok(0));
    }
}
