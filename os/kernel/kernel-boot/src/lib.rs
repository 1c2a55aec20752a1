//! # Kernel Boot Core
//!
//! Everything between "loaded by the boot loader" and "running the tasks the
//! command line asked for", independent of the hardware it runs on.
//!
//! ## Overview
//!
//! ```text
//! loader blob ──► cmdline ──► options ──► bootstrap ──► actions ──► shutdown
//!                  (Argv)   (BootConfiguration) (Subsystem table)   (Machine)
//! ```
//!
//! * [`cmdline`] splits the loader's NUL-separated blob into tokens.
//! * [`options`] consumes the leading `-` tokens into a [`BootConfiguration`].
//! * [`bootstrap`] runs the kernel's [`Subsystem`] table in [`Stage`] order.
//! * [`actions`] dispatches the remaining tokens against an action table.
//! * [`shutdown`] powers off or halts through a [`Machine`].
//! * [`flow::boot`] strings them together.
//!
//! Optional subsystems are described by [`Capabilities`]; whatever needs a
//! missing capability is treated as if it did not exist.
//!
//! Every error on this path is fatal. Components return [`Result`]s, and
//! [`shutdown::fatal`] is the single place they end up.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod actions;
pub mod bootstrap;
pub mod capabilities;
pub mod cmdline;
pub mod config;
pub mod error;
pub mod flow;
pub mod options;
pub mod shutdown;
pub mod usage;

pub use actions::{ActionHandler, ActionTableEntry, BootContext, builtin_actions, run_actions};
pub use bootstrap::{Bootstrapper, Stage, Subsystem};
pub use capabilities::Capabilities;
pub use cmdline::{Argv, MAX_ARGS, read_command_line};
pub use config::{BootConfiguration, SchedulerPolicy};
pub use error::{
    ActionError, BootError, CommandLineError, OptionError, SequenceError, StepError, StepFailed,
};
pub use options::{OPTIONS, OptionKind, OptionSpec, ParsedOptions, parse_options};
pub use shutdown::Machine;
