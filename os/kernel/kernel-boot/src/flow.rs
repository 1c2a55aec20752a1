//! The boot task from first instruction to its end.

use crate::actions::{BootContext, builtin_actions, run_actions};
use crate::bootstrap::{Bootstrapper, Stage, Subsystem};
use crate::cmdline::read_command_line;
use crate::error::BootError;
use crate::options::{ParsedOptions, parse_options};
use crate::shutdown::{Machine, fatal, power_off};
use crate::usage::write_usage;
use core::fmt;

enum Outcome {
    /// `-h` was given.
    Help,
    /// Every action ran.
    Done,
}

/// Boot the kernel described by `table` and run the command line actions.
///
/// `argc` and `blob` are the loader's command line; `console` receives the
/// usage text for `-h`. Ends by powering off under `-q` or `-h`, idling
/// after a successful run otherwise, and through [`fatal`] on any error.
pub fn boot<C: BootContext, M: Machine>(
    ctx: &mut C,
    machine: &mut M,
    table: &[Subsystem<C>],
    argc: u32,
    blob: &[u8],
    console: &mut impl fmt::Write,
) -> ! {
    let capabilities = ctx.capabilities();

    let mut boot = match Bootstrapper::new(table, capabilities) {
        Ok(boot) => boot,
        Err(e) => {
            // Nothing to tear down yet.
            machine.enter_panic_mode();
            log::error!("Kernel PANIC: {e}");
            machine.halt()
        }
    };

    match run(&mut boot, ctx, argc, blob) {
        Ok(Outcome::Help) => {
            if write_usage(console, capabilities, &builtin_actions::<C>(capabilities)).is_err() {
                log::warn!("Usage text could not be written");
            }
            power_off(&mut boot, ctx, machine)
        }
        Ok(Outcome::Done) if ctx.config().power_off_when_done => power_off(&mut boot, ctx, machine),
        Ok(Outcome::Done) => machine.idle(),
        Err(e) => fatal(&e, &mut boot, ctx, machine),
    }
}

fn run<'a, C: BootContext>(
    boot: &mut Bootstrapper<'_, C>,
    ctx: &mut C,
    argc: u32,
    blob: &'a [u8],
) -> Result<Outcome, BootError<'a>> {
    boot.run_to(ctx, Stage::ClearBss)?;

    let capabilities = ctx.capabilities();
    let argv = read_command_line(argc, blob)?;
    let actions = match parse_options(argv.as_slice(), capabilities, ctx.config_mut())? {
        ParsedOptions::Actions(actions) => actions,
        ParsedOptions::Help => return Ok(Outcome::Help),
    };

    boot.run_all(ctx)?;
    log::info!("Boot complete.");

    let ran = run_actions(ctx, &builtin_actions::<C>(capabilities), capabilities, actions)?;
    log::debug!("{ran} action(s) completed");
    Ok(Outcome::Done)
}
