//! The two ways out of the kernel: an orderly power-off, and a fatal error.

use crate::actions::BootContext;
use crate::bootstrap::Bootstrapper;
use core::fmt::Display;

/// Platform primitives the boot path ends in.
pub trait Machine {
    /// Switch the machine off. Does not return.
    fn power_off(&mut self) -> !;

    /// Stop the CPU for good.
    fn halt(&mut self) -> !;

    /// Give the CPU away forever; used when the boot task is done but the
    /// machine should stay up.
    fn idle(&mut self) -> !;

    /// Prepare for a fatal error report, e.g. by making console output
    /// lock-free.
    fn enter_panic_mode(&mut self) {}
}

/// Finalize initialized subsystems, print their counters and power off.
pub fn power_off<C, M: Machine>(
    boot: &mut Bootstrapper<'_, C>,
    ctx: &mut C,
    machine: &mut M,
) -> ! {
    boot.finalize(ctx);
    boot.report(ctx);
    log::info!("Powering off...");
    machine.power_off()
}

/// Report `err` and stop: power off under `-q`, halt otherwise.
pub fn fatal<C: BootContext, M: Machine>(
    err: &dyn Display,
    boot: &mut Bootstrapper<'_, C>,
    ctx: &mut C,
    machine: &mut M,
) -> ! {
    machine.enter_panic_mode();
    log::error!("Kernel PANIC: {err}");

    if ctx.config().power_off_when_done {
        power_off(boot, ctx, machine)
    } else {
        machine.halt()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Exit, TestKernel, TestMachine, exit_of, table};
    use super::*;
    use crate::capabilities::Capabilities;

    #[test]
    fn power_off_finalizes_before_reporting() {
        let table = table(false);
        let mut kernel = TestKernel::new(Capabilities::FILESYSTEM);
        let mut boot = Bootstrapper::new(&table, Capabilities::FILESYSTEM).unwrap();
        boot.run_all(&mut kernel).unwrap();
        kernel.events.clear();

        let exit = exit_of(|| power_off(&mut boot, &mut kernel, &mut TestMachine::default()));
        assert_eq!(exit, Exit::PowerOff);
        assert_eq!(kernel.events.first().map(String::as_str), Some("down filesystem"));
        assert_eq!(kernel.events.last().map(String::as_str), Some("down clear-bss"));
    }

    #[test]
    fn failed_filesystem_is_not_finalized() {
        let table = table(true);
        let mut kernel = TestKernel::new(Capabilities::FILESYSTEM);
        kernel.config.power_off_when_done = true;
        let mut boot = Bootstrapper::new(&table, Capabilities::FILESYSTEM).unwrap();
        let err = boot.run_all(&mut kernel).unwrap_err();
        kernel.events.clear();

        let mut machine = TestMachine::default();
        let exit = exit_of(|| fatal(&err, &mut boot, &mut kernel, &mut machine));
        assert_eq!(exit, Exit::PowerOff);
        assert!(machine.panic_mode);
        assert_eq!(kernel.events.first().map(String::as_str), Some("down serial-and-timer"));
        assert!(!kernel.events.iter().any(|e| e == "down filesystem"));
    }

    #[test]
    fn fatal_without_quit_halts_without_teardown() {
        let table = table(false);
        let mut kernel = TestKernel::new(Capabilities::NONE);
        let mut boot = Bootstrapper::new(&table, Capabilities::NONE).unwrap();
        boot.run_all(&mut kernel).unwrap();
        kernel.events.clear();

        let exit = exit_of(|| {
            fatal(&"unknown action `x'", &mut boot, &mut kernel, &mut TestMachine::default())
        });
        assert_eq!(exit, Exit::Halt);
        assert!(kernel.events.is_empty());
    }
}
