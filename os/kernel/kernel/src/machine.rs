//! The emulated PC the kernel runs on.

use core::sync::atomic::{AtomicBool, Ordering};
use kernel_boot::Machine;
use kernel_qemu::{QemuLogger, machine, qemu_trace};

static POWER_OFF_ON_PANIC: AtomicBool = AtomicBool::new(false);

/// Whether a Rust panic powers the machine off (`-q`) or halts it.
pub fn power_off_on_panic(enabled: bool) {
    POWER_OFF_ON_PANIC.store(enabled, Ordering::Relaxed);
}

pub struct QemuMachine;

impl Machine for QemuMachine {
    fn power_off(&mut self) -> ! {
        machine::power_off()
    }

    fn halt(&mut self) -> ! {
        machine::halt()
    }

    /// No tick source drives the scheduler, so idling is halting.
    fn idle(&mut self) -> ! {
        log::debug!("Boot task finished, idling");
        machine::halt()
    }

    fn enter_panic_mode(&mut self) {
        if let Some(logger) = QemuLogger::get() {
            logger.disable_locking();
        }
    }
}

/// Rust panics end up on the same halt path as boot errors.
pub fn panic(info: &core::panic::PanicInfo) -> ! {
    QemuMachine.enter_panic_mode();
    qemu_trace!("Kernel PANIC at {info}\n");
    if POWER_OFF_ON_PANIC.load(Ordering::Relaxed) {
        machine::power_off()
    }
    machine::halt()
}
