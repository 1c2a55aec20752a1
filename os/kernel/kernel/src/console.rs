//! Console output: everything ends up on the QEMU debug port.

use crate::kernel::Kernel;
use core::fmt;
use kernel_boot::StepError;
use kernel_qemu::{QemuLogger, qemu_trace};
use log::LevelFilter;

/// Print to the console, counted and locked like log output.
#[macro_export]
macro_rules! kprintln {
    ($($arg:tt)*) => {
        $crate::console::print(core::format_args!("{}\n", core::format_args!($($arg)*)))
    };
}

pub fn print(args: fmt::Arguments) {
    match QemuLogger::get() {
        Some(logger) => logger.print(args),
        None => {
            qemu_trace!("{args}");
        }
    }
}

/// `fmt::Write` over [`print`].
pub struct Console;

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        print(format_args!("{s}"));
        Ok(())
    }
}

/// Install the logger; the first thing after `.bss` is zeroed.
pub fn install_logger() -> Result<(), StepError> {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    QemuLogger::new(level)
        .init()
        .map_err(|_| StepError::Failed("a logger is already installed"))?;
    Ok(())
}

/// Console stage: writers are serialized from here on.
pub fn init(_: &mut Kernel) -> Result<(), StepError> {
    QemuLogger::get()
        .ok_or(StepError::Failed("no logger installed"))?
        .enable_locking();
    Ok(())
}

pub fn report(_: &Kernel) {
    let chars = QemuLogger::get().map_or(0, QemuLogger::chars_written);
    crate::kprintln!("Console: {chars} characters output");
}
