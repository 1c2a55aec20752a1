//! # QEMU Debug Console and Machine Control
//!
//! Output and machine control for kernels running under QEMU.
//!
//! ## Debug console
//! Everything the kernel prints goes to QEMU's debug port (`0x402`), which
//! the host captures with `-debugcon stdio` or `-debugcon file:boot.log`.
//!
//! ```text
//! log::info!() ──► QemuLogger ──┐
//!                                ├──► QemuSink ──► out 0x402 ──► host
//! qemu_trace!() ─────────────────┘
//! ```
//!
//! [`QemuLogger`] is a `log::Log` that formats `[LEVEL] target: message`
//! lines, counts the characters it emits and serializes writers through a
//! spin lock once [`QemuLogger::enable_locking`] has been called.
//!
//! ## Machine control
//! [`machine::power_off`] asks the emulated ACPI controller to shut down,
//! [`machine::halt`] parks the CPU with interrupts off.
//!
//! ## `enabled` Feature (default)
//! Without it the port writes compile to nothing; counters still advance.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;
pub mod machine;
mod port;

pub use logger::{QemuLogger, write_record};

#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// The port number for QEMU's debug port.
    const QEMU_DEBUG_PORT: u16 = 0x402;

    /// Write a single character to QEMU's debug port.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        #[cfg(feature = "enabled")]
        unsafe {
            crate::port::outb(QEMU_DEBUG_PORT, c);
        }
        #[cfg(not(feature = "enabled"))]
        let _ = (QEMU_DEBUG_PORT, c);
    }

    /// `fmt::Write` adapter over the debug port.
    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                dbg_putc(b);
            }
            Ok(())
        }
    }

    /// Wraps a writer and counts the bytes passed through it.
    pub struct Counting<W> {
        inner: W,
        count: usize,
    }

    impl<W: Write> Counting<W> {
        pub const fn new(inner: W) -> Self {
            Self { inner, count: 0 }
        }

        pub const fn count(&self) -> usize {
            self.count
        }
    }

    impl<W: Write> Write for Counting<W> {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.count += s.len();
            self.inner.write_str(s)
        }
    }

    /// Write `args` to the debug port, returning the number of bytes written.
    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(args: fmt::Arguments) -> usize {
        let mut sink = Counting::new(QemuSink);
        // Best-effort debug output.
        let _ = fmt::write(&mut sink, args);
        sink.count()
    }
}

/// Format straight to the debug port, bypassing the logger.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        // No allocation: `format_args!` builds a lightweight `Arguments`.
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*))
    }};
}
