//! # Interrupt masking
//!
//! Uses `cli`/`sti` and `pushfq/pop`, so it targets `x86_64` and must run in
//! a context where those instructions are legal (ring 0).

/// RFLAGS.IF
const IF_BIT: u64 = 1 << 9;

/// Whether maskable interrupts are delivered.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InterruptLevel {
    Off,
    On,
}

/// Disables hardware interrupts (`cli`).
#[inline]
pub fn cli_stop_interrupts() {
    unsafe { core::arch::asm!("cli", options(nomem, nostack, preserves_flags)) }
}

/// Enables hardware interrupts (`sti`).
#[inline]
pub fn sti_enable_interrupts() {
    unsafe { core::arch::asm!("sti", options(nomem, nostack, preserves_flags)) }
}

/// Returns the current `RFLAGS` value (via `pushfq/pop`).
#[inline]
#[must_use]
pub fn rflags() -> u64 {
    let r: u64;
    unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(nostack, preserves_flags)) }
    r
}

/// The current interrupt level.
#[inline]
#[must_use]
pub fn level() -> InterruptLevel {
    if rflags() & IF_BIT == 0 {
        InterruptLevel::Off
    } else {
        InterruptLevel::On
    }
}

/// Switch to `level`, returning the previous level.
#[inline]
pub fn set_level(level: InterruptLevel) -> InterruptLevel {
    let old = self::level();
    match level {
        InterruptLevel::Off => cli_stop_interrupts(),
        InterruptLevel::On => sti_enable_interrupts(),
    }
    old
}

/// RAII guard that disables interrupts on creation and restores them on drop.
///
/// ```no_run
/// use kernel_sync::irq::{IrqGuard, level, InterruptLevel};
///
/// {
///     let _g = IrqGuard::new();
///     assert_eq!(level(), InterruptLevel::Off);
/// }
/// ```
pub struct IrqGuard {
    previous: InterruptLevel,
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqGuard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            previous: set_level(InterruptLevel::Off),
        }
    }
}

impl Drop for IrqGuard {
    /// Restores interrupts (`sti`) only if they were previously enabled.
    fn drop(&mut self) {
        if self.previous == InterruptLevel::On {
            sti_enable_interrupts();
        }
    }
}
