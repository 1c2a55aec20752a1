//! Power-off and halt for QEMU's emulated PC.

use kernel_sync::irq::cli_stop_interrupts;

/// ACPI PM1a control port as wired up by QEMU's `-machine pc`.
const QEMU_ACPI_SHUTDOWN_PORT: u16 = 0x604;

/// `SLP_EN` with sleep type S5.
const QEMU_ACPI_SHUTDOWN_VALUE: u16 = 0x2000;

/// Power the machine off. Falls back to [`halt`] if the write is ignored,
/// as it is on real hardware.
pub fn power_off() -> ! {
    #[cfg(feature = "enabled")]
    unsafe {
        crate::port::outw(QEMU_ACPI_SHUTDOWN_PORT, QEMU_ACPI_SHUTDOWN_VALUE);
    }
    #[cfg(not(feature = "enabled"))]
    let _ = (QEMU_ACPI_SHUTDOWN_PORT, QEMU_ACPI_SHUTDOWN_VALUE);
    halt()
}

/// Stop the CPU with interrupts disabled. Never returns.
pub fn halt() -> ! {
    cli_stop_interrupts();
    loop {
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack, preserves_flags));
        }
    }
}
