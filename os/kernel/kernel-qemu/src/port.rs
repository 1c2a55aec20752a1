//! Port I/O.

/// # Safety
/// Ring 0 only; the write must be harmless for whatever device sits at `port`.
#[allow(clippy::inline_always)]
#[inline(always)]
pub unsafe fn outb(port: u16, val: u8) {
    unsafe {
        core::arch::asm!(
            "out dx, al",
            in("dx") port,
            in("al") val,
            options(nomem, nostack, preserves_flags)
        );
    }
}

/// # Safety
/// Ring 0 only; the write must be harmless for whatever device sits at `port`.
#[allow(clippy::inline_always)]
#[inline(always)]
pub unsafe fn outw(port: u16, val: u16) {
    unsafe {
        core::arch::asm!(
            "out dx, ax",
            in("dx") port,
            in("ax") val,
            options(nomem, nostack, preserves_flags)
        );
    }
}
