//! # Memory Layout
//!
//! The loader maps all of physical memory at a fixed offset, and the kernel
//! keeps that scheme when it builds its own page table: physical address `pa`
//! is always visible at virtual address `pa + KERNEL_OFFSET`.

use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Offset of the kernel's direct mapping of physical memory.
///
/// Physical address `0` is visible at this virtual address; the kernel image
/// itself is linked at [`KERNEL_BASE`] inside the same window.
pub const KERNEL_OFFSET: u64 = 0x0000_0080_0400_0000;

/// Physical address the loader places the kernel image at.
pub const PHYS_LOAD: u64 = 0x0020_0000; // 2 MiB

/// Virtual address the kernel image is linked at (VMA).
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const KERNEL_BASE: u64 = KERNEL_OFFSET + PHYS_LOAD;

/// The size of the boot stack the entry trampoline switches to.
pub const BOOT_STACK_SIZE: usize = 64 * 1024;

const _: () = {
    assert!(KERNEL_OFFSET.is_multiple_of(4096));
    assert!(PHYS_LOAD.is_multiple_of(4096));
    assert!(BOOT_STACK_SIZE.is_multiple_of(16));
};

/// Translate a physical address into the kernel's direct mapping.
///
/// Valid for every `pa` below the discovered end of memory; the mapping is
/// established by the loader and re-established by the kernel's own page
/// table.
///
/// ```rust
/// # use kernel_info::memory::{ptov, vtop, KERNEL_OFFSET};
/// # use kernel_memory_addresses::PhysicalAddress;
/// let pa = PhysicalAddress::new(0x1234);
/// assert_eq!(ptov(pa).as_u64(), KERNEL_OFFSET + 0x1234);
/// assert_eq!(vtop(ptov(pa)), pa);
/// ```
#[inline]
#[must_use]
pub const fn ptov(pa: PhysicalAddress) -> VirtualAddress {
    VirtualAddress::new(pa.as_u64() + KERNEL_OFFSET)
}

/// Inverse of [`ptov`].
///
/// `va` must lie inside the direct mapping; see [`try_vtop`] for a checked
/// variant.
#[inline]
#[must_use]
pub const fn vtop(va: VirtualAddress) -> PhysicalAddress {
    debug_assert!(va.as_u64() >= KERNEL_OFFSET, "not a kernel virtual address");
    PhysicalAddress::new(va.as_u64() - KERNEL_OFFSET)
}

/// Checked inverse of [`ptov`]; `None` for addresses below the kernel window.
#[inline]
#[must_use]
pub const fn try_vtop(va: VirtualAddress) -> Option<PhysicalAddress> {
    match va.as_u64().checked_sub(KERNEL_OFFSET) {
        Some(pa) => Some(PhysicalAddress::new(pa)),
        None => None,
    }
}

/// Whether `va` lies in the kernel's half of the address space.
#[inline]
#[must_use]
pub const fn is_kernel_vaddr(va: VirtualAddress) -> bool {
    va.as_u64() >= KERNEL_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn user_addresses_do_not_translate() {
        assert_eq!(try_vtop(VirtualAddress::new(0x40_0000)), None);
        assert!(!is_kernel_vaddr(VirtualAddress::new(0x40_0000)));
        assert!(is_kernel_vaddr(ptov(PhysicalAddress::zero())));
    }

    #[test]
    fn kernel_image_sits_inside_the_window() {
        assert_eq!(vtop(VirtualAddress::new(KERNEL_BASE)).as_u64(), PHYS_LOAD);
    }

    proptest! {
        #[test]
        fn ptov_and_vtop_are_inverse(pa in 0u64..(1u64 << 40)) {
            let pa = PhysicalAddress::new(pa);
            prop_assert_eq!(vtop(ptov(pa)), pa);
            prop_assert_eq!(try_vtop(ptov(pa)), Some(pa));
        }
    }
}
