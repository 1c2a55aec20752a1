use crate::{LoadRegisterUnsafe, StoreRegisterUnsafe};
use bitfield_struct::bitfield;
use kernel_memory_addresses::PhysicalAddress;

/// CR3: Page-Map Level-4 Base Register (IA-32e, PCID disabled).
///
/// Holds the physical base address of the top-level page table and the
/// cache-control flags for walks through it. Loading a new value switches
/// the active address space and flushes non-global TLB entries.
#[bitfield(u64)]
pub struct Cr3 {
    /// Bits 0–2: Reserved (must be 0).
    #[bits(3)]
    pub reserved0: u8,

    /// Bit 3: PWT: Page-level Write-Through for PML4.
    pub pwt: bool,

    /// Bit 4: PCD: Page-level Cache Disable for PML4.
    pub pcd: bool,

    /// Bits 5–11: Reserved (must be 0 when written).
    #[bits(7)]
    pub reserved1: u8,

    /// Bits 12–51: PML4 physical base >> 12.
    #[bits(40)]
    pml4_base_4k: u64,

    /// Bits 52–63: Reserved.
    #[bits(12)]
    pub reserved2: u16,
}

impl Cr3 {
    /// Create a `Cr3` value from a PML4 physical base address and flags.
    ///
    /// `pml4_phys` must be 4 KiB-aligned.
    #[must_use]
    pub fn from_pml4_phys(pml4_phys: PhysicalAddress, pwt: bool, pcd: bool) -> Self {
        debug_assert!(pml4_phys.is_page_aligned(), "PML4 base must be 4K-aligned");
        let mut cr3 = Self::new();
        cr3.set_pwt(pwt);
        cr3.set_pcd(pcd);
        cr3.set_pml4_base_4k(pml4_phys.as_u64() >> 12);
        cr3
    }

    /// Return the full physical address of the PML4 base.
    #[must_use]
    pub fn pml4_phys(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.pml4_base_4k() << 12)
    }
}

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl LoadRegisterUnsafe for Cr3 {
    unsafe fn load_unsafe() -> Self {
        let mut cr3: u64;
        unsafe {
            core::arch::asm!("mov {}, cr3", out(reg) cr3, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(cr3)
    }
}

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl StoreRegisterUnsafe for Cr3 {
    unsafe fn store_unsafe(self) {
        let cr3 = self.into_bits();
        unsafe {
            core::arch::asm!("mov cr3, {}", in(reg) cr3, options(nostack, preserves_flags));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_round_trips_through_the_register_layout() {
        let cr3 = Cr3::from_pml4_phys(PhysicalAddress::new(0x0012_3000), false, true);
        assert_eq!(cr3.pml4_phys().as_u64(), 0x0012_3000);
        assert!(cr3.pcd());
        assert!(!cr3.pwt());
        assert_eq!(cr3.into_bits(), 0x0012_3000 | (1 << 4));
    }
}
