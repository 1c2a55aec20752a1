use bitfield_struct::bitfield;
use kernel_memory_addresses::PhysicalAddress;

/// Represents a single 64-bit x86-64 page table entry in its raw bitfield form.
///
/// This structure models the **common superset** of fields found in all
/// four paging levels (PML4E, PDPTE, PDE, PTE). Each bit corresponds to a
/// hardware-defined flag or address field as specified by the AMD64 and
/// Intel manuals.
///
/// ### Bit layout (canonical)
///
/// | Bits      | Name / Mnemonic   | Meaning |
/// |-----------|-------------------|----------|
/// | 0         | `P` (present)     | Valid entry if set |
/// | 1         | `RW`              | Writable if set |
/// | 2         | `US`              | User-mode accessible if set |
/// | 3         | `PWT`             | Write-through caching |
/// | 4         | `PCD`             | Disable caching |
/// | 5         | `A`               | Accessed |
/// | 6         | `D`               | Dirty (leaf only) |
/// | 7         | `PS`              | Large page flag |
/// | 8         | `G`               | Global (leaf only) |
/// | 9–11      | OS avail low      | Reserved for OS use |
/// | 12–51     | `addr`            | Physical frame bits [51:12] |
/// | 52–58     | OS avail high     | Reserved for OS use |
/// | 59–62     | `PKU` / OS use    | Protection key or OS use |
/// | 63        | `NX`              | Execute disable |
///
/// ### Example
/// ```rust
/// # use kernel_memory_addresses::PhysicalAddress;
/// # use kernel_vmem::PageEntryBits;
/// let e = PageEntryBits::kernel_page(PhysicalAddress::new(0x12_3000), false);
/// assert!(e.present());
/// assert!(!e.writable());
/// assert_eq!(e.physical_address().as_u64(), 0x12_3000);
/// ```
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PageEntryBits {
    /// Present (P, bit 0).
    ///
    /// Set if the entry points to a valid next-level table or a valid leaf
    /// mapping. Clear implies a not-present entry.
    pub present: bool,

    /// Writable (RW, bit 1).
    ///
    /// Set to allow writes; clear for read-only. Supervisor writes honor
    /// this bit only while CR0.WP is set.
    pub writable: bool,

    /// User/Supervisor (US, bit 2).
    pub user_access: bool,

    /// Page Write-Through (PWT, bit 3).
    pub write_through: bool,

    /// Page Cache Disable (PCD, bit 4).
    pub cache_disabled: bool,

    /// Accessed (A, bit 5). Set by the CPU on first access.
    pub accessed: bool,

    /// Dirty (D, bit 6): **leaf only**.
    pub dirty: bool,

    /// Large Page / Page Size (PS, bit 7).
    ///
    /// For L3 (PDPTE) and L2 (PDE): when **set**, the entry is a **leaf**
    /// mapping to a 1 GiB (L3) or 2 MiB (L2) page. Must be clear in L4; in
    /// a 4 KiB PTE the bit is PAT.
    pub large_page: bool,

    /// Global (G, bit 8): **leaf only**.
    pub global_translation: bool,

    /// OS-available (bits 9..=11).
    #[bits(3)]
    pub os_available_low: u8,

    /// Physical address bits [51:12] (bits 12..=51).
    #[bits(40)]
    phys_addr_bits_51_12: u64,

    /// OS-available (bits 52..=58).
    #[bits(7)]
    pub os_available_high: u8,

    /// Protection Key (PKU, bits 59..=62) if supported; otherwise OS use.
    #[bits(4)]
    pub protection_key: u8,

    /// No-Execute (NX, bit 63).
    pub no_execute: bool,
}

impl PageEntryBits {
    #[inline]
    pub const fn set_physical_address(&mut self, phys: PhysicalAddress) {
        self.set_phys_addr_bits_51_12(phys.as_u64() >> 12);
    }

    #[inline]
    #[must_use]
    pub const fn with_physical_address(mut self, phys: PhysicalAddress) -> Self {
        self.set_physical_address(phys);
        self
    }

    #[inline]
    #[must_use]
    pub const fn physical_address(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.phys_addr_bits_51_12() << 12)
    }

    /// Flags for a supervisor-only link to a next-level table.
    #[inline]
    #[must_use]
    pub const fn kernel_table() -> Self {
        Self::new().with_present(true).with_writable(true)
    }

    /// A supervisor-only 4 KiB leaf mapping `phys`.
    #[inline]
    #[must_use]
    pub const fn kernel_page(phys: PhysicalAddress, writable: bool) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(writable)
            .with_physical_address(phys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_field_drops_the_page_offset() {
        let e = PageEntryBits::new().with_physical_address(PhysicalAddress::new(0x0000_0123_4567_8FFF));
        assert_eq!(e.physical_address().as_u64(), 0x0000_0123_4567_8000);
        assert!(!e.present());
    }

    #[test]
    fn kernel_table_link_is_present_and_writable() {
        let e = PageEntryBits::kernel_table();
        assert_eq!(e.into_bits(), 0b11);
    }
}
