//! # Page Tables
//!
//! All four paging levels share one 4 KiB layout of 512 entries; the level
//! only decides how a virtual address selects an entry and whether `PS`
//! may be set.

use crate::PageEntryBits;
use core::fmt;
use kernel_memory_addresses::VirtualAddress;

/// Number of entries per table.
pub const ENTRIES: usize = 512;

/// One paging level in the four-level walk, top to bottom.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Level {
    Pml4,
    Pdpt,
    Pd,
    Pt,
}

impl Level {
    /// Levels in walk order.
    pub const WALK: [Self; 4] = [Self::Pml4, Self::Pdpt, Self::Pd, Self::Pt];

    /// Bit position of this level's 9-bit index inside a virtual address.
    #[inline]
    #[must_use]
    pub const fn shift(self) -> u32 {
        match self {
            Self::Pml4 => 39,
            Self::Pdpt => 30,
            Self::Pd => 21,
            Self::Pt => 12,
        }
    }

    /// Bytes covered by one entry at this level.
    #[inline]
    #[must_use]
    pub const fn entry_span(self) -> u64 {
        1 << self.shift()
    }

    /// The entry index `va` selects at this level.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index_of(self, va: VirtualAddress) -> usize {
        ((va.as_u64() >> self.shift()) & 0x1FF) as usize
    }

    /// The level below this one, `None` for [`Level::Pt`].
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pml4 => Some(Self::Pdpt),
            Self::Pdpt => Some(Self::Pd),
            Self::Pd => Some(Self::Pt),
            Self::Pt => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pml4 => "PML4",
            Self::Pdpt => "PDPT",
            Self::Pd => "PD",
            Self::Pt => "PT",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split a virtual address into its PML4, PDPT, PD and PT indices.
#[inline]
#[must_use]
pub const fn split_indices(va: VirtualAddress) -> [usize; 4] {
    [
        Level::Pml4.index_of(va),
        Level::Pdpt.index_of(va),
        Level::Pd.index_of(va),
        Level::Pt.index_of(va),
    ]
}

/// A 4 KiB-aligned table of 512 entries.
#[repr(C, align(4096))]
#[derive(Clone)]
pub struct PageTable {
    entries: [PageEntryBits; ENTRIES],
}

const _: () = assert!(size_of::<PageTable>() == 4096);

impl PageTable {
    #[inline]
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            entries: [PageEntryBits::new(); ENTRIES],
        }
    }

    /// Read the entry at `index` (`index < 512`).
    #[inline]
    #[must_use]
    pub const fn get(&self, index: usize) -> PageEntryBits {
        self.entries[index]
    }

    #[inline]
    pub const fn set(&mut self, index: usize, entry: PageEntryBits) {
        self.entries[index] = entry;
    }

    /// Reset every entry to not-present.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.fill(PageEntryBits::new());
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageEntryBits> {
        self.entries.iter()
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_ok() {
        let va = VirtualAddress::new(0x0000_0080_0420_3000);
        assert_eq!(split_indices(va), [1, 0, 33, 3]);

        let va = VirtualAddress::new(0xFFFF_8888_0123_4567);
        assert!(split_indices(va).iter().all(|&i| i < ENTRIES));
    }

    #[test]
    fn levels_walk_downwards() {
        assert_eq!(Level::Pml4.next(), Some(Level::Pdpt));
        assert_eq!(Level::Pt.next(), None);
        assert_eq!(Level::Pd.entry_span(), 2 * 1024 * 1024);
    }

    #[test]
    fn fresh_table_has_no_present_entries() {
        let mut t = PageTable::zeroed();
        assert!(t.iter().all(|e| !e.present()));
        t.set(7, PageEntryBits::kernel_table());
        assert!(t.get(7).present());
        t.clear();
        assert!(!t.get(7).present());
    }
}
