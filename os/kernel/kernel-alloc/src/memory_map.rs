//! # Physical Memory Discovery
//!
//! Interprets the firmware's E820 map as handed over by the loader.

use core::ops::Range;
use kernel_info::boot::{E820Entry, E820Kind};
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, align_down, align_up};

/// A read-only view of the E820 entries the loader left behind.
#[derive(Copy, Clone, Debug)]
pub struct MemoryMap<'a> {
    entries: &'a [E820Entry],
}

impl<'a> MemoryMap<'a> {
    #[must_use]
    pub const fn new(entries: &'a [E820Entry]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> impl Iterator<Item = &'a E820Entry> {
        self.entries.iter()
    }

    /// Entries the kernel may treat as RAM.
    pub fn usable(&self) -> impl Iterator<Item = &'a E820Entry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind(), E820Kind::Usable | E820Kind::AcpiReclaimable))
            .filter(|e| !e.is_empty())
    }

    /// End of physical memory: the highest end of any usable entry, page
    /// aligned down. Zero if the map has no usable entry.
    #[must_use]
    pub fn mem_end(&self) -> PhysicalAddress {
        let end = self.usable().map(E820Entry::end).max().unwrap_or(0);
        PhysicalAddress::new(align_down(end, PAGE_SIZE))
    }

    /// Total bytes of usable memory.
    #[must_use]
    pub fn usable_bytes(&self) -> u64 {
        self.usable().map(E820Entry::len).sum()
    }

    /// The page-aligned usable region containing `pa`, if any.
    #[must_use]
    pub fn usable_region_containing(&self, pa: PhysicalAddress) -> Option<Range<PhysicalAddress>> {
        self.usable()
            .find(|e| (e.base()..e.end()).contains(&pa.as_u64()))
            .map(|e| {
                PhysicalAddress::new(align_up(e.base(), PAGE_SIZE))
                    ..PhysicalAddress::new(align_down(e.end(), PAGE_SIZE))
            })
    }
}
