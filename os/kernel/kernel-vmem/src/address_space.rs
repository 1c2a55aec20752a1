//! # Address Space (x86-64, PML4-rooted)
//!
//! Helpers to build and inspect a **single** virtual address space (tree
//! rooted at a PML4).
//!
//! ## Highlights
//!
//! - [`AddressSpace::ensure_chain`] to allocate/link missing intermediate
//!   tables down to the PT holding the leaf for a virtual address.
//! - [`AddressSpace::map_4k`] to install one 4 KiB mapping.
//! - [`AddressSpace::entry`] and [`AddressSpace::query`] to walk without
//!   creating anything.
//! - [`AddressSpace::activate`] to load CR3 with this space's root.
//!
//! ## Design
//!
//! - Non-leaf entries are created with caller-provided **non-leaf flags**;
//!   leaf flags come from the mapping call.
//! - Tables are only reached through a [`FrameStore`], so a corrupt link to
//!   a frame the store cannot reach surfaces as an error.

use crate::page_table::Level;
use crate::{FrameAlloc, FrameOutOfBounds, FrameStore, PageEntryBits};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, VirtualAddress};

/// Handle to a single, concrete address space.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AddressSpace {
    root: PhysicalPage,
}

/// Errors raised while building an address space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressSpaceError {
    /// No frame was available for a new table at `level`.
    #[error("out of memory allocating a {level} table")]
    OutOfMemory { level: Level },
    /// A large-page leaf occupies the slot the walk needs to descend through.
    #[error("large page at {level} level blocks a 4 KiB mapping")]
    LargePageInTheWay { level: Level },
    #[error(transparent)]
    FrameOutOfBounds(#[from] FrameOutOfBounds),
}

impl AddressSpace {
    /// Allocate a fresh, empty root table.
    ///
    /// # Errors
    /// [`AddressSpaceError::OutOfMemory`] at [`Level::Pml4`].
    pub fn new<A: FrameAlloc>(frames: &mut A) -> Result<Self, AddressSpaceError> {
        let root = frames
            .alloc_zeroed_4k()
            .ok_or(AddressSpaceError::OutOfMemory { level: Level::Pml4 })?;
        Ok(Self { root })
    }

    /// Wrap an existing root table.
    #[inline]
    #[must_use]
    pub const fn from_root(root: PhysicalPage) -> Self {
        Self { root }
    }

    /// Physical page of the PML4.
    #[inline]
    #[must_use]
    pub const fn root_page(&self) -> PhysicalPage {
        self.root
    }

    /// Ensure that PDPT, PD and PT exist for `va`, creating missing levels
    /// with `nonleaf_flags`, and return the PT frame.
    ///
    /// # Errors
    /// - [`AddressSpaceError::OutOfMemory`] naming the level that could not
    ///   be allocated.
    /// - [`AddressSpaceError::LargePageInTheWay`] if a 1 GiB or 2 MiB leaf
    ///   already covers `va`.
    /// - [`AddressSpaceError::FrameOutOfBounds`] for links the store cannot reach.
    pub fn ensure_chain<F: FrameAlloc + FrameStore>(
        &self,
        frames: &mut F,
        va: VirtualAddress,
        nonleaf_flags: PageEntryBits,
    ) -> Result<PhysicalPage, AddressSpaceError> {
        let mut table = self.root;
        let mut level = Level::Pml4;

        while let Some(child) = level.next() {
            let index = level.index_of(va);
            let entry = frames.table(table)?.get(index);

            table = if entry.present() {
                if entry.large_page() {
                    return Err(AddressSpaceError::LargePageInTheWay { level });
                }
                PhysicalPage::from_addr(entry.physical_address())
            } else {
                let next = frames
                    .alloc_zeroed_4k()
                    .ok_or(AddressSpaceError::OutOfMemory { level: child })?;
                frames
                    .table_mut(table)?
                    .set(index, nonleaf_flags.with_physical_address(next.base()));
                next
            };
            level = child;
        }

        Ok(table)
    }

    /// Map **one** 4 KiB page at `va → pa` with `leaf_flags`.
    ///
    /// Any previous PTE for `va` is overwritten. `pa` must be page aligned.
    ///
    /// # Errors
    /// Propagates failures from [`ensure_chain`](Self::ensure_chain).
    pub fn map_4k<F: FrameAlloc + FrameStore>(
        &self,
        frames: &mut F,
        va: VirtualAddress,
        pa: PhysicalAddress,
        nonleaf_flags: PageEntryBits,
        leaf_flags: PageEntryBits,
    ) -> Result<(), AddressSpaceError> {
        debug_assert!(pa.is_page_aligned(), "physical address not aligned");

        let pt = self.ensure_chain(frames, va, nonleaf_flags)?;
        frames
            .table_mut(pt)?
            .set(Level::Pt.index_of(va), leaf_flags.with_physical_address(pa));
        Ok(())
    }

    /// Find the leaf entry translating `va` without creating anything.
    ///
    /// Returns the level the walk stopped at together with the entry, or
    /// `None` if an intermediate level is missing or the leaf is not present.
    ///
    /// # Errors
    /// [`FrameOutOfBounds`] for links the store cannot reach.
    pub fn entry<S: FrameStore>(
        &self,
        store: &S,
        va: VirtualAddress,
    ) -> Result<Option<(Level, PageEntryBits)>, FrameOutOfBounds> {
        let mut table = self.root;
        for level in Level::WALK {
            let entry = store.table(table)?.get(level.index_of(va));
            if !entry.present() {
                return Ok(None);
            }
            let is_leaf = level == Level::Pt || entry.large_page();
            if is_leaf {
                return Ok(Some((level, entry)));
            }
            table = PhysicalPage::from_addr(entry.physical_address());
        }
        Ok(None)
    }

    /// Translate a `VirtualAddress` to `PhysicalAddress` if mapped.
    ///
    /// Handles 1 GiB and 2 MiB leaves by adding the appropriate **in-page offset**.
    ///
    /// # Errors
    /// [`FrameOutOfBounds`] for links the store cannot reach.
    pub fn query<S: FrameStore>(
        &self,
        store: &S,
        va: VirtualAddress,
    ) -> Result<Option<PhysicalAddress>, FrameOutOfBounds> {
        Ok(self.entry(store, va)?.map(|(level, entry)| {
            let offset = va.as_u64() & (level.entry_span() - 1);
            entry.physical_address() + offset
        }))
    }

    /// Load CR3 with this address space's root.
    ///
    /// Every non-global TLB entry is flushed; the switch is immediate.
    ///
    /// # Safety
    /// Must run at CPL0. The space must map the currently executing code,
    /// the current stack and every structure the caller touches afterwards.
    #[cfg(target_arch = "x86_64")]
    #[inline]
    pub unsafe fn activate(&self) {
        use kernel_registers::{Cr3, StoreRegisterUnsafe};

        let cr3 = Cr3::from_pml4_phys(self.root.base(), false, false);
        unsafe {
            cr3.store_unsafe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameArena;

    fn arena<const N: usize>() -> FrameArena<N> {
        FrameArena::new(PhysicalPage::from_frame_number(0x100))
    }

    #[test]
    fn map_then_query_4k() {
        let mut frames = arena::<8>();
        let space = AddressSpace::new(&mut frames).unwrap();

        let va = VirtualAddress::new(0x0000_0080_0420_3000);
        let pa = PhysicalAddress::new(0x0020_3000);
        space
            .map_4k(
                &mut frames,
                va,
                pa,
                PageEntryBits::kernel_table(),
                PageEntryBits::kernel_page(PhysicalAddress::zero(), true),
            )
            .unwrap();

        assert_eq!(space.query(&frames, va + 0x123).unwrap(), Some(pa + 0x123));
        assert_eq!(space.query(&frames, va + 0x1000).unwrap(), None);
        // root + PDPT + PD + PT
        assert_eq!(frames.used(), 4);
    }

    #[test]
    fn neighbouring_pages_share_the_chain() {
        let mut frames = arena::<4>();
        let space = AddressSpace::new(&mut frames).unwrap();
        let flags = PageEntryBits::kernel_table();

        let a = space.ensure_chain(&mut frames, VirtualAddress::new(0x40_0000), flags).unwrap();
        let b = space.ensure_chain(&mut frames, VirtualAddress::new(0x40_1000), flags).unwrap();
        assert_eq!(a, b);
        assert_eq!(frames.used(), 4);
    }

    #[test]
    fn oom_names_the_missing_level() {
        let mut frames = arena::<2>();
        let space = AddressSpace::new(&mut frames).unwrap();
        let err = space
            .ensure_chain(&mut frames, VirtualAddress::new(0x1000), PageEntryBits::kernel_table())
            .unwrap_err();
        assert_eq!(err, AddressSpaceError::OutOfMemory { level: Level::Pd });

        let mut empty = arena::<0>();
        assert_eq!(
            AddressSpace::new(&mut empty).unwrap_err(),
            AddressSpaceError::OutOfMemory { level: Level::Pml4 }
        );
    }

    #[test]
    fn large_leaf_is_reported_by_query_but_blocks_chains() {
        let mut frames = arena::<2>();
        let space = AddressSpace::new(&mut frames).unwrap();
        let pdpt = frames.alloc_zeroed_4k().unwrap();

        let root = frames.table_mut(space.root_page()).unwrap();
        root.set(0, PageEntryBits::kernel_table().with_physical_address(pdpt.base()));
        let huge = PageEntryBits::kernel_page(PhysicalAddress::new(0x4000_0000), true).with_large_page(true);
        frames.table_mut(pdpt).unwrap().set(0, huge);

        let va = VirtualAddress::new(0x1234_5678);
        assert_eq!(
            space.query(&frames, va).unwrap(),
            Some(PhysicalAddress::new(0x4000_0000 + 0x1234_5678))
        );
        assert_eq!(
            space.ensure_chain(&mut frames, va, PageEntryBits::kernel_table()),
            Err(AddressSpaceError::LargePageInTheWay { level: Level::Pdpt })
        );
    }

    #[test]
    fn corrupt_link_is_a_checked_error() {
        let mut frames = arena::<1>();
        let space = AddressSpace::new(&mut frames).unwrap();
        let bogus = PhysicalPage::from_frame_number(0xdead);
        frames
            .table_mut(space.root_page())
            .unwrap()
            .set(0, PageEntryBits::kernel_table().with_physical_address(bogus.base()));

        assert_eq!(
            space.query(&frames, VirtualAddress::new(0x1000)),
            Err(FrameOutOfBounds { frame: bogus })
        );
    }
}
