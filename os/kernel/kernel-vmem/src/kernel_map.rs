//! # Kernel Address Space
//!
//! Builds the page table the kernel runs on for the rest of its life: every
//! physical page below `mem_end` is mapped once at `ptov(pa)`, writable
//! except for the pages holding kernel text.

use crate::{AddressSpace, AddressSpaceError, FrameAlloc, FrameStore, PageEntryBits};
use core::ops::Range;
use kernel_info::memory::ptov;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, VirtualAddress};

/// Leaf flags for the direct mapping of `pa`.
#[inline]
#[must_use]
pub fn kernel_leaf(pa: PhysicalAddress, text: &Range<VirtualAddress>) -> PageEntryBits {
    let writable = !text.contains(&ptov(pa));
    PageEntryBits::kernel_page(pa, writable)
}

/// Map `[0, mem_end)` at `KERNEL_OFFSET` into a fresh address space.
///
/// Pages whose virtual address lies in `text` are mapped read-only. The
/// returned space is not yet active.
///
/// # Errors
/// [`AddressSpaceError::OutOfMemory`] naming the table level that could not
/// be allocated; there is no fallback.
pub fn build_kernel_address_space<F: FrameAlloc + FrameStore>(
    frames: &mut F,
    mem_end: PhysicalAddress,
    text: Range<VirtualAddress>,
) -> Result<AddressSpace, AddressSpaceError> {
    let space = AddressSpace::new(frames)?;
    let nonleaf = PageEntryBits::kernel_table();

    let pages = PhysicalPage::range(PhysicalAddress::zero(), mem_end);
    log::debug!(
        "Mapping {} pages at {}, text {}..{} read-only",
        pages.len(),
        ptov(PhysicalAddress::zero()),
        text.start,
        text.end
    );

    for page in pages {
        let pa = page.base();
        space.map_4k(frames, ptov(pa), pa, nonleaf, kernel_leaf(pa, &text))?;
    }

    log::info!("Kernel address space built, root at {}", space.root_page().base());
    Ok(space)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_table::Level;
    use crate::FrameArena;
    use kernel_memory_addresses::PAGE_SIZE;

    const MEM_END: u64 = 4 * 1024 * 1024;

    fn text() -> Range<VirtualAddress> {
        ptov(PhysicalAddress::new(0x10_0000))..ptov(PhysicalAddress::new(0x10_3000))
    }

    #[test]
    fn every_page_is_mapped_once_with_the_right_permissions() {
        let mut frames = FrameArena::<8>::new(PhysicalPage::from_frame_number(0x1000));
        let space =
            build_kernel_address_space(&mut frames, PhysicalAddress::new(MEM_END), text()).unwrap();

        let text = text();
        for pa in (0..MEM_END).step_by(PAGE_SIZE as usize) {
            let pa = PhysicalAddress::new(pa);
            let va = ptov(pa);
            let (level, entry) = space.entry(&frames, va).unwrap().unwrap();
            assert_eq!(level, Level::Pt);
            assert!(entry.present());
            assert_eq!(entry.physical_address(), pa);
            assert_eq!(entry.writable(), !text.contains(&va), "at {pa}");
        }

        assert_eq!(space.query(&frames, ptov(PhysicalAddress::new(MEM_END))).unwrap(), None);
        assert_eq!(space.query(&frames, VirtualAddress::new(0x1000)).unwrap(), None);
        // root, PDPT, PD, two PTs
        assert_eq!(frames.used(), 5);
    }

    #[test]
    fn partial_trailing_page_is_not_mapped() {
        let mut frames = FrameArena::<8>::new(PhysicalPage::from_frame_number(0x1000));
        let end = PhysicalAddress::new(0x2800);
        let space = build_kernel_address_space(&mut frames, end, text()).unwrap();
        assert!(space.query(&frames, ptov(PhysicalAddress::new(0x1000))).unwrap().is_some());
        assert!(space.query(&frames, ptov(PhysicalAddress::new(0x2000))).unwrap().is_none());
    }

    #[test]
    fn running_out_of_table_frames_is_fatal() {
        let mut frames = FrameArena::<4>::new(PhysicalPage::from_frame_number(0x1000));
        let err = build_kernel_address_space(&mut frames, PhysicalAddress::new(MEM_END), text())
            .unwrap_err();
        assert_eq!(err, AddressSpaceError::OutOfMemory { level: Level::Pt });
    }
}
