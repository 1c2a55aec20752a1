//! # Virtual and Physical Memory Address Types
//!
//! Strongly typed wrappers for raw memory addresses and 4 KiB page frames used
//! by the boot-time paging code.
//!
//! ## Overview
//!
//! The kernel only ever maps physical memory in 4 KiB granules while it builds
//! its initial address space, so this crate keeps a single page size and
//! focuses on not mixing the two address kinds:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | A byte address in physical memory (RAM or MMIO). |
//! | [`VirtualAddress`]  | A byte address translated through the page tables. |
//! | [`PhysicalPage`]    | A 4 KiB-aligned physical frame, addressable by frame number. |
//!
//! [`PhysicalPage::range`] walks every frame of a physical extent, which is
//! exactly what the kernel-map builder needs when it maps `[0, mem_end)`.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0000_0000_0012_3456);
//! let frame = pa.page();
//! assert_eq!(frame.base().as_u64(), 0x12_3000);
//! assert_eq!(frame.frame_number(), 0x123);
//! assert_eq!(pa.page_offset(), 0x456);
//!
//! let frames: u64 = PhysicalPage::range(PhysicalAddress::zero(), PhysicalAddress::new(0x3000)).count() as u64;
//! assert_eq!(frames, 3);
//! ```
//!
//! ## Design Notes
//!
//! - The types are `#[repr(transparent)]` over `u64` and implement `Copy`,
//!   `Eq`, `Ord`, and `Hash`.
//! - All alignment calculations are `const fn`.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod physical_address;
mod physical_page;
mod virtual_address;

pub use physical_address::PhysicalAddress;
pub use physical_page::{PageRange, PhysicalPage};
pub use virtual_address::VirtualAddress;

/// log2 of the page size.
pub const PAGE_SHIFT: u32 = 12;

/// Size of a page frame in bytes (4 KiB).
pub const PAGE_SIZE: u64 = 1 << PAGE_SHIFT;

/// Mask selecting the in-page offset bits.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// Align `x` down to the nearest multiple of `a`.
///
/// `a` must be a non-zero power of two.
///
/// ```rust
/// # use kernel_memory_addresses::align_down;
/// assert_eq!(align_down(4095, 4096), 0);
/// assert_eq!(align_down(8191, 4096), 4096);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_down(x: u64, a: u64) -> u64 {
    x & !(a - 1)
}

/// Align `x` up to the nearest multiple of `a`.
///
/// `a` must be a non-zero power of two and `x + (a - 1)` must not overflow.
///
/// ```rust
/// # use kernel_memory_addresses::align_up;
/// assert_eq!(align_up(1, 4096), 4096);
/// assert_eq!(align_up(4096, 4096), 4096);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_up(x: u64, a: u64) -> u64 {
    (x + a - 1) & !(a - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_and_offset_split() {
        let pa = PhysicalAddress::new(0x0000_0010_2000_0042);
        assert_eq!(pa.page().base().as_u64(), 0x0000_0010_2000_0000);
        assert_eq!(pa.page_offset(), 0x42);
        assert!(!pa.is_page_aligned());
        assert!(pa.page().base().is_page_aligned());
    }

    #[test]
    fn virtual_address_offsets() {
        let va = VirtualAddress::new(0xFFFF_FFFF_8000_1234);
        assert_eq!(va.page_offset(), 0x234);
        assert_eq!(va.align_down().as_u64(), 0xFFFF_FFFF_8000_1000);
    }

    #[test]
    fn frame_numbers_round_trip() {
        let frame = PhysicalPage::from_frame_number(0x1_2345);
        assert_eq!(frame.base().as_u64(), 0x1234_5000);
        assert_eq!(frame.frame_number(), 0x1_2345);
        assert_eq!(PhysicalPage::from_addr(frame.base() + 0xFFF), frame);
    }

    #[test]
    fn page_range_is_half_open() {
        let start = PhysicalAddress::new(0x1000);
        let end = PhysicalAddress::new(0x4000);
        let frames: std::vec::Vec<u64> = PhysicalPage::range(start, end)
            .map(PhysicalPage::frame_number)
            .collect();
        assert_eq!(frames, [1, 2, 3]);
    }

    #[test]
    fn page_range_rounds_partial_pages() {
        // A partial leading frame is excluded, a partial trailing frame is not reached.
        let start = PhysicalAddress::new(0x0800);
        let end = PhysicalAddress::new(0x2800);
        assert_eq!(PhysicalPage::range(start, end).count(), 1);
        assert_eq!(PhysicalPage::range(end, start).count(), 0);
    }
}
