//! # Virtual Memory Support
//!
//! x86-64 four-level paging for the kernel's boot path.
//!
//! ## What you get
//! - [`PageEntryBits`], the raw 64-bit entry layout shared by all levels.
//! - A 4 KiB-aligned [`PageTable`] and the [`Level`] index helpers.
//! - The [`FrameAlloc`]/[`FrameStore`] seam through which tables are
//!   allocated and reached, with an in-memory [`FrameArena`].
//! - An [`AddressSpace`] rooted at a PML4.
//! - The kernel's own direct mapping in [`kernel_map`].
//!
//! ## x86-64 Virtual Address → Physical Address Walk
//!
//! Each 48-bit virtual address is divided into five fields:
//!
//! ```text
//! | 47‒39 | 38‒30 | 29‒21 | 20‒12 | 11‒0   |
//! |  PML4 |  PDPT |   PD  |   PT  | Offset |
//! ```
//!
//! The CPU uses these fields as **indices** into four levels of page tables,
//! each level containing 512 (2⁹) entries of 8 bytes (64 bits) each.
//!
//! ```text
//!  PML4  →  PDPT  →  PD  →  PT  →  Physical Page
//!   │        │        │        │
//!   │        │        │        └───► PTE   (Page Table Entry)  → maps 4 KiB page
//!   │        │        └────────────► PDE   (Page Directory Entry) → PS=1 → 2 MiB page
//!   │        └─────────────────────► PDPTE (Page Directory Pointer Table Entry) → PS=1 → 1 GiB page
//!   └──────────────────────────────► PML4E (Page Map Level 4 Entry)
//! ```
//!
//! The kernel itself only ever installs 4 KiB leaves; larger leaves are
//! understood when walking.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod address_space;
pub mod frames;
pub mod kernel_map;
mod page_entry_bits;
pub mod page_table;

pub use crate::address_space::{AddressSpace, AddressSpaceError};
pub use crate::frames::{FrameAlloc, FrameArena, FrameOutOfBounds, FrameStore};
pub use crate::kernel_map::build_kernel_address_space;
pub use crate::page_entry_bits::PageEntryBits;
pub use crate::page_table::{Level, PageTable, split_indices};

/// Re-export constants as info module.
pub use kernel_info::memory as info;
