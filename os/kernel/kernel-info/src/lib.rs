//! # Kernel Layout and Loader Interface
//!
//! This crate is the single source of truth for the constants the loader,
//! the kernel's build script and the boot code must agree on.
//!
//! ## Overview
//!
//! ### Memory Layout ([`memory`])
//! * **Direct mapping**: physical memory `[0, mem_end)` is visible at
//!   `KERNEL_OFFSET + pa`; [`memory::ptov`] and [`memory::vtop`] convert
//!   between the two views and are mutual inverses over the mapped range.
//! * **Kernel image**: linked at `KERNEL_BASE`, loaded at `PHYS_LOAD`.
//!
//! ### Loader Hand-off ([`boot`])
//! * **Command line**: a 32-bit token count and a 128-byte blob of
//!   NUL-terminated tokens at fixed physical addresses.
//! * **Memory map**: a multiboot information block pointing at the E820 map
//!   the kernel uses to discover how much RAM exists.
//!
//! ```text
//! Virtual Address Space Layout:
//!
//! 0x0000_0000_0000_0000 ┌─────────────────────────────────┐
//!                       │          User Space             │
//! KERNEL_OFFSET         ├─────────────────────────────────┤ 0x0000_0080_0400_0000
//!                       │  Direct map of physical memory  │
//! KERNEL_BASE           │   ├── kernel text (read-only)   │ 0x0000_0080_0420_0000
//!                       │   └── kernel data, heap, pools  │
//! KERNEL_OFFSET+mem_end ├─────────────────────────────────┤
//!                       │            Unmapped             │
//! 0xFFFF_FFFF_FFFF_FFFF └─────────────────────────────────┘
//! ```
//!
//! ## Build Script Integration
//! ```rust
//! use kernel_info::memory::{KERNEL_BASE, PHYS_LOAD};
//!
//! println!("cargo:rustc-link-arg=--defsym=KERNEL_BASE={:#x}", KERNEL_BASE);
//! println!("cargo:rustc-link-arg=--defsym=PHYS_LOAD={:#x}", PHYS_LOAD);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
