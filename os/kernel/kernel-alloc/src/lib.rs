//! # Physical Memory for the Kernel
//!
//! Discovery of physical memory from the loader's E820 map and the two page
//! pools carved out of it.
//!
//! ```text
//! 0                  kernel end          free region end = mem_end
//! ├── loader, image ──┼── kernel pool ──────┼── user pool ──┤
//!                     │ bitmap │ pages      │ bitmap│ pages │
//! ```
//!
//! The pools hand out single frames (or runs of frames); zeroing them is up
//! to the caller, who reaches them through the direct mapping.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod frame_alloc;
pub mod memory_map;

pub use frame_alloc::{PageAllocator, PagePool, PoolError, PoolKind, PoolLayout, PoolPlan, plan_pools};
pub use memory_map::MemoryMap;
