//! # Kernel synchronization primitives
//!
//! Boot runs single-threaded with interrupts off, so these stay small: a
//! spin lock for the console and other shared state, a once-cell for boot
//! globals, and interrupt masking.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod irq;
mod spin_lock;
mod sync_once_cell;

pub use irq::{InterruptLevel, IrqGuard};
pub use spin_lock::{SpinLock, SpinLockGuard};
pub use sync_once_cell::SyncOnceCell;
