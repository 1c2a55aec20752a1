//! # Kernel Filesystem
//!
//! A flat, memory-backed root directory mounted from a static image, and a
//! scratch disk that moves single files between the host and the kernel.
//! Both disks count their transfers in sectors for the shutdown report.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod disk;
pub mod filesystem;

pub use disk::{DiskStats, SECTOR_SIZE};
pub use filesystem::{File, FileSystem, FsError, ImageEntry, FILE_MAX, MAX_FILES, NAME_MAX};
