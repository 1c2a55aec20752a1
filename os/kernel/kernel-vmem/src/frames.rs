//! # Page-Table Frames
//!
//! Page tables live in physical frames. The walker never dereferences a
//! physical address itself: it asks a [`FrameStore`] for the table stored in
//! a frame, and the store decides whether that frame is reachable. Frames
//! outside the store are a checked [`FrameOutOfBounds`] error.

use crate::PageTable;
use kernel_memory_addresses::PhysicalPage;

/// Minimal frame allocator used to obtain **physical** 4 KiB frames
/// for page tables.
///
/// The implementation decides where frames come from (page pool, bump
/// region, test arena). Returned frames are **zeroed**, so a fresh table
/// has no present entries.
///
/// Returns `None` on out-of-memory.
pub trait FrameAlloc {
    fn alloc_zeroed_4k(&mut self) -> Option<PhysicalPage>;
}

/// Typed access to page tables by the frame that holds them.
pub trait FrameStore {
    /// Borrow the table stored in `frame`.
    ///
    /// # Errors
    /// [`FrameOutOfBounds`] if `frame` is not reachable through this store.
    fn table(&self, frame: PhysicalPage) -> Result<&PageTable, FrameOutOfBounds>;

    /// Mutably borrow the table stored in `frame`.
    ///
    /// # Errors
    /// [`FrameOutOfBounds`] if `frame` is not reachable through this store.
    fn table_mut(&mut self, frame: PhysicalPage) -> Result<&mut PageTable, FrameOutOfBounds>;
}

/// A page-table frame outside the range a [`FrameStore`] can reach.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("page-table frame {frame} lies outside the frame store")]
pub struct FrameOutOfBounds {
    pub frame: PhysicalPage,
}

/// An owned arena of `N` zeroed frames, numbered upwards from `first`.
///
/// Frames are handed out in order; only frames already handed out are
/// reachable through [`FrameStore`].
///
/// ```rust
/// # use kernel_memory_addresses::PhysicalPage;
/// # use kernel_vmem::{FrameAlloc, FrameArena, FrameStore};
/// let mut arena = FrameArena::<2>::new(PhysicalPage::from_frame_number(0x100));
/// let f = arena.alloc_zeroed_4k().unwrap();
/// assert_eq!(f.frame_number(), 0x100);
/// assert!(arena.table(f).is_ok());
/// assert!(arena.table(f.next()).is_err());
/// ```
pub struct FrameArena<const N: usize> {
    first: PhysicalPage,
    used: usize,
    frames: [PageTable; N],
}

impl<const N: usize> FrameArena<N> {
    #[must_use]
    pub const fn new(first: PhysicalPage) -> Self {
        Self {
            first,
            used: 0,
            frames: [const { PageTable::zeroed() }; N],
        }
    }

    /// Number of frames handed out so far.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    fn slot(&self, frame: PhysicalPage) -> Result<usize, FrameOutOfBounds> {
        frame
            .frame_number()
            .checked_sub(self.first.frame_number())
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < self.used)
            .ok_or(FrameOutOfBounds { frame })
    }
}

impl<const N: usize> FrameAlloc for FrameArena<N> {
    fn alloc_zeroed_4k(&mut self) -> Option<PhysicalPage> {
        if self.used == N {
            return None;
        }
        let frame = PhysicalPage::from_frame_number(self.first.frame_number() + self.used as u64);
        self.frames[self.used].clear();
        self.used += 1;
        Some(frame)
    }
}

impl<const N: usize> FrameStore for FrameArena<N> {
    fn table(&self, frame: PhysicalPage) -> Result<&PageTable, FrameOutOfBounds> {
        let i = self.slot(frame)?;
        Ok(&self.frames[i])
    }

    fn table_mut(&mut self, frame: PhysicalPage) -> Result<&mut PageTable, FrameOutOfBounds> {
        let i = self.slot(frame)?;
        Ok(&mut self.frames[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_runs_dry_after_n_frames() {
        let mut arena = FrameArena::<3>::new(PhysicalPage::from_frame_number(16));
        let got: Vec<_> = core::iter::from_fn(|| arena.alloc_zeroed_4k())
            .map(PhysicalPage::frame_number)
            .collect();
        assert_eq!(got, [16, 17, 18]);
        assert_eq!(arena.used(), 3);
    }

    #[test]
    fn frames_below_the_arena_are_rejected() {
        let mut arena = FrameArena::<1>::new(PhysicalPage::from_frame_number(16));
        assert!(arena.alloc_zeroed_4k().is_some());
        let below = PhysicalPage::from_frame_number(15);
        assert_eq!(arena.table(below).err(), Some(FrameOutOfBounds { frame: below }));
        assert!(arena.table_mut(below).is_err());
    }
}
