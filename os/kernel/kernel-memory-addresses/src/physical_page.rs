use crate::{PAGE_SHIFT, PAGE_SIZE, PhysicalAddress, align_down, align_up};
use core::fmt;
use core::iter::FusedIterator;

/// A 4 KiB physical frame.
///
/// Always page aligned. Frames are addressable either by their base address
/// or by their *frame number* (`base >> 12`), which is what page-table arenas
/// and page allocators index by.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage(PhysicalAddress);

impl PhysicalPage {
    /// The frame containing `pa` (low 12 bits dropped).
    #[inline]
    #[must_use]
    pub const fn from_addr(pa: PhysicalAddress) -> Self {
        Self(PhysicalAddress::new(align_down(pa.as_u64(), PAGE_SIZE)))
    }

    #[inline]
    #[must_use]
    pub const fn from_frame_number(frame: u64) -> Self {
        Self(PhysicalAddress::new(frame << PAGE_SHIFT))
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn frame_number(self) -> u64 {
        self.0.as_u64() >> PAGE_SHIFT
    }

    /// The frame directly after this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self::from_frame_number(self.frame_number() + 1)
    }

    /// All frames lying completely inside `[start, end)`.
    #[inline]
    #[must_use]
    pub const fn range(start: PhysicalAddress, end: PhysicalAddress) -> PageRange {
        PageRange {
            next: align_up(start.as_u64(), PAGE_SIZE) >> PAGE_SHIFT,
            end: align_down(end.as_u64(), PAGE_SIZE) >> PAGE_SHIFT,
        }
    }
}

impl fmt::Display for PhysicalPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (4K)", self.0)
    }
}

impl fmt::Debug for PhysicalPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalPage(#{:#x})", self.frame_number())
    }
}

/// Iterator over consecutive 4 KiB frames, see [`PhysicalPage::range`].
#[derive(Clone, Debug)]
pub struct PageRange {
    next: u64,
    end: u64,
}

impl Iterator for PageRange {
    type Item = PhysicalPage;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let frame = PhysicalPage::from_frame_number(self.next);
        self.next += 1;
        Some(frame)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.end.saturating_sub(self.next)).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

impl ExactSizeIterator for PageRange {}
impl FusedIterator for PageRange {}
