//! # Physical Page Pools
//!
//! Free memory after the kernel image is split into two bitmap-managed
//! pools. The kernel pool backs page tables and kernel data; the user pool
//! backs user pages and may be capped from the command line.
//!
//! Each pool keeps its bitmap in its own first pages, so no heap is needed.
//! The caller reaches those pages through the direct mapping and hands the
//! resulting slice to [`PagePool::new`].

use core::ops::Range;
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, PhysicalPage, align_up};

const BITS: usize = u64::BITS as usize;

/// Errors raised while planning or using a pool.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("free region of {pages} pages is too small for two page pools")]
    RegionTooSmall { pages: usize },
    #[error("bitmap of {words} words cannot track {pages} pages")]
    BitmapTooSmall { words: usize, pages: usize },
    #[error("{frame} does not belong to the {pool} pool")]
    NotInPool { frame: PhysicalPage, pool: &'static str },
    #[error("{frame} is already free")]
    DoubleFree { frame: PhysicalPage },
}

/// Placement of one pool: bitmap pages first, then the managed pages.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PoolLayout {
    pub bitmap: PhysicalPage,
    pub bitmap_pages: usize,
    pub first: PhysicalPage,
    pub pages: usize,
}

impl PoolLayout {
    /// Lay out a pool over `total` pages starting at `start`.
    const fn over(start: PhysicalPage, total: usize) -> Self {
        let bitmap_pages = bitmap_pages_for(total);
        let pages = total.saturating_sub(bitmap_pages);
        Self {
            bitmap: start,
            bitmap_pages,
            first: PhysicalPage::from_frame_number(start.frame_number() + bitmap_pages as u64),
            pages,
        }
    }

    /// Number of `u64` words the bitmap occupies.
    #[must_use]
    pub const fn bitmap_words(&self) -> usize {
        self.pages.div_ceil(BITS)
    }
}

/// Pages needed to hold a bitmap tracking `pages` pages.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn bitmap_pages_for(pages: usize) -> usize {
    let bytes = pages.div_ceil(BITS) * size_of::<u64>();
    bytes.div_ceil(PAGE_SIZE as usize)
}

/// Both pools carved out of one free region.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PoolPlan {
    pub kernel: PoolLayout,
    pub user: PoolLayout,
}

/// Split `free` into a kernel and a user pool.
///
/// The user pool gets half of the free pages, capped at `user_page_limit`;
/// the kernel pool gets the rest, and comes first.
///
/// # Errors
/// [`PoolError::RegionTooSmall`] if either pool would end up without a
/// single allocatable page.
pub fn plan_pools(
    free: Range<PhysicalAddress>,
    user_page_limit: Option<usize>,
) -> Result<PoolPlan, PoolError> {
    let pages = PhysicalPage::range(free.start, free.end);
    let total = pages.len();
    let start = PhysicalPage::from_addr(PhysicalAddress::new(align_up(free.start.as_u64(), PAGE_SIZE)));

    let mut user_total = total / 2;
    if let Some(limit) = user_page_limit {
        // The cap counts allocatable pages; the bitmap comes on top.
        let capped = limit.saturating_add(bitmap_pages_for(limit));
        user_total = user_total.min(capped);
    }
    let kernel_total = total - user_total;

    let kernel = PoolLayout::over(start, kernel_total);
    let user = PoolLayout::over(
        PhysicalPage::from_frame_number(start.frame_number() + kernel_total as u64),
        user_total,
    );

    if kernel.pages == 0 || (user.pages == 0 && user_page_limit != Some(0)) {
        return Err(PoolError::RegionTooSmall { pages: total });
    }

    Ok(PoolPlan { kernel, user })
}

/// A bitmap-managed run of physical pages.
pub struct PagePool<'a> {
    name: &'static str,
    first: PhysicalPage,
    pages: usize,
    bitmap: &'a mut [u64],
    free: usize,
}

impl<'a> PagePool<'a> {
    /// Create a pool over `layout.pages` pages with every page free.
    ///
    /// # Errors
    /// [`PoolError::BitmapTooSmall`] if `bitmap` cannot track every page.
    pub fn new(
        name: &'static str,
        layout: &PoolLayout,
        bitmap: &'a mut [u64],
    ) -> Result<Self, PoolError> {
        if bitmap.len() < layout.bitmap_words() {
            return Err(PoolError::BitmapTooSmall {
                words: bitmap.len(),
                pages: layout.pages,
            });
        }
        bitmap.fill(0);
        log::info!("{name} pool: {} pages starting at {}", layout.pages, layout.first.base());
        Ok(Self {
            name,
            first: layout.first,
            pages: layout.pages,
            bitmap,
            free: layout.pages,
        })
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.pages
    }

    #[must_use]
    pub const fn free_pages(&self) -> usize {
        self.free
    }

    /// Whether `frame` is one of the pages this pool hands out.
    #[must_use]
    pub fn contains(&self, frame: PhysicalPage) -> bool {
        self.index_of(frame).is_some()
    }

    fn index_of(&self, frame: PhysicalPage) -> Option<usize> {
        frame
            .frame_number()
            .checked_sub(self.first.frame_number())
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < self.pages)
    }

    fn is_used(&self, index: usize) -> bool {
        self.bitmap[index / BITS] & (1 << (index % BITS)) != 0
    }

    fn set_used(&mut self, index: usize, used: bool) {
        let word = &mut self.bitmap[index / BITS];
        if used {
            *word |= 1 << (index % BITS);
        } else {
            *word &= !(1 << (index % BITS));
        }
    }

    /// Allocate `count` contiguous pages, first fit.
    pub fn alloc_contiguous(&mut self, count: usize) -> Option<PhysicalPage> {
        if count == 0 || count > self.free {
            return None;
        }

        let mut run = 0;
        for index in 0..self.pages {
            if self.is_used(index) {
                run = 0;
                continue;
            }
            run += 1;
            if run == count {
                let start = index + 1 - count;
                for i in start..=index {
                    self.set_used(i, true);
                }
                self.free -= count;
                return Some(PhysicalPage::from_frame_number(
                    self.first.frame_number() + start as u64,
                ));
            }
        }
        None
    }

    /// Allocate one page.
    pub fn alloc(&mut self) -> Option<PhysicalPage> {
        self.alloc_contiguous(1)
    }

    /// Return one page to the pool.
    ///
    /// # Errors
    /// [`PoolError::NotInPool`] or [`PoolError::DoubleFree`].
    pub fn free(&mut self, frame: PhysicalPage) -> Result<(), PoolError> {
        let index = self.index_of(frame).ok_or(PoolError::NotInPool {
            frame,
            pool: self.name,
        })?;
        if !self.is_used(index) {
            return Err(PoolError::DoubleFree { frame });
        }
        self.set_used(index, false);
        self.free += 1;
        Ok(())
    }
}

/// Which pool an allocation is served from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PoolKind {
    Kernel,
    User,
}

/// The kernel's page allocator: a kernel pool and a user pool.
pub struct PageAllocator<'a> {
    kernel: PagePool<'a>,
    user: PagePool<'a>,
}

impl<'a> PageAllocator<'a> {
    #[must_use]
    pub const fn new(kernel: PagePool<'a>, user: PagePool<'a>) -> Self {
        Self { kernel, user }
    }

    #[must_use]
    pub const fn pool(&self, kind: PoolKind) -> &PagePool<'a> {
        match kind {
            PoolKind::Kernel => &self.kernel,
            PoolKind::User => &self.user,
        }
    }

    pub const fn pool_mut(&mut self, kind: PoolKind) -> &mut PagePool<'a> {
        match kind {
            PoolKind::Kernel => &mut self.kernel,
            PoolKind::User => &mut self.user,
        }
    }

    /// Allocate one page from `kind`.
    pub fn alloc(&mut self, kind: PoolKind) -> Option<PhysicalPage> {
        self.pool_mut(kind).alloc()
    }

    /// Return a page to whichever pool it came from.
    ///
    /// # Errors
    /// [`PoolError::NotInPool`] if neither pool owns `frame`, or
    /// [`PoolError::DoubleFree`].
    pub fn free(&mut self, frame: PhysicalPage) -> Result<(), PoolError> {
        if self.user.contains(frame) {
            self.user.free(frame)
        } else {
            self.kernel.free(frame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MIB: u64 = 1024 * 1024;

    fn region(start: u64, end: u64) -> Range<PhysicalAddress> {
        PhysicalAddress::new(start)..PhysicalAddress::new(end)
    }

    #[test]
    fn pools_split_free_memory_in_half() {
        let plan = plan_pools(region(MIB, 5 * MIB), None).unwrap();
        // 1024 pages, 512 each, one bitmap page each
        assert_eq!(plan.kernel.bitmap.base().as_u64(), MIB);
        assert_eq!(plan.kernel.pages, 511);
        assert_eq!(plan.user.bitmap.base().as_u64(), 3 * MIB);
        assert_eq!(plan.user.pages, 511);
        assert_eq!(plan.user.first.base().as_u64(), 3 * MIB + PAGE_SIZE);
    }

    #[test]
    fn user_limit_caps_the_user_pool() {
        let plan = plan_pools(region(MIB, 5 * MIB), Some(10)).unwrap();
        assert_eq!(plan.user.pages, 10);
        assert_eq!(plan.kernel.pages + plan.kernel.bitmap_pages, 1024 - 11);

        let plan = plan_pools(region(MIB, 5 * MIB), Some(100_000)).unwrap();
        assert_eq!(plan.user.pages, 511);
    }

    #[test]
    fn huge_user_limit_means_no_cap() {
        let plan = plan_pools(region(MIB, 5 * MIB), Some(usize::MAX)).unwrap();
        assert_eq!(plan, plan_pools(region(MIB, 5 * MIB), None).unwrap());
    }

    #[test]
    fn zero_user_limit_leaves_an_empty_user_pool() {
        let plan = plan_pools(region(MIB, 2 * MIB), Some(0)).unwrap();
        assert_eq!(plan.user.pages, 0);
        assert_eq!(plan.kernel.pages, 255);
    }

    #[test]
    fn tiny_regions_are_rejected() {
        assert_eq!(
            plan_pools(region(MIB, MIB + 2 * PAGE_SIZE), None),
            Err(PoolError::RegionTooSmall { pages: 2 })
        );
    }

    #[test]
    fn alloc_until_exhausted_then_free() {
        let layout = PoolLayout::over(PhysicalPage::from_frame_number(0x100), 4);
        let mut bitmap = [u64::MAX; 1];
        let mut pool = PagePool::new("kernel", &layout, &mut bitmap).unwrap();
        assert_eq!(pool.total_pages(), 3);

        let a = pool.alloc().unwrap();
        let b = pool.alloc().unwrap();
        let c = pool.alloc().unwrap();
        assert_eq!(a.frame_number(), 0x101);
        assert_eq!(c.frame_number(), 0x103);
        assert_eq!(pool.alloc(), None);

        pool.free(b).unwrap();
        assert_eq!(pool.free(b), Err(PoolError::DoubleFree { frame: b }));
        assert_eq!(pool.alloc(), Some(b));

        let outside = PhysicalPage::from_frame_number(0x100);
        assert_eq!(
            pool.free(outside),
            Err(PoolError::NotInPool { frame: outside, pool: "kernel" })
        );
    }

    #[test]
    fn contiguous_allocation_skips_holes() {
        let layout = PoolLayout::over(PhysicalPage::from_frame_number(0), 9);
        let mut bitmap = [0; 1];
        let mut pool = PagePool::new("user", &layout, &mut bitmap).unwrap();

        let first = pool.alloc().unwrap();
        let second = pool.alloc().unwrap();
        pool.free(first).unwrap();
        let run = pool.alloc_contiguous(3).unwrap();
        assert_eq!(run.frame_number(), second.frame_number() + 1);
        assert_eq!(pool.free_pages(), 8 - 4);
    }

    #[test]
    fn short_bitmap_is_rejected() {
        let layout = PoolLayout::over(PhysicalPage::from_frame_number(0), 200);
        let mut bitmap = [0; 2];
        assert_eq!(
            PagePool::new("kernel", &layout, &mut bitmap).err(),
            Some(PoolError::BitmapTooSmall { words: 2, pages: 199 })
        );
    }

    #[test]
    fn allocator_routes_frees_to_the_owning_pool() {
        let plan = plan_pools(region(MIB, 2 * MIB), None).unwrap();
        let mut kbits = vec![0; plan.kernel.bitmap_words()];
        let mut ubits = vec![0; plan.user.bitmap_words()];
        let mut pages = PageAllocator::new(
            PagePool::new("kernel", &plan.kernel, &mut kbits).unwrap(),
            PagePool::new("user", &plan.user, &mut ubits).unwrap(),
        );

        let k = pages.alloc(PoolKind::Kernel).unwrap();
        let u = pages.alloc(PoolKind::User).unwrap();
        assert!(pages.pool(PoolKind::Kernel).contains(k));
        assert!(pages.pool(PoolKind::User).contains(u));

        pages.free(u).unwrap();
        pages.free(k).unwrap();
        assert_eq!(pages.pool(PoolKind::User).free_pages(), plan.user.pages);
        assert_eq!(pages.pool(PoolKind::Kernel).free_pages(), plan.kernel.pages);
    }

    proptest! {
        #[test]
        fn free_count_tracks_allocations(ops in proptest::collection::vec(any::<bool>(), 0..200)) {
            let layout = PoolLayout::over(PhysicalPage::from_frame_number(0x200), 65);
            let mut bitmap = [0; 1];
            let mut pool = PagePool::new("kernel", &layout, &mut bitmap).unwrap();
            let mut held = Vec::new();

            for alloc in ops {
                if alloc {
                    if let Some(p) = pool.alloc() {
                        prop_assert!(!held.contains(&p));
                        held.push(p);
                    } else {
                        prop_assert_eq!(held.len(), pool.total_pages());
                    }
                } else if let Some(p) = held.pop() {
                    prop_assert!(pool.free(p).is_ok());
                }
                prop_assert_eq!(pool.free_pages() + held.len(), pool.total_pages());
            }
        }
    }
}
