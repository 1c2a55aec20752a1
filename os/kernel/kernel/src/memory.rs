//! # Kernel Memory
//!
//! Physical memory discovery, the page pools and the kernel's own page
//! table. Everything here reaches physical memory through the direct map
//! the loader set up:
//!
//! ```text
//! 0 ─ loader data ─ PHYS_LOAD ─ kernel image ─ _end ─ kernel pool ─ user pool ─ mem_end
//!                                                    └── bitmaps in each pool's first pages
//! ```

use crate::kernel::Kernel;
use core::ops::Range;
use kernel_alloc::{MemoryMap, PageAllocator, PagePool, PoolKind, plan_pools};
use kernel_boot::StepError;
use kernel_info::boot::{E820Entry, MULTIBOOT_INFO, MultibootInfo};
use kernel_info::memory::{ptov, vtop};
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, PhysicalPage, VirtualAddress};
use kernel_vmem::{
    FrameAlloc, FrameOutOfBounds, FrameStore, PageTable, build_kernel_address_space,
};

#[allow(non_upper_case_globals)]
unsafe extern "C" {
    static start: u8;
    static _end_kernel_text: u8;
    static mut _start_bss: u8;
    static mut _end_bss: u8;
    static _end: u8;
}

/// Zero `.bss`. Runs before anything reads a static.
pub fn clear_bss(_: &mut Kernel) -> Result<(), StepError> {
    unsafe {
        let from = &raw mut _start_bss;
        let to = &raw mut _end_bss;
        let len = usize::try_from(to.offset_from(from)).unwrap_or_default();
        core::ptr::write_bytes(from, 0, len);
    }
    crate::console::install_logger()
}

/// Virtual range of the kernel's code, mapped read-only.
fn kernel_text() -> Range<VirtualAddress> {
    let from = VirtualAddress::from_ptr(&raw const start);
    let to = VirtualAddress::from_ptr(&raw const _end_kernel_text);
    from..to
}

/// First physical byte past the kernel image.
fn kernel_end() -> PhysicalAddress {
    vtop(VirtualAddress::from_ptr(&raw const _end))
}

/// The loader's E820 map.
fn memory_map() -> MemoryMap<'static> {
    let info = unsafe {
        ptov(PhysicalAddress::new(MULTIBOOT_INFO))
            .as_ptr::<MultibootInfo>()
            .read_unaligned()
    };
    let len = usize::try_from(info.mmap_len).unwrap_or_default() / size_of::<E820Entry>();
    let entries = unsafe {
        core::slice::from_raw_parts(
            ptov(PhysicalAddress::new(u64::from(info.mmap_base))).as_ptr::<E820Entry>(),
            len,
        )
    };
    MemoryMap::new(entries)
}

/// A pool bitmap, in the pool's own first pages.
///
/// # Safety
/// `first` must start `words` words of memory nothing else uses.
unsafe fn bitmap(first: PhysicalPage, words: usize) -> &'static mut [u64] {
    unsafe { core::slice::from_raw_parts_mut(ptov(first.base()).as_mut_ptr::<u64>(), words) }
}

pub struct KernelMemory {
    pub mem_end: PhysicalAddress,
    pub usable_bytes: u64,
    pub pages: PageAllocator<'static>,
}

impl KernelMemory {
    /// Page-table access for everything below `mem_end`.
    pub const fn direct_map(&self) -> DirectMap {
        DirectMap {
            mem_end: self.mem_end,
        }
    }

    /// Page-table frames come from the kernel pool.
    pub const fn frames(&mut self) -> KernelFrames<'_> {
        KernelFrames {
            map: DirectMap {
                mem_end: self.mem_end,
            },
            pages: &mut self.pages,
        }
    }
}

/// Memory allocator stage: discover memory, then split what follows the
/// kernel into the two page pools.
pub fn init(kernel: &mut Kernel) -> Result<(), StepError> {
    let map = memory_map();
    let mem_end = map.mem_end();
    if mem_end.as_u64() == 0 {
        return Err(StepError::Failed("no usable memory in the E820 map"));
    }

    let kernel_end = kernel_end();
    let region = map
        .usable_region_containing(kernel_end)
        .ok_or(StepError::Failed("kernel image is not in usable memory"))?;

    let plan = plan_pools(kernel_end..region.end, kernel.config.user_page_limit).map_err(|e| {
        log::error!("{e}");
        StepError::Failed("cannot lay out page pools")
    })?;

    // Pool bitmaps live in the pages the plan set aside for them.
    let pool = |name, layout: &kernel_alloc::PoolLayout| {
        let words = layout.bitmap_words();
        PagePool::new(name, layout, unsafe { bitmap(layout.bitmap, words) }).map_err(|e| {
            log::error!("{e}");
            StepError::Failed("cannot set up page pool")
        })
    };
    let pages = PageAllocator::new(pool("kernel", &plan.kernel)?, pool("user", &plan.user)?);

    log::info!(
        "{} kB of memory, mem_end = {mem_end}",
        map.usable_bytes() / 1024
    );
    kernel.memory = Some(KernelMemory {
        mem_end,
        usable_bytes: map.usable_bytes(),
        pages,
    });
    Ok(())
}

/// Kernel address space stage: map all of memory and switch to it.
pub fn init_address_space(kernel: &mut Kernel) -> Result<(), StepError> {
    let memory = kernel
        .memory
        .as_mut()
        .ok_or(StepError::Failed("page pools are not set up"))?;

    let mem_end = memory.mem_end;
    let space = build_kernel_address_space(&mut memory.frames(), mem_end, kernel_text())?;
    unsafe {
        space.activate();
    }
    kernel.address_space = Some(space);
    Ok(())
}

pub fn report(kernel: &Kernel) {
    if let Some(memory) = &kernel.memory {
        for kind in [PoolKind::Kernel, PoolKind::User] {
            let pool = memory.pages.pool(kind);
            crate::kprintln!(
                "Memory: {} pool, {} of {} pages free",
                pool.name(),
                pool.free_pages(),
                pool.total_pages()
            );
        }
    }
}

/// Page tables reached through `ptov`, for frames below `mem_end`.
#[derive(Copy, Clone)]
pub struct DirectMap {
    mem_end: PhysicalAddress,
}

impl DirectMap {
    fn check(&self, frame: PhysicalPage) -> Result<*mut PageTable, FrameOutOfBounds> {
        if frame.base().as_u64() + PAGE_SIZE > self.mem_end.as_u64() {
            return Err(FrameOutOfBounds { frame });
        }
        Ok(ptov(frame.base()).as_mut_ptr::<PageTable>())
    }
}

impl FrameStore for DirectMap {
    fn table(&self, frame: PhysicalPage) -> Result<&PageTable, FrameOutOfBounds> {
        // Frames below `mem_end` are always mapped.
        self.check(frame).map(|table| unsafe { &*table })
    }

    fn table_mut(&mut self, frame: PhysicalPage) -> Result<&mut PageTable, FrameOutOfBounds> {
        self.check(frame).map(|table| unsafe { &mut *table })
    }
}

/// Zeroed kernel-pool frames for page tables.
pub struct KernelFrames<'m> {
    map: DirectMap,
    pages: &'m mut PageAllocator<'static>,
}

impl FrameAlloc for KernelFrames<'_> {
    fn alloc_zeroed_4k(&mut self) -> Option<PhysicalPage> {
        let frame = self.pages.alloc(PoolKind::Kernel)?;
        let table = self.map.table_mut(frame).ok()?;
        table.clear();
        Some(frame)
    }
}

impl FrameStore for KernelFrames<'_> {
    fn table(&self, frame: PhysicalPage) -> Result<&PageTable, FrameOutOfBounds> {
        self.map.table(frame)
    }

    fn table_mut(&mut self, frame: PhysicalPage) -> Result<&mut PageTable, FrameOutOfBounds> {
        self.map.table_mut(frame)
    }
}
