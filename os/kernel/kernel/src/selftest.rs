//! Built-in kernel tests, reachable as `run TEST`.
//!
//! Each test brackets its output with `(name) begin` and `(name) end`, which
//! is what the host-side checker looks for.

use crate::kernel::Kernel;
use crate::memory::KernelMemory;
use kernel_alloc::PoolKind;
use kernel_info::memory::{PHYS_LOAD, ptov};
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress};

type Test = fn(&mut Kernel) -> Result<(), &'static str>;

const TESTS: &[(&str, Test)] = &[
    ("memory-map", memory_map),
    ("page-pools", page_pools),
    ("address-space", address_space),
    ("interrupt-vectors", interrupt_vectors),
    ("random-seed", random_seed),
];

pub fn run(kernel: &mut Kernel, name: &str) -> Result<(), &'static str> {
    let &(_, test) = TESTS
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or("no such test")?;

    crate::kprintln!("({name}) begin");
    test(kernel)?;
    crate::kprintln!("({name}) end");
    Ok(())
}

fn memory(kernel: &Kernel) -> Result<&KernelMemory, &'static str> {
    kernel.memory.as_ref().ok_or("memory is not initialized")
}

fn memory_map(kernel: &mut Kernel) -> Result<(), &'static str> {
    let memory = memory(kernel)?;
    crate::kprintln!(
        "mem_end = {}, {} kB usable",
        memory.mem_end,
        memory.usable_bytes / 1024
    );
    if memory.mem_end.as_u64() <= PHYS_LOAD {
        return Err("memory ends below the kernel image");
    }
    Ok(())
}

fn page_pools(kernel: &mut Kernel) -> Result<(), &'static str> {
    let memory = kernel.memory.as_mut().ok_or("memory is not initialized")?;

    for kind in [PoolKind::Kernel, PoolKind::User] {
        let before = memory.pages.pool(kind).free_pages();
        if before == 0 {
            crate::kprintln!("{kind:?} pool is empty, skipped");
            continue;
        }

        let page = memory.pages.alloc(kind).ok_or("allocation failed")?;
        if !memory.pages.pool(kind).contains(page)
            || memory.pages.pool(kind).free_pages() != before - 1
        {
            return Err("page came from the wrong pool");
        }
        memory.pages.free(page).map_err(|_| "page could not be freed")?;
        if memory.pages.pool(kind).free_pages() != before {
            return Err("free page count did not recover");
        }
    }
    Ok(())
}

fn address_space(kernel: &mut Kernel) -> Result<(), &'static str> {
    let space = kernel.address_space.ok_or("kernel address space is not active")?;
    let memory = memory(kernel)?;
    let map = memory.direct_map();

    let last = PhysicalAddress::new(memory.mem_end.as_u64() - PAGE_SIZE);
    for pa in [PhysicalAddress::zero(), PhysicalAddress::new(PHYS_LOAD), last] {
        let found = space
            .query(&map, ptov(pa))
            .map_err(|_| "page table frame out of bounds")?;
        if found != Some(pa) {
            crate::kprintln!("{} maps to {found:?}", ptov(pa));
            return Err("direct mapping is wrong");
        }
    }

    let (_, text) = space
        .entry(&map, ptov(PhysicalAddress::new(PHYS_LOAD)))
        .map_err(|_| "page table frame out of bounds")?
        .ok_or("kernel text is not mapped")?;
    if text.writable() {
        return Err("kernel text is writable");
    }
    Ok(())
}

fn interrupt_vectors(kernel: &mut Kernel) -> Result<(), &'static str> {
    let pf = kernel.interrupts.handler(14).ok_or("#PF has no handler")?;
    crate::kprintln!("vector 14: {}", pf.name);
    if kernel
        .interrupts
        .handler(crate::interrupts::TIMER_VECTOR)
        .is_none()
    {
        return Err("timer vector is unclaimed");
    }
    crate::kprintln!("{} vectors claimed", kernel.interrupts.registered());
    Ok(())
}

fn random_seed(kernel: &mut Kernel) -> Result<(), &'static str> {
    let first = crate::random::next_u32(kernel);
    let mut bytes = [0u8; 4];
    crate::random::fill(kernel, &mut bytes);
    crate::kprintln!("random: {first:#010x} {bytes:02x?}");

    // Same seed, same sequence.
    kernel.rng = None;
    if crate::random::next_u32(kernel) != first {
        return Err("random numbers do not follow the seed");
    }
    Ok(())
}
