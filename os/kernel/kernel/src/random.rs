//! Kernel pseudo-random numbers, seeded from `-rs=SEED` (0 without it).

use crate::kernel::Kernel;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

fn rng(kernel: &mut Kernel) -> &mut ChaCha8Rng {
    let seed = kernel.config.random_seed.unwrap_or(0);
    kernel.rng.get_or_insert_with(|| {
        log::debug!("Seeding random numbers with {seed}");
        ChaCha8Rng::seed_from_u64(seed)
    })
}

pub fn next_u32(kernel: &mut Kernel) -> u32 {
    rng(kernel).next_u32()
}

pub fn fill(kernel: &mut Kernel, buf: &mut [u8]) {
    rng(kernel).fill_bytes(buf);
}
