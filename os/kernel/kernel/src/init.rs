use crate::console::Console;
use crate::kernel::{CAPABILITIES, Kernel};
use crate::machine::QemuMachine;
use crate::subsystems::BOOT_TABLE;
use kernel_boot::flow;
use kernel_info::boot::{LOADER_ARG_CNT, LOADER_ARGS, LOADER_ARGS_LEN};
use kernel_info::memory::ptov;
use kernel_memory_addresses::PhysicalAddress;

/// Pick up the loader's command line and run the boot task.
pub fn kernel_init() -> ! {
    // The loader's area stays mapped and untouched for the kernel's lifetime.
    let argc = unsafe {
        ptov(PhysicalAddress::new(LOADER_ARG_CNT))
            .as_ptr::<u32>()
            .read_unaligned()
    };
    let blob: &'static [u8] = unsafe {
        core::slice::from_raw_parts(
            ptov(PhysicalAddress::new(LOADER_ARGS)).as_ptr::<u8>(),
            LOADER_ARGS_LEN,
        )
    };

    let mut kernel = Kernel::new(CAPABILITIES);
    flow::boot(
        &mut kernel,
        &mut QemuMachine,
        BOOT_TABLE,
        argc,
        blob,
        &mut Console,
    )
}
