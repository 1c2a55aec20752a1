//! The kernel's boot-time state, threaded through every boot step and action.

use crate::devices::Devices;
use crate::interrupts::InterruptTable;
use crate::memory::KernelMemory;
use crate::threads::Threads;
use kernel_boot::{BootConfiguration, BootContext, Capabilities};
use kernel_vmem::AddressSpace;
use rand_chacha::ChaCha8Rng;

/// Subsystems compiled into this kernel, from its Cargo features.
pub const CAPABILITIES: Capabilities = Capabilities::new()
    .with_user_programs(cfg!(feature = "userprog"))
    .with_filesystem(cfg!(feature = "filesys"))
    .with_virtual_memory(cfg!(feature = "vm"));

pub struct Kernel {
    pub config: BootConfiguration,
    pub capabilities: Capabilities,
    /// Set by the memory allocator stage.
    pub memory: Option<KernelMemory>,
    /// The active kernel page table, once switched to.
    pub address_space: Option<AddressSpace>,
    pub interrupts: InterruptTable,
    pub devices: Devices,
    pub threads: Threads,
    /// Seeded on first use, so `-rs` has been applied.
    pub rng: Option<ChaCha8Rng>,
    #[cfg(feature = "userprog")]
    pub userprog: Option<crate::userprog::UserPrograms>,
    #[cfg(feature = "filesys")]
    pub fs: Option<kernel_fs::FileSystem>,
    #[cfg(feature = "vm")]
    pub frame_table: Option<crate::vm::FrameTable>,
}

impl Kernel {
    pub const fn new(capabilities: Capabilities) -> Self {
        Self {
            config: BootConfiguration {
                power_off_when_done: false,
                format_filesystem: false,
                random_seed: None,
                scheduler_policy: kernel_boot::SchedulerPolicy::RoundRobin,
                user_page_limit: None,
                test_mode: false,
            },
            capabilities,
            memory: None,
            address_space: None,
            interrupts: InterruptTable::new(),
            devices: Devices::new(),
            threads: Threads::new(),
            rng: None,
            #[cfg(feature = "userprog")]
            userprog: None,
            #[cfg(feature = "filesys")]
            fs: None,
            #[cfg(feature = "vm")]
            frame_table: None,
        }
    }
}

impl BootContext for Kernel {
    fn config(&self) -> &BootConfiguration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut BootConfiguration {
        &mut self.config
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn run_test(&mut self, name: &str) -> Result<(), &'static str> {
        crate::selftest::run(self, name)
    }

    #[cfg(feature = "userprog")]
    fn run_program(&mut self, command_line: &str) -> Result<(), &'static str> {
        crate::userprog::run(self, command_line)
    }

    #[cfg(feature = "filesys")]
    fn ls(&mut self) -> Result<(), &'static str> {
        crate::fs::ls(self)
    }

    #[cfg(feature = "filesys")]
    fn cat(&mut self, file: &str) -> Result<(), &'static str> {
        crate::fs::cat(self, file)
    }

    #[cfg(feature = "filesys")]
    fn rm(&mut self, file: &str) -> Result<(), &'static str> {
        crate::fs::rm(self, file)
    }

    #[cfg(feature = "filesys")]
    fn put(&mut self, file: &str) -> Result<(), &'static str> {
        crate::fs::put(self, file)
    }

    #[cfg(feature = "filesys")]
    fn get(&mut self, file: &str) -> Result<(), &'static str> {
        crate::fs::get(self, file)
    }
}
