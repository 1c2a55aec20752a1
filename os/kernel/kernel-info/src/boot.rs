//! # Loader Hand-off
//!
//! The boot loader leaves two things behind in low physical memory before it
//! jumps to the kernel: the kernel command line, and a multiboot-style
//! information block pointing at the firmware's E820 memory map. The kernel
//! reads both through [`ptov`](crate::memory::ptov); they are read-only to
//! the kernel and owned by the loader.
//!
//! ```text
//! 0x7000   MultibootInfo  (mmap_len / mmap_base → E820Entry[])
//!  ...
//! 0x7c00   loader code (512 bytes)
//! 0x7d7a   u32 argument count          LOADER_ARG_CNT
//! 0x7d7e   128 bytes NUL-separated     LOADER_ARGS
//! 0x7dfe   0x55 0xAA boot signature    LOADER_SIG
//! 0x7e00   end of loader
//! ```

/// Physical address at which the loader is loaded.
pub const LOADER_BASE: u64 = 0x7c00;

/// Physical address of the end of the loader.
pub const LOADER_END: u64 = 0x7e00;

/// Length of the boot signature.
pub const LOADER_SIG_LEN: u64 = 2;

/// Length of the command-line argument area.
pub const LOADER_ARGS_LEN: usize = 128;

/// Length of the argument count field.
pub const LOADER_ARG_CNT_LEN: u64 = 4;

/// Physical address of the boot signature.
pub const LOADER_SIG: u64 = LOADER_END - LOADER_SIG_LEN;

/// Physical address of the NUL-separated command-line tokens.
pub const LOADER_ARGS: u64 = LOADER_SIG - LOADER_ARGS_LEN as u64;

/// Physical address of the 32-bit command-line token count.
pub const LOADER_ARG_CNT: u64 = LOADER_ARGS - LOADER_ARG_CNT_LEN;

/// Physical address of the [`MultibootInfo`] block.
pub const MULTIBOOT_INFO: u64 = 0x7000;

const _: () = {
    assert!(LOADER_ARGS == 0x7d7e);
    assert!(LOADER_ARG_CNT == 0x7d7a);
};

/// The subset of the multiboot information block the kernel consumes.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug)]
pub struct MultibootInfo {
    pub flags: u32,
    pub mem_low: u32,
    pub mem_high: u32,
    pub unused: [u32; 8],
    /// Length of the memory map in bytes.
    pub mmap_len: u32,
    /// Physical address of the first [`E820Entry`].
    pub mmap_base: u32,
}

/// Firmware-reported memory region type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum E820Kind {
    Usable,
    Reserved,
    AcpiReclaimable,
    AcpiNvs,
    Bad,
    Other(u32),
}

impl From<u32> for E820Kind {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Usable,
            2 => Self::Reserved,
            3 => Self::AcpiReclaimable,
            4 => Self::AcpiNvs,
            5 => Self::Bad,
            other => Self::Other(other),
        }
    }
}

/// One entry of the firmware's E820 memory map, exactly as the loader copies it.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug)]
pub struct E820Entry {
    pub size: u32,
    pub mem_lo: u32,
    pub mem_hi: u32,
    pub len_lo: u32,
    pub len_hi: u32,
    pub kind: u32,
}

impl E820Entry {
    /// Build an entry from a 64-bit base and length.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(base: u64, len: u64, kind: u32) -> Self {
        Self {
            size: 20,
            mem_lo: base as u32,
            mem_hi: (base >> 32) as u32,
            len_lo: len as u32,
            len_hi: (len >> 32) as u32,
            kind,
        }
    }

    #[must_use]
    pub const fn base(&self) -> u64 {
        ((self.mem_hi as u64) << 32) | self.mem_lo as u64
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        ((self.len_hi as u64) << 32) | self.len_lo as u64
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn end(&self) -> u64 {
        self.base().saturating_add(self.len())
    }

    #[must_use]
    pub fn kind(&self) -> E820Kind {
        E820Kind::from(self.kind)
    }
}
