use bitfield_struct::bitfield;

/// Optional subsystems compiled into the kernel.
///
/// Options, actions and boot stages name the capabilities they need; when
/// one is missing they are treated as if they did not exist.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Capabilities {
    /// Loading and running user programs, with system calls.
    pub user_programs: bool,
    /// The disk layer and the filesystem on top of it.
    pub filesystem: bool,
    /// Demand-paged virtual memory.
    pub virtual_memory: bool,
    #[bits(5)]
    __: u8,
}

impl Capabilities {
    pub const NONE: Self = Self::new();
    pub const USER_PROGRAMS: Self = Self::new().with_user_programs(true);
    pub const FILESYSTEM: Self = Self::new().with_filesystem(true);
    pub const VIRTUAL_MEMORY: Self = Self::new().with_virtual_memory(true);

    /// Whether every capability in `required` is present.
    #[inline]
    #[must_use]
    pub const fn contains(self, required: Self) -> bool {
        self.into_bits() & required.into_bits() == required.into_bits()
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.into_bits() | other.into_bits())
    }
}
