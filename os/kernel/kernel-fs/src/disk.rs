use core::fmt;

/// Bytes per disk sector; transfers are counted in whole sectors.
pub const SECTOR_SIZE: usize = 512;

/// Sectors a transfer of `bytes` touches. Even an empty file costs one.
#[inline]
#[must_use]
pub const fn sectors(bytes: usize) -> u64 {
    if bytes == 0 {
        1
    } else {
        bytes.div_ceil(SECTOR_SIZE) as u64
    }
}

/// Transfer counters of one disk.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DiskStats {
    pub reads: u64,
    pub writes: u64,
}

impl DiskStats {
    pub(crate) const fn read(&mut self, bytes: usize) {
        self.reads += sectors(bytes);
    }

    pub(crate) const fn write(&mut self, bytes: usize) {
        self.writes += sectors(bytes);
    }
}

impl fmt::Display for DiskStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} reads, {} writes", self.reads, self.writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sectors_count_whole() {
        assert_eq!(sectors(0), 1);
        assert_eq!(sectors(1), 1);
        assert_eq!(sectors(SECTOR_SIZE), 1);
        assert_eq!(sectors(SECTOR_SIZE + 1), 2);
    }

    #[test]
    fn counters_print_like_the_shutdown_report() {
        let mut stats = DiskStats::default();
        stats.read(700);
        stats.write(10);
        assert_eq!(stats.to_string(), "2 reads, 1 writes");
    }
}
