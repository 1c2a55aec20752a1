use crate::qemu_trace;
use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use kernel_sync::{SpinLock, SyncOnceCell};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: SyncOnceCell<QemuLogger> = SyncOnceCell::new();

/// `log::Log` backed by the QEMU debug console.
pub struct QemuLogger {
    max_level: LevelFilter,
    /// Serialize writers; off until the console is brought up.
    locking: AtomicBool,
    lock: SpinLock<()>,
    chars: AtomicU64,
}

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self {
            max_level,
            locking: AtomicBool::new(false),
            lock: SpinLock::new(()),
            chars: AtomicU64::new(0),
        }
    }

    /// Install the logger. Call this once during early init.
    ///
    /// # Errors
    /// If a logger is already installed.
    pub fn init(self) -> Result<&'static Self, SetLoggerError> {
        let logger = LOGGER.get_or_init(|| self);
        log::set_logger(logger)?;
        log::set_max_level(logger.max_level);
        Ok(logger)
    }

    /// The installed logger, if any.
    pub fn get() -> Option<&'static Self> {
        LOGGER.get()
    }

    /// Serialize concurrent writers from now on.
    pub fn enable_locking(&self) {
        self.locking.store(true, Ordering::Release);
    }

    /// Stop taking the lock, so a fatal path can print even while some
    /// other writer holds it.
    pub fn disable_locking(&self) {
        self.locking.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_locking(&self) -> bool {
        self.locking.load(Ordering::Acquire)
    }

    /// Characters written to the console so far.
    #[must_use]
    pub fn chars_written(&self) -> u64 {
        self.chars.load(Ordering::Relaxed)
    }

    /// Write one already-formatted piece of console output, counted.
    pub fn print(&self, args: fmt::Arguments) {
        let _guard = self.is_locking().then(|| self.lock.lock());
        let n = qemu_trace!("{args}");
        self.chars.fetch_add(n as u64, Ordering::Relaxed);
    }
}

/// Format `record` the way the console prints it: `[LEVEL] target: message`.
///
/// # Errors
/// Propagates errors from `w`.
pub fn write_record(w: &mut impl Write, record: &Record) -> fmt::Result {
    writeln!(w, "[{}] {}: {}", record.level(), record.target(), record.args())
}

struct RecordDisplay<'a, 'r>(&'a Record<'r>);

impl fmt::Display for RecordDisplay<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_record(f, self.0)
    }
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.print(format_args!("{}", RecordDisplay(record)));
    }

    fn flush(&self) {
        // no-op for qemu debug port
    }
}
