//! The boot configuration assembled from the command line.

/// Scheduling policy selected at boot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SchedulerPolicy {
    /// Priority round robin.
    #[default]
    RoundRobin,
    /// Multi-level feedback queue (`-mlfqs`).
    Mlfqs,
}

/// Everything the command line can change about a boot.
///
/// Written only while options are parsed; every later stage reads it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BootConfiguration {
    /// `-q`: power off after the actions ran, or on a fatal error.
    pub power_off_when_done: bool,
    /// `-f`: reformat the filesystem disk while booting.
    pub format_filesystem: bool,
    /// `-rs=SEED`: seed for the kernel's random number generator.
    pub random_seed: Option<u64>,
    /// `-mlfqs`
    pub scheduler_policy: SchedulerPolicy,
    /// `-ul=COUNT`: cap on pages in the user pool.
    pub user_page_limit: Option<usize>,
    /// `-threads-tests`: `run` goes to the built-in test runner.
    pub test_mode: bool,
}
