//! Boot thread bookkeeping and the scheduler switch.

use crate::kernel::Kernel;
use kernel_boot::{SchedulerPolicy, StepError};

pub struct Threads {
    /// Name of the thread running the boot task.
    pub boot_thread: &'static str,
    pub policy: SchedulerPolicy,
    pub started: bool,
    pub idle_ticks: u64,
    pub kernel_ticks: u64,
    pub user_ticks: u64,
}

impl Threads {
    pub const fn new() -> Self {
        Self {
            boot_thread: "",
            policy: SchedulerPolicy::RoundRobin,
            started: false,
            idle_ticks: 0,
            kernel_ticks: 0,
            user_ticks: 0,
        }
    }
}

/// Thread bookkeeping stage: the boot task becomes thread `main`.
///
/// The first step after the command line is parsed, so it also arms the
/// panic handler's power-off.
pub fn init(kernel: &mut Kernel) -> Result<(), StepError> {
    kernel.threads.boot_thread = "main";
    kernel.threads.policy = kernel.config.scheduler_policy;
    crate::machine::power_off_on_panic(kernel.config.power_off_when_done);
    Ok(())
}

/// Scheduler stage: from here on the boot thread can be preempted.
pub fn start(kernel: &mut Kernel) -> Result<(), StepError> {
    kernel.threads.started = true;
    log::debug!("Scheduler started ({:?})", kernel.threads.policy);
    Ok(())
}

pub fn report(kernel: &Kernel) {
    let t = &kernel.threads;
    crate::kprintln!(
        "Thread: {} idle ticks, {} kernel ticks, {} user ticks",
        t.idle_ticks,
        t.kernel_ticks,
        t.user_ticks
    );
}
