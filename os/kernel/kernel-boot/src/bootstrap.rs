//! # Subsystem Bootstrap
//!
//! The kernel brings its subsystems up from an explicit, ordered table of
//! [`Subsystem`] entries. [`Stage`] fixes the only order that works:
//!
//! ```text
//! ClearBss → ThreadBookkeeping → Console → MemoryAllocators
//!   → KernelAddressSpace → [TaskSwitch] → InterruptDispatch
//!   → DeviceInterrupts → [FaultHandling] → Scheduler → SerialAndTimer
//!   → [Filesystem] → [VirtualMemory]
//! ```
//!
//! Bracketed stages belong to optional subsystems; they are skipped when the
//! kernel was built without the matching [`Capabilities`].

use crate::capabilities::Capabilities;
use crate::error::{SequenceError, StepError, StepFailed};
use core::fmt;

/// A point in the boot order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Zero uninitialized global state.
    ClearBss,
    /// Enough task bookkeeping for locks to work.
    ThreadBookkeeping,
    /// Console output under locking.
    Console,
    /// Physical memory discovery and the page pools.
    MemoryAllocators,
    /// The kernel's own page table, activated.
    KernelAddressSpace,
    /// Task-state segment and descriptor table.
    TaskSwitch,
    InterruptDispatch,
    /// Timer, keyboard, and the input funnel.
    DeviceInterrupts,
    /// Exceptions and the system-call entry.
    FaultHandling,
    /// Starts the scheduler; preemption becomes possible.
    Scheduler,
    /// Serial output queueing and timer calibration.
    SerialAndTimer,
    /// Disk layer and filesystem.
    Filesystem,
    VirtualMemory,
}

impl Stage {
    /// Every stage, in boot order.
    pub const ALL: [Self; 13] = [
        Self::ClearBss,
        Self::ThreadBookkeeping,
        Self::Console,
        Self::MemoryAllocators,
        Self::KernelAddressSpace,
        Self::TaskSwitch,
        Self::InterruptDispatch,
        Self::DeviceInterrupts,
        Self::FaultHandling,
        Self::Scheduler,
        Self::SerialAndTimer,
        Self::Filesystem,
        Self::VirtualMemory,
    ];

    /// Capabilities a build needs for this stage to run at all.
    #[must_use]
    pub const fn requires(self) -> Capabilities {
        match self {
            Self::TaskSwitch | Self::FaultHandling => Capabilities::USER_PROGRAMS,
            Self::Filesystem => Capabilities::FILESYSTEM,
            Self::VirtualMemory => Capabilities::VIRTUAL_MEMORY,
            _ => Capabilities::NONE,
        }
    }

    /// Stages every boot table has to list.
    #[must_use]
    pub const fn is_mandatory(self) -> bool {
        self.requires().into_bits() == 0
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ClearBss => "clear-bss",
            Self::ThreadBookkeeping => "thread-bookkeeping",
            Self::Console => "console",
            Self::MemoryAllocators => "memory-allocators",
            Self::KernelAddressSpace => "kernel-address-space",
            Self::TaskSwitch => "task-switch",
            Self::InterruptDispatch => "interrupt-dispatch",
            Self::DeviceInterrupts => "device-interrupts",
            Self::FaultHandling => "fault-handling",
            Self::Scheduler => "scheduler",
            Self::SerialAndTimer => "serial-and-timer",
            Self::Filesystem => "filesystem",
            Self::VirtualMemory => "virtual-memory",
        }
    }

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of the boot table.
///
/// `C` is the kernel's context; every hook gets it by reference.
pub struct Subsystem<C> {
    pub stage: Stage,
    /// Human readable step name, used in logs and errors.
    pub name: &'static str,
    pub init: fn(&mut C) -> Result<(), StepError>,
    /// Called on power-off, in reverse boot order.
    pub teardown: Option<fn(&mut C)>,
    /// Prints the subsystem's counters on power-off.
    pub report: Option<fn(&C)>,
}

impl<C> Clone for Subsystem<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Subsystem<C> {}

impl<C> fmt::Debug for Subsystem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystem")
            .field("stage", &self.stage)
            .field("name", &self.name)
            .field("teardown", &self.teardown.is_some())
            .field("report", &self.report.is_some())
            .finish()
    }
}

/// Walks a validated boot table.
///
/// Keeps a cursor, so boot can stop after a stage (to read the command line,
/// say) and continue later.
pub struct Bootstrapper<'t, C> {
    table: &'t [Subsystem<C>],
    capabilities: Capabilities,
    next: usize,
    initialized: u16,
    finalized: bool,
}

impl<'t, C> Bootstrapper<'t, C> {
    /// Validate `table` and prepare to run it.
    ///
    /// # Errors
    /// [`SequenceError`] if the stages are not strictly increasing, or a
    /// mandatory stage is missing.
    pub fn new(
        table: &'t [Subsystem<C>],
        capabilities: Capabilities,
    ) -> Result<Self, SequenceError> {
        for pair in table.windows(2) {
            if pair[1].stage <= pair[0].stage {
                return Err(SequenceError::OutOfOrder {
                    stage: pair[1].stage,
                    after: pair[0].stage,
                });
            }
        }

        if let Some(&stage) = Stage::ALL
            .iter()
            .filter(|s| s.is_mandatory())
            .find(|s| !table.iter().any(|entry| entry.stage == **s))
        {
            return Err(SequenceError::MissingStage { stage });
        }

        Ok(Self {
            table,
            capabilities,
            next: 0,
            initialized: 0,
            finalized: false,
        })
    }

    /// Run every pending step up to and including `stage`.
    ///
    /// # Errors
    /// The first failing step, as [`StepFailed`]; the cursor stays on it.
    pub fn run_to(&mut self, ctx: &mut C, stage: Stage) -> Result<(), StepFailed> {
        while let Some(entry) = self.table.get(self.next) {
            if entry.stage > stage {
                break;
            }

            if self.capabilities.contains(entry.stage.requires()) {
                log::debug!("Initializing {} ...", entry.name);
                (entry.init)(ctx).map_err(|source| StepFailed {
                    stage: entry.stage,
                    step: entry.name,
                    source,
                })?;
                self.initialized |= entry.stage.bit();
            } else {
                log::trace!("Skipping {} (not built in)", entry.name);
            }

            self.next += 1;
        }
        Ok(())
    }

    /// Run the rest of the table.
    ///
    /// # Errors
    /// See [`run_to`](Self::run_to).
    pub fn run_all(&mut self, ctx: &mut C) -> Result<(), StepFailed> {
        self.run_to(ctx, Stage::VirtualMemory)
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.next == self.table.len()
    }

    #[must_use]
    pub const fn is_initialized(&self, stage: Stage) -> bool {
        self.initialized & stage.bit() != 0
    }

    /// Initialized steps, in boot order.
    pub fn initialized(&self) -> impl DoubleEndedIterator<Item = &'t Subsystem<C>> + '_ {
        self.table[..self.next]
            .iter()
            .filter(|entry| self.is_initialized(entry.stage))
    }

    /// Tear down initialized subsystems in reverse boot order. Runs once.
    pub fn finalize(&mut self, ctx: &mut C) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        for entry in self.initialized().rev() {
            if let Some(teardown) = entry.teardown {
                log::debug!("Finalizing {} ...", entry.name);
                teardown(ctx);
            }
        }
    }

    /// Print the counters of every initialized subsystem, in boot order.
    pub fn report(&self, ctx: &C) {
        for entry in self.initialized() {
            if let Some(report) = entry.report {
                report(ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        /// Reports only get `&Recorder`.
        reports: RefCell<Vec<Stage>>,
        fail_at: Option<Stage>,
    }

    fn log_event(ctx: &mut Recorder, what: &str, stage: Stage) {
        ctx.events.push(format!("{what} {stage}"));
    }

    macro_rules! step {
        ($stage:expr) => {
            Subsystem {
                stage: $stage,
                name: $stage.name(),
                init: |ctx: &mut Recorder| {
                    if ctx.fail_at == Some($stage) {
                        return Err(StepError::Failed("no such device"));
                    }
                    log_event(ctx, "init", $stage);
                    Ok(())
                },
                teardown: Some(|ctx: &mut Recorder| log_event(ctx, "down", $stage)),
                report: Some(|ctx: &Recorder| ctx.reports.borrow_mut().push($stage)),
            }
        };
    }

    fn full_table() -> Vec<Subsystem<Recorder>> {
        vec![
            step!(Stage::ClearBss),
            step!(Stage::ThreadBookkeeping),
            step!(Stage::Console),
            step!(Stage::MemoryAllocators),
            step!(Stage::KernelAddressSpace),
            step!(Stage::TaskSwitch),
            step!(Stage::InterruptDispatch),
            step!(Stage::DeviceInterrupts),
            step!(Stage::FaultHandling),
            step!(Stage::Scheduler),
            step!(Stage::SerialAndTimer),
            step!(Stage::Filesystem),
            step!(Stage::VirtualMemory),
        ]
    }

    fn inits(ctx: &Recorder) -> Vec<&str> {
        ctx.events
            .iter()
            .filter_map(|e| e.strip_prefix("init "))
            .collect()
    }

    #[test]
    fn rejects_out_of_order_tables() {
        let mut table = full_table();
        table.swap(3, 4);
        assert_eq!(
            Bootstrapper::new(&table, Capabilities::NONE).err(),
            Some(SequenceError::OutOfOrder {
                stage: Stage::MemoryAllocators,
                after: Stage::KernelAddressSpace,
            })
        );
    }

    #[test]
    fn rejects_missing_mandatory_stage() {
        let mut table = full_table();
        table.retain(|s| s.stage != Stage::Scheduler);
        assert_eq!(
            Bootstrapper::new(&table, Capabilities::NONE).err(),
            Some(SequenceError::MissingStage { stage: Stage::Scheduler })
        );

        // Optional stages may be left out.
        let mut table = full_table();
        table.retain(|s| s.stage.is_mandatory());
        assert!(Bootstrapper::new(&table, Capabilities::NONE).is_ok());
    }

    #[test]
    fn skips_stages_whose_capability_is_absent() {
        let table = full_table();
        let mut ctx = Recorder::default();
        let mut boot = Bootstrapper::new(&table, Capabilities::FILESYSTEM).unwrap();
        boot.run_all(&mut ctx).unwrap();

        assert!(boot.is_complete());
        assert!(boot.is_initialized(Stage::Filesystem));
        assert!(!boot.is_initialized(Stage::TaskSwitch));
        assert_eq!(
            inits(&ctx),
            [
                "clear-bss",
                "thread-bookkeeping",
                "console",
                "memory-allocators",
                "kernel-address-space",
                "interrupt-dispatch",
                "device-interrupts",
                "scheduler",
                "serial-and-timer",
                "filesystem",
            ]
        );
    }

    #[test]
    fn cursor_resumes_after_a_partial_run() {
        let table = full_table();
        let mut ctx = Recorder::default();
        let mut boot = Bootstrapper::new(&table, Capabilities::NONE).unwrap();

        boot.run_to(&mut ctx, Stage::ClearBss).unwrap();
        assert_eq!(inits(&ctx), ["clear-bss"]);
        assert!(!boot.is_complete());

        boot.run_all(&mut ctx).unwrap();
        assert_eq!(inits(&ctx).iter().filter(|s| **s == "clear-bss").count(), 1);
        assert!(boot.is_complete());
    }

    #[test]
    fn stops_at_the_first_failing_step() {
        let table = full_table();
        let mut ctx = Recorder {
            fail_at: Some(Stage::DeviceInterrupts),
            ..Recorder::default()
        };
        let mut boot = Bootstrapper::new(&table, Capabilities::NONE).unwrap();
        let err = boot.run_all(&mut ctx).unwrap_err();

        assert_eq!(err.stage, Stage::DeviceInterrupts);
        assert_eq!(err.to_string(), "device-interrupts failed: no such device");
        assert_eq!(inits(&ctx).last(), Some(&"interrupt-dispatch"));
        assert!(!boot.is_initialized(Stage::DeviceInterrupts));
        assert!(!boot.is_initialized(Stage::Scheduler));
    }

    #[test]
    fn finalize_tears_down_initialized_steps_in_reverse_once() {
        let table = full_table();
        let mut ctx = Recorder {
            fail_at: Some(Stage::InterruptDispatch),
            ..Recorder::default()
        };
        let mut boot = Bootstrapper::new(&table, Capabilities::USER_PROGRAMS).unwrap();
        assert!(boot.run_all(&mut ctx).is_err());

        ctx.events.clear();
        boot.finalize(&mut ctx);
        boot.finalize(&mut ctx);
        assert_eq!(
            ctx.events,
            [
                "down task-switch",
                "down kernel-address-space",
                "down memory-allocators",
                "down console",
                "down thread-bookkeeping",
                "down clear-bss",
            ]
        );
    }

    #[test]
    fn report_runs_in_boot_order() {
        let table = full_table();
        let mut ctx = Recorder::default();
        let mut boot = Bootstrapper::new(&table, Capabilities::FILESYSTEM).unwrap();
        boot.run_all(&mut ctx).unwrap();

        // Teardown order must not leak into the report.
        boot.finalize(&mut ctx);
        boot.report(&ctx);
        assert_eq!(
            *ctx.reports.borrow(),
            [
                Stage::ClearBss,
                Stage::ThreadBookkeeping,
                Stage::Console,
                Stage::MemoryAllocators,
                Stage::KernelAddressSpace,
                Stage::InterruptDispatch,
                Stage::DeviceInterrupts,
                Stage::Scheduler,
                Stage::SerialAndTimer,
                Stage::Filesystem,
            ]
        );
    }

    #[test]
    fn report_skips_steps_that_never_ran() {
        let table = full_table();
        let mut ctx = Recorder {
            fail_at: Some(Stage::KernelAddressSpace),
            ..Recorder::default()
        };
        let mut boot = Bootstrapper::new(&table, Capabilities::NONE).unwrap();
        assert!(boot.run_all(&mut ctx).is_err());

        boot.report(&ctx);
        assert_eq!(
            *ctx.reports.borrow(),
            [
                Stage::ClearBss,
                Stage::ThreadBookkeeping,
                Stage::Console,
                Stage::MemoryAllocators,
            ]
        );
        assert_eq!(boot.initialized().count(), 4);
    }
}
