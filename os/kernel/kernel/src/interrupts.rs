//! Interrupt vector registry.
//!
//! Boot stages claim vectors here in order; the table records who owns what
//! so a second claim on the same vector is caught while booting.

use crate::kernel::Kernel;
use kernel_boot::StepError;
use kernel_sync::IrqGuard;

pub const VECTORS: usize = 256;

/// First vector the remapped PICs deliver to.
pub const IRQ_BASE: u8 = 0x20;
pub const TIMER_VECTOR: u8 = IRQ_BASE;
pub const KEYBOARD_VECTOR: u8 = IRQ_BASE + 1;
#[cfg(feature = "userprog")]
pub const SYSCALL_VECTOR: u8 = 0x30;

/// Whether a handler may be preempted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Gate {
    /// Runs with interrupts off.
    Interrupt,
    /// Runs with interrupts on.
    Trap,
}

#[derive(Copy, Clone, Debug)]
pub struct Handler {
    pub name: &'static str,
    pub gate: Gate,
}

pub struct InterruptTable {
    handlers: [Option<Handler>; VECTORS],
    page_faults: u64,
}

impl InterruptTable {
    pub const fn new() -> Self {
        Self {
            handlers: [None; VECTORS],
            page_faults: 0,
        }
    }

    /// Claim `vector` for `name`.
    pub fn register(&mut self, vector: u8, gate: Gate, name: &'static str) -> Result<(), StepError> {
        let _irq = IrqGuard::new();
        let slot = &mut self.handlers[usize::from(vector)];
        if let Some(owner) = slot {
            log::error!("vector {vector:#04x} requested by {name} is owned by {}", owner.name);
            return Err(StepError::Failed("interrupt vector already in use"));
        }
        *slot = Some(Handler { name, gate });
        log::trace!("vector {vector:#04x}: {name} ({gate:?})");
        Ok(())
    }

    pub fn handler(&self, vector: u8) -> Option<Handler> {
        self.handlers[usize::from(vector)]
    }

    pub fn registered(&self) -> usize {
        self.handlers.iter().flatten().count()
    }

    pub const fn page_faults(&self) -> u64 {
        self.page_faults
    }
}

/// Interrupt dispatch stage: the CPU's own exception vectors.
pub fn init(kernel: &mut Kernel) -> Result<(), StepError> {
    const CPU_EXCEPTIONS: [&str; 20] = [
        "#DE Divide Error",
        "#DB Debug Exception",
        "NMI Interrupt",
        "#BP Breakpoint Exception",
        "#OF Overflow Exception",
        "#BR BOUND Range Exceeded Exception",
        "#UD Invalid Opcode Exception",
        "#NM Device Not Available Exception",
        "#DF Double Fault Exception",
        "Coprocessor Segment Overrun",
        "#TS Invalid TSS Exception",
        "#NP Segment Not Present",
        "#SS Stack Fault Exception",
        "#GP General Protection Exception",
        "#PF Page-Fault Exception",
        "Reserved",
        "#MF x87 FPU Floating-Point Error",
        "#AC Alignment Check Exception",
        "#MC Machine-Check Exception",
        "#XF SIMD Floating-Point Exception",
    ];

    for (vector, name) in (0u8..).zip(CPU_EXCEPTIONS) {
        kernel.interrupts.register(vector, Gate::Interrupt, name)?;
    }
    Ok(())
}

/// Exceptions surface as faults in the kernel until user programs exist.
pub fn report(kernel: &Kernel) {
    crate::kprintln!("Exception: {} page faults", kernel.interrupts.page_faults());
}

/// Fault handling stage: system calls become reachable from user mode.
#[cfg(feature = "userprog")]
pub fn init_fault_handling(kernel: &mut Kernel) -> Result<(), StepError> {
    kernel
        .interrupts
        .register(SYSCALL_VECTOR, Gate::Trap, "syscall")?;
    log::debug!("{} interrupt vectors claimed", kernel.interrupts.registered());
    Ok(())
}
