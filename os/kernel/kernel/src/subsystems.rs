//! The boot table: every subsystem this kernel brings up, in boot order.

use crate::kernel::Kernel;
use crate::{console, devices, interrupts, memory, threads};
use kernel_boot::{Stage, Subsystem};

pub static BOOT_TABLE: &[Subsystem<Kernel>] = &[
    Subsystem {
        stage: Stage::ClearBss,
        name: "bss",
        init: memory::clear_bss,
        teardown: None,
        report: None,
    },
    Subsystem {
        stage: Stage::ThreadBookkeeping,
        name: "thread",
        init: threads::init,
        teardown: None,
        report: Some(threads::report),
    },
    Subsystem {
        stage: Stage::Console,
        name: "console",
        init: console::init,
        teardown: None,
        report: Some(console::report),
    },
    Subsystem {
        stage: Stage::MemoryAllocators,
        name: "palloc",
        init: memory::init,
        teardown: None,
        report: Some(memory::report),
    },
    Subsystem {
        stage: Stage::KernelAddressSpace,
        name: "paging",
        init: memory::init_address_space,
        teardown: None,
        report: None,
    },
    #[cfg(feature = "userprog")]
    Subsystem {
        stage: Stage::TaskSwitch,
        name: "tss",
        init: crate::userprog::init_task_switch,
        teardown: Some(crate::userprog::done),
        report: None,
    },
    Subsystem {
        stage: Stage::InterruptDispatch,
        name: "intr",
        init: interrupts::init,
        teardown: None,
        report: Some(interrupts::report),
    },
    Subsystem {
        stage: Stage::DeviceInterrupts,
        name: "kbd",
        init: devices::init,
        teardown: None,
        report: Some(devices::report_keyboard),
    },
    #[cfg(feature = "userprog")]
    Subsystem {
        stage: Stage::FaultHandling,
        name: "exception",
        init: interrupts::init_fault_handling,
        teardown: None,
        report: None,
    },
    Subsystem {
        stage: Stage::Scheduler,
        name: "thread-start",
        init: threads::start,
        teardown: None,
        report: None,
    },
    Subsystem {
        stage: Stage::SerialAndTimer,
        name: "timer",
        init: devices::init_serial_and_timer,
        teardown: Some(devices::flush_serial),
        report: Some(devices::report_timer),
    },
    #[cfg(feature = "filesys")]
    Subsystem {
        stage: Stage::Filesystem,
        name: "filesys",
        init: crate::fs::init,
        teardown: Some(crate::fs::done),
        report: Some(crate::fs::report),
    },
    #[cfg(feature = "vm")]
    Subsystem {
        stage: Stage::VirtualMemory,
        name: "vm",
        init: crate::vm::init,
        teardown: None,
        report: Some(crate::vm::report),
    },
];
