//! User program support: the task-switch segment and a table of built-in
//! programs standing in for loadable executables.

use crate::console::Console;
use crate::kernel::Kernel;
use core::fmt::Write;
use kernel_alloc::PoolKind;
use kernel_boot::StepError;
use kernel_memory_addresses::PhysicalPage;

pub struct UserPrograms {
    /// Ring 0 stack the CPU switches to on entry from user mode.
    pub tss_stack: PhysicalPage,
    pub processes: u64,
}

type Program = fn(&[&str]) -> i32;

const PROGRAMS: &[(&str, Program)] = &[("echo", echo), ("true", |_| 0), ("false", |_| 1)];

fn echo(args: &[&str]) -> i32 {
    let mut console = Console;
    for arg in args {
        let _ = write!(console, "{arg} ");
    }
    let _ = writeln!(console);
    0
}

/// Task switch stage: reserve the ring 0 stack the TSS points at.
pub fn init_task_switch(kernel: &mut Kernel) -> Result<(), StepError> {
    let memory = kernel
        .memory
        .as_mut()
        .ok_or(StepError::Failed("page pools are not set up"))?;
    let tss_stack = memory
        .pages
        .alloc(PoolKind::Kernel)
        .ok_or(StepError::Failed("no page for the TSS stack"))?;
    log::debug!("TSS ring 0 stack at {}", tss_stack.base());
    kernel.userprog = Some(UserPrograms {
        tss_stack,
        processes: 0,
    });
    Ok(())
}

pub fn done(kernel: &mut Kernel) {
    let Some(userprog) = kernel.userprog.take() else {
        return;
    };
    if let Some(memory) = kernel.memory.as_mut()
        && let Err(e) = memory.pages.free(userprog.tss_stack)
    {
        log::warn!("{e}");
    }
}

/// Run `command_line` as a process and wait for it.
pub fn run(kernel: &mut Kernel, command_line: &str) -> Result<(), &'static str> {
    let mut words = command_line.split_ascii_whitespace();
    let name = words.next().ok_or("empty command line")?;
    let mut argv = [""; 16];
    let mut argc = 0;
    for word in words {
        *argv.get_mut(argc).ok_or("too many arguments")? = word;
        argc += 1;
    }

    let &(_, program) = PROGRAMS
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or("no such program")?;

    // One user page backs the process for as long as it runs.
    let memory = kernel.memory.as_mut().ok_or("memory is not initialized")?;
    let page = memory.pages.alloc(PoolKind::User).ok_or("out of user memory")?;

    let status = program(&argv[..argc]);
    crate::kprintln!("{name}: exit({status})");

    memory
        .pages
        .free(page)
        .map_err(|_| "process page could not be freed")?;
    if let Some(userprog) = kernel.userprog.as_mut() {
        userprog.processes += 1;
    }
    Ok(())
}
