//! # Kernel Entry Point
//!
//! The loader enters [`_start`] in long mode, with physical memory mapped at
//! `KERNEL_OFFSET` and interrupts off. From there the kernel switches to its
//! own boot stack and hands over to [`init::kernel_init`], which never
//! returns.

#![no_std]
#![no_main]
#![allow(unsafe_code)]

mod console;
mod devices;
mod init;
mod interrupts;
mod kernel;
mod machine;
mod memory;
mod random;
mod selftest;
mod subsystems;
mod threads;

#[cfg(feature = "filesys")]
mod fs;
#[cfg(feature = "userprog")]
mod userprog;
#[cfg(feature = "vm")]
mod vm;

use kernel_info::memory::BOOT_STACK_SIZE;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    machine::panic(info)
}

/// 16-byte aligned stack
#[repr(align(16))]
struct Aligned<const N: usize>([u8; N]);

/// Boot stack, kept out of `.bss` so clearing `.bss` does not pull the rug.
#[unsafe(link_section = ".bss.boot")]
#[unsafe(no_mangle)]
static mut BOOT_STACK: Aligned<BOOT_STACK_SIZE> = Aligned([0; BOOT_STACK_SIZE]);

/// The kernel entry point.
///
/// # Naked function & Stack
/// Naked so no prologue touches the loader's stack; the first thing done is
/// switching to [`BOOT_STACK`] and emulating a call into [`kernel_entry`].
#[unsafe(no_mangle)]
#[unsafe(naked)]
#[unsafe(link_section = ".text.entry")]
pub extern "C" fn _start() -> ! {
    core::arch::naked_asm!(
        "cli",
        "cld",
        "lea rax, [rip + {stack_sym}]",
        "add rax, {stack_size}",
        "and rax, -16",
        "mov rsp, rax",
        // Emulate a CALL by pushing a dummy return address (so RSP % 16 == 8 at entry)
        "push 0",
        "xor rbp, rbp",
        "jmp {rust_entry}",
        stack_sym = sym BOOT_STACK,
        stack_size = const BOOT_STACK_SIZE,
        rust_entry = sym kernel_entry,
    );
}

/// Kernel entry running on the boot stack.
#[unsafe(no_mangle)]
extern "C" fn kernel_entry() -> ! {
    init::kernel_init()
}
