//! Timer, keyboard and serial bookkeeping.

use crate::interrupts::{Gate, KEYBOARD_VECTOR, TIMER_VECTOR};
use crate::kernel::Kernel;
use kernel_boot::StepError;

/// Timer interrupts per second.
pub const TIMER_FREQ: u32 = 100;

/// Serial output mode: polled until interrupts can drive a queue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SerialMode {
    Poll,
    Queue,
}

pub struct Devices {
    pub timer_ticks: u64,
    /// Busy-wait iterations per timer tick; zero until calibrated.
    pub loops_per_tick: u64,
    pub keys_pressed: u64,
    /// Characters the input funnel has buffered.
    pub input_buffered: usize,
    pub serial: SerialMode,
}

impl Devices {
    pub const fn new() -> Self {
        Self {
            timer_ticks: 0,
            loops_per_tick: 0,
            keys_pressed: 0,
            input_buffered: 0,
            serial: SerialMode::Poll,
        }
    }
}

/// Device interrupt stage: timer, keyboard, input funnel.
pub fn init(kernel: &mut Kernel) -> Result<(), StepError> {
    kernel
        .interrupts
        .register(TIMER_VECTOR, Gate::Interrupt, "8254 Timer")?;
    kernel
        .interrupts
        .register(KEYBOARD_VECTOR, Gate::Interrupt, "8042 Keyboard")?;
    kernel.devices.input_buffered = 0;
    log::debug!("Timer at {TIMER_FREQ} Hz, keyboard and input ready");
    Ok(())
}

/// Serial and timer stage: queued serial output, then timer calibration.
pub fn init_serial_and_timer(kernel: &mut Kernel) -> Result<(), StepError> {
    kernel.devices.serial = SerialMode::Queue;

    // Largest power of two that still fits in one tick, as a starting
    // point; there is no tick source to refine it against yet.
    let loops_per_tick = 1u64 << 10;
    kernel.devices.loops_per_tick = loops_per_tick;
    log::info!(
        "Calibrating timer...  {} loops/s.",
        loops_per_tick * u64::from(TIMER_FREQ)
    );
    Ok(())
}

pub fn report_timer(kernel: &Kernel) {
    crate::kprintln!("Timer: {} ticks", kernel.devices.timer_ticks);
}

pub fn report_keyboard(kernel: &Kernel) {
    crate::kprintln!("Keyboard: {} keys pressed", kernel.devices.keys_pressed);
}

/// Drain queued serial output before the machine goes away.
pub fn flush_serial(kernel: &mut Kernel) {
    kernel.devices.serial = SerialMode::Poll;
}
