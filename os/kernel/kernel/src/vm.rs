//! Virtual memory bookkeeping: one frame-table slot per user pool page.

use crate::kernel::Kernel;
use kernel_alloc::PoolKind;
use kernel_boot::StepError;

pub struct FrameTable {
    /// User frames that can back a page.
    pub frames: usize,
    pub evictions: u64,
}

/// Virtual memory stage: size the frame table after the user pool.
pub fn init(kernel: &mut Kernel) -> Result<(), StepError> {
    let memory = kernel
        .memory
        .as_ref()
        .ok_or(StepError::Failed("page pools are not set up"))?;
    let frames = memory.pages.pool(PoolKind::User).total_pages();
    if frames == 0 {
        return Err(StepError::Failed("user pool has no frames to page into"));
    }
    log::info!("Frame table covers {frames} user frames");
    kernel.frame_table = Some(FrameTable {
        frames,
        evictions: 0,
    });
    Ok(())
}

pub fn report(kernel: &Kernel) {
    if let Some(table) = &kernel.frame_table {
        crate::kprintln!(
            "Paging: {} frames, {} evictions",
            table.frames,
            table.evictions
        );
    }
}
