//! The filesystem subsystem and the file actions on top of it.
//!
//! The filesystem disk is mounted from [`IMAGE`]; the scratch disk starts out
//! holding [`SCRATCH`], as if the host runner had passed it in.

use crate::kernel::Kernel;
use kernel_boot::StepError;
use kernel_fs::{FileSystem, FsError, ImageEntry};

static IMAGE: &[ImageEntry<'static>] = &[
    ("README", b"Files on this disk survive until the next -f.\n" as &[u8]),
    ("motd", b"Boot complete. Use 'run' to start a program.\n" as &[u8]),
];

static SCRATCH: Option<ImageEntry<'static>> = Some(("scratch", b"Put here from the host.\n" as &[u8]));

fn fs(kernel: &mut Kernel) -> Result<&mut FileSystem, &'static str> {
    kernel.fs.as_mut().ok_or("file system is not mounted")
}

/// Filesystem stage: mount the disks, reformatting under `-f`.
pub fn init(kernel: &mut Kernel) -> Result<(), StepError> {
    let mut fs = FileSystem::mount(IMAGE, SCRATCH).map_err(|e| {
        log::error!("{e}");
        StepError::Failed("cannot mount the file system")
    })?;
    if kernel.config.format_filesystem {
        log::info!("Formatting file system...");
        fs.format();
        log::info!("done.");
    }
    kernel.fs = Some(fs);
    Ok(())
}

pub fn done(kernel: &mut Kernel) {
    if let Some(fs) = &kernel.fs {
        log::debug!("File system closed with {} file(s)", fs.files().count());
    }
}

/// Disk transfer counters, one line per disk.
pub fn report(kernel: &Kernel) {
    if let Some(fs) = &kernel.fs {
        crate::kprintln!("hd0:1: {}", fs.disk_stats());
        crate::kprintln!("hd1:0: {}", fs.scratch_stats());
    }
}

pub fn ls(kernel: &mut Kernel) -> Result<(), &'static str> {
    let fs = fs(kernel)?;
    crate::kprintln!("Files in the root directory:");
    for file in fs.files() {
        crate::kprintln!("{}", file.name());
    }
    crate::kprintln!("End of listing.");
    Ok(())
}

pub fn cat(kernel: &mut Kernel, name: &str) -> Result<(), &'static str> {
    let fs = fs(kernel)?;
    crate::kprintln!("Printing '{name}' to the console...");
    let data = fs.read(name).map_err(FsError::reason)?;
    match core::str::from_utf8(data) {
        Ok(text) => crate::kprintln!("{text}"),
        Err(_) => crate::kprintln!("{data:02x?}"),
    }
    Ok(())
}

pub fn rm(kernel: &mut Kernel, name: &str) -> Result<(), &'static str> {
    let fs = fs(kernel)?;
    crate::kprintln!("Deleting '{name}'...");
    fs.remove(name).map_err(FsError::reason)
}

/// Copy the file waiting on the scratch disk into the root directory.
pub fn put(kernel: &mut Kernel, name: &str) -> Result<(), &'static str> {
    let fs = fs(kernel)?;
    crate::kprintln!("Putting '{name}' into the file system...");
    fs.put(name).map_err(FsError::reason)
}

/// Copy `name` onto the scratch disk for the host to pick up.
pub fn get(kernel: &mut Kernel, name: &str) -> Result<(), &'static str> {
    let fs = fs(kernel)?;
    crate::kprintln!("Getting '{name}' from the file system...");
    fs.get(name).map_err(FsError::reason)
}
