use crate::disk::DiskStats;

/// Entries in the root directory.
pub const MAX_FILES: usize = 16;
/// Longest file name, in bytes.
pub const NAME_MAX: usize = 14;
/// Largest file, in bytes.
pub const FILE_MAX: usize = 256;

/// A file image: name and contents.
pub type ImageEntry<'a> = (&'a str, &'a [u8]);

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    #[error("file name must be 1 to 14 bytes")]
    BadName,
    #[error("file larger than 256 bytes")]
    TooLarge,
    #[error("file already exists")]
    Exists,
    #[error("root directory is full")]
    DirectoryFull,
    #[error("no such file")]
    NotFound,
    #[error("scratch disk holds no file")]
    ScratchEmpty,
}

impl FsError {
    /// The message as a static string, for callers that report `&'static str`.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::BadName => "bad file name",
            Self::TooLarge => "file too large",
            Self::Exists => "file already exists",
            Self::DirectoryFull => "root directory is full",
            Self::NotFound => "no such file",
            Self::ScratchEmpty => "scratch disk holds no file",
        }
    }
}

#[derive(Copy, Clone)]
pub struct File {
    name: [u8; NAME_MAX],
    name_len: usize,
    data: [u8; FILE_MAX],
    len: usize,
}

impl File {
    /// # Errors
    /// [`FsError::BadName`] or [`FsError::TooLarge`].
    pub fn new(name: &str, data: &[u8]) -> Result<Self, FsError> {
        if name.is_empty() || name.len() > NAME_MAX {
            return Err(FsError::BadName);
        }
        if data.len() > FILE_MAX {
            return Err(FsError::TooLarge);
        }
        let mut file = Self {
            name: [0; NAME_MAX],
            name_len: name.len(),
            data: [0; FILE_MAX],
            len: data.len(),
        };
        file.name[..name.len()].copy_from_slice(name.as_bytes());
        file.data[..data.len()].copy_from_slice(data);
        Ok(file)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        // Built from a `&str`, so always valid.
        core::str::from_utf8(&self.name[..self.name_len]).unwrap_or_default()
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// A flat root directory on the filesystem disk, plus the scratch disk the
/// host uses to move single files in and out.
pub struct FileSystem {
    root: [Option<File>; MAX_FILES],
    scratch: Option<File>,
    disk: DiskStats,
    scratch_disk: DiskStats,
}

impl FileSystem {
    /// An unformatted, empty filesystem.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: [None; MAX_FILES],
            scratch: None,
            disk: DiskStats { reads: 0, writes: 0 },
            scratch_disk: DiskStats { reads: 0, writes: 0 },
        }
    }

    /// Mount the disk holding `image`, with `scratch` waiting on the scratch
    /// disk. Mounting reads every file once.
    ///
    /// # Errors
    /// Any file in `image` that could not be created.
    pub fn mount(image: &[ImageEntry<'_>], scratch: Option<ImageEntry<'_>>) -> Result<Self, FsError> {
        let mut fs = Self::new();
        for &(name, data) in image {
            fs.create(File::new(name, data)?)?;
            fs.disk.read(data.len());
        }
        fs.scratch = scratch.map(|(name, data)| File::new(name, data)).transpose()?;
        Ok(fs)
    }

    /// Empty the root directory. Writes the directory back to disk.
    pub fn format(&mut self) {
        self.root = [None; MAX_FILES];
        self.disk.write(0);
    }

    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.root.iter().flatten()
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.root
            .iter()
            .position(|f| f.as_ref().is_some_and(|f| f.name() == name))
    }

    fn create(&mut self, file: File) -> Result<(), FsError> {
        if self.find(file.name()).is_some() {
            return Err(FsError::Exists);
        }
        let slot = self
            .root
            .iter_mut()
            .find(|f| f.is_none())
            .ok_or(FsError::DirectoryFull)?;
        *slot = Some(file);
        Ok(())
    }

    /// Contents of `name`, read from disk.
    ///
    /// # Errors
    /// [`FsError::NotFound`]
    pub fn read(&mut self, name: &str) -> Result<&[u8], FsError> {
        let index = self.find(name).ok_or(FsError::NotFound)?;
        let file = self.root[index].as_ref().ok_or(FsError::NotFound)?;
        self.disk.read(file.len);
        Ok(file.data())
    }

    /// # Errors
    /// [`FsError::NotFound`]
    pub fn remove(&mut self, name: &str) -> Result<(), FsError> {
        let index = self.find(name).ok_or(FsError::NotFound)?;
        self.root[index] = None;
        self.disk.write(0);
        Ok(())
    }

    /// Copy the file waiting on the scratch disk into the root directory as
    /// `name`.
    ///
    /// # Errors
    /// [`FsError::ScratchEmpty`], or the file could not be created. The
    /// scratch disk keeps its file on error.
    pub fn put(&mut self, name: &str) -> Result<(), FsError> {
        let staged = self.scratch.ok_or(FsError::ScratchEmpty)?;
        self.scratch_disk.read(staged.len);
        self.create(File::new(name, staged.data())?)?;
        self.disk.write(staged.len);
        self.scratch = None;
        Ok(())
    }

    /// Copy `name` onto the scratch disk for the host to pick up.
    ///
    /// # Errors
    /// [`FsError::NotFound`]
    pub fn get(&mut self, name: &str) -> Result<(), FsError> {
        let index = self.find(name).ok_or(FsError::NotFound)?;
        let file = self.root[index];
        if let Some(file) = file {
            self.disk.read(file.len);
            self.scratch_disk.write(file.len);
        }
        self.scratch = file;
        Ok(())
    }

    #[must_use]
    pub const fn scratch(&self) -> Option<&File> {
        self.scratch.as_ref()
    }

    /// Transfer counters of the filesystem disk.
    #[must_use]
    pub const fn disk_stats(&self) -> DiskStats {
        self.disk
    }

    #[must_use]
    pub const fn scratch_stats(&self) -> DiskStats {
        self.scratch_disk
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}
