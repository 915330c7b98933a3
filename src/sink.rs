// -- sink.rs --

use {
    std::{
        fs::{File, OpenOptions},
        io::{self, Write},
        path::{Path, PathBuf},
    },
    thiserror::Error,
};

// --

#[derive(Debug, Error)]
pub(crate) enum SinkError {
    #[error("no log file is currently open")]
    NoHandle,
    #[error("failed to write to the log file: {0}")]
    Write(io::Error),
    #[error("failed to open the next log file: {0}")]
    Rotate(io::Error),
}

// --

/// Owns the currently open log file and decides when to roll over to the
/// next one. Callers serialize access through the engine's lock; the sink
/// itself holds no lock.
pub(crate) struct RotatingSink {
    base: PathBuf,
    file: Option<File>,
    written: u64,
    index: u8,
    file_size: u64,
    file_count: u8,
}

impl RotatingSink {
    pub fn open(base: PathBuf, file_size: u64, file_count: u8) -> io::Result<RotatingSink> {
        let file = create(&base)?;
        Ok(RotatingSink {
            base,
            file: Some(file),
            written: 0,
            index: 0,
            file_size,
            file_count,
        })
    }

    /// Writes one formatted record and evaluates the rotation threshold.
    /// On a rotation failure the bytes already landed in the old file; the
    /// caller decides how to report it.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.write_raw(bytes)?;
        if self.file_size != 0 && self.written >= self.file_size {
            self.rotate().map_err(SinkError::Rotate)?;
        }
        Ok(())
    }

    /// Writes without evaluating rotation. Used to report rotation failures
    /// through the logging path itself without recursing into another
    /// rotation attempt.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let file = self.file.as_mut().ok_or(SinkError::NoHandle)?;
        file.write_all(bytes).map_err(SinkError::Write)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        if self.file_count == 0 {
            // Truncate-and-restart: the old handle is closed first, so a
            // failed reopen leaves the sink without any valid handle. That
            // state is explicit (`file == None`) and stops further writes
            // instead of silently discarding them.
            self.file = None;
            self.written = 0;
            self.file = Some(create(&self.base)?);
            return Ok(());
        }

        let next = if self.index >= self.file_count {
            0
        } else {
            self.index + 1
        };
        // Open the new file before letting go of the old one; on failure the
        // old handle and byte count stay, so the next write retries.
        let file = create(&self.path_for(next))?;
        self.file = Some(file);
        self.index = next;
        self.written = 0;
        Ok(())
    }

    /// Index 0 is the unsuffixed base name; rotated files get a fresh
    /// formatted `.N` suffix.
    pub fn path_for(&self, index: u8) -> PathBuf {
        if index == 0 {
            return self.base.clone();
        }
        let mut name = self.base.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    pub fn has_handle(&self) -> bool {
        self.file.is_some()
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }

    pub fn close(&mut self) {
        self.flush();
        self.file = None;
        self.written = 0;
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn set_file_size(&mut self, file_size: u64) {
        self.file_size = file_size;
    }

    pub fn file_count(&self) -> u8 {
        self.file_count
    }

    pub fn set_file_count(&mut self, file_count: u8) {
        self.file_count = file_count;
    }
}

// --

fn create(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// --
