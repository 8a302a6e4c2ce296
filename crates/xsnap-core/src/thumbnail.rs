//! Write-then-rename file output, used for the single thumbnail slot.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// A file being written next to its final path.
///
/// Bytes go to a sibling staging file; [`StagedFile::persist`] renames it
/// over the target. Dropping without persisting removes the staging file and
/// leaves whatever was at the target untouched.
pub struct StagedFile {
    target: PathBuf,
    staging: PathBuf,
    file: Option<BufWriter<File>>,
}

impl StagedFile {
    pub fn create(target: &Path) -> io::Result<Self> {
        let staging = staging_path(target)?;
        let file = File::create(&staging)?;
        debug!("staging {} at {}", target.display(), staging.display());

        Ok(Self {
            target: target.to_path_buf(),
            staging,
            file: Some(BufWriter::new(file)),
        })
    }

    /// Flush, sync and atomically move the staged bytes to the target path.
    pub fn persist(mut self) -> io::Result<PathBuf> {
        let writer = self.file.take().ok_or_else(closed)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.staging, &self.target)?;
        Ok(std::mem::take(&mut self.target))
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.as_mut().ok_or_else(closed)?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.as_mut().ok_or_else(closed)?.flush()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.file.take();
        if self.staging.exists() {
            debug!("discarding staged {}", self.staging.display());
            let _ = fs::remove_file(&self.staging);
        }
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "staged file already closed")
}

fn staging_path(target: &Path) -> io::Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", target.display()),
        )
    })?;
    let mut staged = name.to_os_string();
    staged.push(format!(".{}.partial", std::process::id()));
    Ok(target.with_file_name(staged))
}
