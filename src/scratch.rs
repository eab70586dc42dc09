//! Scoped scratch files.
//!
//! The generic decoder needs file-based input, so buffered bytes are handed
//! over through short-lived scratch files. [`ScratchFile`] owns the file for
//! the duration of one decode attempt and removes it on drop, on every exit
//! path. Names are unique per attempt (process id plus a global counter), so
//! concurrent sessions sharing a filesystem cannot collide.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::error::SalvageError;

static NEXT_SCRATCH_ID: AtomicU64 = AtomicU64::new(0);

/// A uniquely named temporary file removed when the guard drops.
#[derive(Debug)]
pub(crate) struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Write `bytes` to a fresh scratch file with the given extension.
    pub(crate) fn create(dir: &Path, extension: &str, bytes: &[u8]) -> Result<Self, SalvageError> {
        let id = NEXT_SCRATCH_ID.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!(
            "scratch_{}_{id}.{extension}",
            std::process::id()
        ));

        fs::write(&path, bytes)?;
        Ok(Self { path })
    }

    /// Like [`create`](ScratchFile::create), but prepends a synthetic header
    /// before the payload. Used by the raw-unit scanner's container shims.
    pub(crate) fn create_with_header(
        dir: &Path,
        extension: &str,
        header: &[u8],
        bytes: &[u8],
    ) -> Result<Self, SalvageError> {
        let mut contents = Vec::with_capacity(header.len() + bytes.len());
        contents.extend_from_slice(header);
        contents.extend_from_slice(bytes);
        Self::create(dir, extension, &contents)
    }

    /// Path of the scratch file, for handing to the decoder.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            log::debug!(
                "Failed to remove scratch file {}: {error}",
                self.path.display()
            );
        }
    }
}
