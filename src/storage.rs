//! Session storage.
//!
//! [`SessionStore`] owns the on-disk layout of one consumption session: a
//! session-scoped directory holding numbered frame files, scratch files
//! while decode attempts run, a `session_info.json` metadata record, and the
//! final consumption summary.
//!
//! Storage failures are non-fatal to the core: a frame that cannot be
//! written is logged and counted as a failed attempt, and the session
//! carries on.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::DynamicImage;
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::error::SalvageError;

/// Session metadata written once, when the store is created.
#[derive(Debug, Serialize)]
struct SessionInfo<'a> {
    stream_id: &'a str,
    session_timestamp: &'a str,
    created_at: String,
}

/// Directory layout and frame persistence for one session.
///
/// Created via [`SessionStore::create`], which builds a
/// `<root>/<stream_id>/<timestamp>` directory, or
/// [`SessionStore::attach`] to reuse an existing directory (useful in
/// tests and embedders that manage their own layout).
///
/// # Example
///
/// ```no_run
/// use framesalvage::SessionStore;
///
/// let store = SessionStore::create("data/raw", "camera-7").unwrap();
/// println!("session dir: {}", store.dir().display());
/// ```
#[derive(Debug)]
pub struct SessionStore {
    stream_id: String,
    session_timestamp: String,
    dir: PathBuf,
}

impl SessionStore {
    /// Create a fresh session directory under `root` and write the session
    /// metadata record.
    ///
    /// # Errors
    ///
    /// Returns [`SalvageError::SessionDir`] if the directory cannot be
    /// created or the metadata record cannot be written.
    pub fn create<P: AsRef<Path>>(root: P, stream_id: &str) -> Result<Self, SalvageError> {
        let now = OffsetDateTime::now_utc();
        let session_timestamp = now
            .format(format_description!(
                "[year][month][day]_[hour][minute][second]"
            ))
            .unwrap_or_else(|_| "unknown".to_string());

        let dir = root.as_ref().join(stream_id).join(&session_timestamp);
        fs::create_dir_all(&dir).map_err(|error| SalvageError::SessionDir {
            path: dir.clone(),
            reason: error.to_string(),
        })?;

        let store = Self {
            stream_id: stream_id.to_string(),
            session_timestamp,
            dir,
        };
        store.write_session_info()?;
        log::info!("Session directory created: {}", store.dir.display());
        Ok(store)
    }

    /// Attach to an existing directory instead of creating one.
    ///
    /// No metadata record is written; the directory must already exist.
    pub fn attach<P: AsRef<Path>>(dir: P, stream_id: &str) -> Self {
        let now = OffsetDateTime::now_utc();
        let session_timestamp = now
            .format(format_description!(
                "[year][month][day]_[hour][minute][second]"
            ))
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            stream_id: stream_id.to_string(),
            session_timestamp,
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn write_session_info(&self) -> Result<(), SalvageError> {
        let info = SessionInfo {
            stream_id: &self.stream_id,
            session_timestamp: &self.session_timestamp,
            created_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| "unknown".to_string()),
        };
        self.write_json(&info, &self.dir.join("session_info.json"))
    }

    /// The session directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The stream identifier this session was created for.
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Path for the frame with the given 1-based sequence index.
    ///
    /// Names follow `frame_{index:04}_{timestamp}.jpg`, where the timestamp
    /// has millisecond resolution so reruns never clobber earlier output.
    pub fn frame_path(&self, index: u32) -> PathBuf {
        let stamp = OffsetDateTime::now_utc()
            .format(format_description!(
                "[year][month][day]_[hour][minute][second]_[subsecond digits:3]"
            ))
            .unwrap_or_else(|_| "unknown".to_string());
        self.dir.join(format!("frame_{index:04}_{stamp}.jpg"))
    }

    /// Write encoded frame bytes to `path`.
    pub fn write_frame(&self, bytes: &[u8], path: &Path) -> Result<(), SalvageError> {
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Read `path` back and decode it as a still image.
    ///
    /// Returns `None` when the file is missing or does not decode — the
    /// validation step for embedded-image candidates.
    pub fn read_image(&self, path: &Path) -> Option<DynamicImage> {
        match image::open(path) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                log::debug!("Candidate at {} did not decode: {error}", path.display());
                None
            }
        }
    }

    /// Remove a file, best effort.
    pub fn delete(&self, path: &Path) {
        if let Err(error) = fs::remove_file(path) {
            log::debug!("Failed to delete {}: {error}", path.display());
        }
    }

    /// Serialize `value` as pretty-printed JSON at `path`.
    pub fn write_json<T: Serialize>(&self, value: &T, path: &Path) -> Result<(), SalvageError> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json)?;
        Ok(())
    }
}
