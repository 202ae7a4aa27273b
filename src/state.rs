//! Pending / done state of descriptors.
//!
//! A descriptor named `metadata.json` is pending. Once every attachment has
//! been uploaded it is renamed to `metadata.json.done`. The rename is the
//! only transition, and neither direction replaces an existing file, so a
//! re-run only ever sees pending descriptors.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MigrateError, Result};

pub const METADATA_FILE_NAME: &str = "metadata.json";
pub const DONE_SUFFIX: &str = ".done";
pub const DONE_FILE_NAME: &str = "metadata.json.done";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DescriptorState {
    Pending,
    Done,
}

impl DescriptorState {
    /// Classify a file name; `None` for anything that is not a descriptor.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            METADATA_FILE_NAME => Some(DescriptorState::Pending),
            DONE_FILE_NAME => Some(DescriptorState::Done),
            _ => None,
        }
    }
}

/// Path of the done marker for a pending descriptor.
pub fn done_path(pending: &Path) -> PathBuf {
    let mut name = pending.as_os_str().to_owned();
    name.push(DONE_SUFFIX);
    PathBuf::from(name)
}

/// Path of the pending descriptor for a done marker.
pub fn pending_path(done: &Path) -> PathBuf {
    done.with_file_name(METADATA_FILE_NAME)
}

/// Rename a pending descriptor to its done form. Returns the new path.
///
/// Fails instead of replacing an existing `metadata.json.done`.
pub fn mark_done(pending: &Path) -> Result<PathBuf> {
    let target = done_path(pending);
    rename_new(pending, &target)?;
    debug!(from = %pending.display(), to = %target.display(), "marked done");
    Ok(target)
}

/// Rename a done marker back to its pending form. Returns the new path.
///
/// Fails instead of replacing an existing `metadata.json`.
pub fn mark_pending(done: &Path) -> Result<PathBuf> {
    let target = pending_path(done);
    rename_new(done, &target)?;
    Ok(target)
}

fn rename_new(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        return Err(MigrateError::io(
            from,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ),
        ));
    }
    std::fs::rename(from, to).map_err(|e| MigrateError::io(from, e))
}
