//! Replay support: turn every done marker back into a pending descriptor.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;
use crate::state::{self, DONE_FILE_NAME};
use crate::walker;

#[derive(Debug, Default)]
pub struct UndoReport {
    /// `(done marker, restored descriptor)` pairs.
    pub restored: Vec<(PathBuf, PathBuf)>,
    /// Markers that could not be renamed, with the error message.
    pub failed: Vec<(PathBuf, String)>,
}

/// Rename every `metadata.json.done` below `root` back to `metadata.json`.
///
/// A failed rename is recorded and the walk continues; an unreadable
/// directory still aborts.
pub fn undo_all(root: &Path) -> Result<UndoReport> {
    let mut report = UndoReport::default();

    for done in walker::find_files(root, |name| name == DONE_FILE_NAME) {
        let done = done?;
        match state::mark_pending(&done) {
            Ok(pending) => report.restored.push((done, pending)),
            Err(e) => {
                warn!(path = %done.display(), error = %e, "could not restore descriptor");
                report.failed.push((done, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Run the undo command and print one line per marker.
pub fn run_undo(root: &Path) -> Result<UndoReport> {
    let report = undo_all(root)?;
    for (old, new) in &report.restored {
        println!("Renamed: {} -> {}", old.display(), new.display());
    }
    for (path, error) in &report.failed {
        eprintln!("Error renaming {}: {}", path.display(), error);
    }
    println!("Renaming process completed.");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::pending_descriptors;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn undo_restores_original_pending_set() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for dir in ["a", "b/c", "d"] {
            fs::create_dir_all(root.join(dir)).unwrap();
            fs::write(root.join(dir).join("metadata.json"), b"{}").unwrap();
        }
        let before = pending_descriptors(root).unwrap();

        for path in &before {
            state::mark_done(path).unwrap();
        }
        assert!(pending_descriptors(root).unwrap().is_empty());

        let report = undo_all(root).unwrap();
        assert_eq!(report.restored.len(), 3);
        assert!(report.failed.is_empty());
        assert_eq!(pending_descriptors(root).unwrap(), before);
    }

    #[test]
    fn undo_keeps_a_fresh_pending_descriptor() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("metadata.json"), b"fresh").unwrap();
        fs::write(dir.join("metadata.json.done"), b"old").unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("b/metadata.json.done"), b"{}").unwrap();

        let report = undo_all(tmp.path()).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, dir.join("metadata.json.done"));
        assert_eq!(report.restored.len(), 1);
        assert_eq!(fs::read(dir.join("metadata.json")).unwrap(), b"fresh");
        assert!(dir.join("metadata.json.done").exists());
    }

    #[test]
    fn nothing_to_undo() {
        let tmp = TempDir::new().unwrap();
        let report = undo_all(tmp.path()).unwrap();
        assert!(report.restored.is_empty());
    }
}
