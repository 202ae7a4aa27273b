//! Recursive directory walking.
//!
//! Finds files by name anywhere below an input folder. The walk is lazy and
//! depth-first; entries in each directory are visited in file-name order so
//! repeated runs see documents in the same sequence. Symlinks are not
//! followed.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;

/// Lazily enumerate every regular file below `root` whose file name
/// satisfies `predicate`.
///
/// The first unreadable directory (including a missing `root`) is yielded
/// as an error; callers stop there. Calling this again restarts the walk.
pub fn find_files<P>(root: &Path, mut predicate: P) -> impl Iterator<Item = Result<PathBuf>>
where
    P: FnMut(&str) -> bool,
{
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Err(e) => Some(Err(e.into())),
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    return None;
                }
                let matches = entry.file_name().to_str().map_or(false, |name| predicate(name));
                matches.then(|| Ok(entry.into_path()))
            }
        })
}

/// Collect all files named exactly `name`, aborting on the first walk error.
pub fn collect_named(root: &Path, name: &str) -> Result<Vec<PathBuf>> {
    find_files(root, |file_name| file_name == name).collect()
}
