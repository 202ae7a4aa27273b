//! Pending / done descriptor counts.
//!
//! Gives a quick view of how far a migration has progressed: how many
//! descriptors are still waiting and how many were already imported.

use std::path::Path;

use crate::error::Result;
use crate::state::DescriptorState;
use crate::walker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorCounts {
    pub pending: usize,
    pub done: usize,
}

impl DescriptorCounts {
    pub fn total(&self) -> usize {
        self.pending + self.done
    }
}

/// Count pending and done descriptors below `root`.
pub fn count_descriptors(root: &Path) -> Result<DescriptorCounts> {
    let mut counts = DescriptorCounts::default();
    let descriptors = walker::find_files(root, |name| {
        DescriptorState::from_file_name(name).is_some()
    });

    for path in descriptors {
        let path = path?;
        let state = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(DescriptorState::from_file_name);
        match state {
            Some(DescriptorState::Pending) => counts.pending += 1,
            Some(DescriptorState::Done) => counts.done += 1,
            None => {}
        }
    }

    Ok(counts)
}

/// Run the count command: walk the input folder and print the summary.
pub fn run_count(root: &Path) -> Result<DescriptorCounts> {
    let counts = count_descriptors(root)?;
    println!("Number of files to import: {}", counts.pending);
    println!("Number of files already imported: {}", counts.done);
    println!("Total number of files: {}", counts.total());
    Ok(counts)
}
