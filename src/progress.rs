//! Migration progress reporting.
//!
//! Every document produces `{index}/{total}: ...` status lines so users can
//! follow a long migration. Progress is emitted on **stderr** so stdout
//! (the run summary, `count` output) stays parseable for scripts.

use std::io::Write;
use std::path::Path;

/// A single progress event for one migration run.
#[derive(Clone, Debug)]
pub enum MigrationProgressEvent {
    /// Walk finished; `total` pending descriptors queued.
    Discovered { total: u64 },
    /// Descriptor has no attachments and was left pending.
    Skipped { n: u64, total: u64, name: String },
    /// Attachments read from disk, about to upload.
    Found {
        n: u64,
        total: u64,
        name: String,
        attachments: u64,
    },
    /// Dry run: descriptor parsed and all attachments present.
    Checked {
        n: u64,
        total: u64,
        name: String,
        attachments: u64,
    },
    Uploaded { n: u64, total: u64, name: String },
    MarkedDone { n: u64, total: u64, path: String },
    /// Fatal error; the run stops after this event.
    Failed {
        n: u64,
        total: u64,
        name: String,
        error: String,
    },
}

impl MigrationProgressEvent {
    pub fn marked_done(n: u64, total: u64, path: &Path) -> Self {
        MigrationProgressEvent::MarkedDone {
            n,
            total,
            path: path.display().to_string(),
        }
    }

    /// Human-readable status line, without trailing newline.
    pub fn human_line(&self) -> String {
        match self {
            MigrationProgressEvent::Discovered { total } => {
                format!("found {} pending documents", format_number(*total))
            }
            MigrationProgressEvent::Skipped { n, total, name } => {
                format!("{}/{}: No attachments found for {}", n, total, name)
            }
            MigrationProgressEvent::Found {
                n,
                total,
                name,
                attachments,
            } => format!(
                "{}/{}: Found {} attachments for {}",
                n, total, attachments, name
            ),
            MigrationProgressEvent::Checked {
                n,
                total,
                name,
                attachments,
            } => format!(
                "{}/{}: Would upload {} attachments for {}",
                n, total, attachments, name
            ),
            MigrationProgressEvent::Uploaded { n, total, name } => {
                format!("{}/{}: Document uploaded successfully: {}", n, total, name)
            }
            MigrationProgressEvent::MarkedDone { n, total, path } => {
                format!("{}/{}: Marked {} as done", n, total, path)
            }
            MigrationProgressEvent::Failed {
                n,
                total,
                name,
                error,
            } => format!(
                "{}/{}: Error uploading document {}: {}",
                n, total, name, error
            ),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            MigrationProgressEvent::Discovered { total } => serde_json::json!({
                "event": "discovered",
                "total": total
            }),
            MigrationProgressEvent::Skipped { n, total, name } => serde_json::json!({
                "event": "skipped",
                "n": n,
                "total": total,
                "name": name
            }),
            MigrationProgressEvent::Found {
                n,
                total,
                name,
                attachments,
            } => serde_json::json!({
                "event": "found",
                "n": n,
                "total": total,
                "name": name,
                "attachments": attachments
            }),
            MigrationProgressEvent::Checked {
                n,
                total,
                name,
                attachments,
            } => serde_json::json!({
                "event": "checked",
                "n": n,
                "total": total,
                "name": name,
                "attachments": attachments
            }),
            MigrationProgressEvent::Uploaded { n, total, name } => serde_json::json!({
                "event": "uploaded",
                "n": n,
                "total": total,
                "name": name
            }),
            MigrationProgressEvent::MarkedDone { n, total, path } => serde_json::json!({
                "event": "done",
                "n": n,
                "total": total,
                "path": path
            }),
            MigrationProgressEvent::Failed {
                n,
                total,
                name,
                error,
            } => serde_json::json!({
                "event": "failed",
                "n": n,
                "total": total,
                "name": name,
                "error": error
            }),
        }
    }
}

/// Reports migration progress. Implementations write to stderr (human or JSON).
pub trait MigrationProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the migration driver.
    fn report(&self, event: MigrationProgressEvent);
}

/// Human-friendly progress on stderr: "3/120: Found 2 attachments for Invoice".
pub struct StderrProgress;

impl MigrationProgressReporter for StderrProgress {
    fn report(&self, event: MigrationProgressEvent) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", event.human_line());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl MigrationProgressReporter for JsonProgress {
    fn report(&self, event: MigrationProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event.to_json()) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl MigrationProgressReporter for NoProgress {
    fn report(&self, _event: MigrationProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn MigrationProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn human_lines_carry_index_and_total() {
        let skipped = MigrationProgressEvent::Skipped {
            n: 2,
            total: 5,
            name: "Empty".into(),
        };
        assert_eq!(skipped.human_line(), "2/5: No attachments found for Empty");

        let found = MigrationProgressEvent::Found {
            n: 1,
            total: 5,
            name: "Bill".into(),
            attachments: 3,
        };
        assert_eq!(found.human_line(), "1/5: Found 3 attachments for Bill");

        let done = MigrationProgressEvent::marked_done(1, 5, Path::new("/in/a/metadata.json"));
        assert_eq!(done.human_line(), "1/5: Marked /in/a/metadata.json as done");
    }

    #[test]
    fn json_events_are_tagged() {
        let failed = MigrationProgressEvent::Failed {
            n: 4,
            total: 9,
            name: "Bill".into(),
            error: "boom".into(),
        };
        let json = failed.to_json();
        assert_eq!(json["event"], "failed");
        assert_eq!(json["n"], 4);
        assert_eq!(json["error"], "boom");
    }
}
