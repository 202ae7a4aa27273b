//! Docspell export descriptors.
//!
//! Each exported document lives in its own directory:
//!
//! ```text
//! <item>/
//! ├── metadata.json        descriptor (renamed to metadata.json.done once migrated)
//! └── files/
//!     ├── scan.pdf
//!     └── letter.pdf       stored as "letter.converted.pdf" in the descriptor
//! ```
//!
//! Descriptors are trusted input; only the fields the migration needs are
//! required, everything else is defaulted or ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};

/// Subfolder next to the descriptor that holds the attachment files.
pub const FILES_DIR: &str = "files";

/// Infix Docspell adds to converted attachments; the file on disk lacks it.
pub const CONVERSION_SUFFIX: &str = ".converted";

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub direction: String,
    /// Correspondent organisation, if any.
    #[serde(default)]
    pub corr_org: Option<Organisation>,
    #[serde(default)]
    pub folder: Option<Folder>,
    pub attachments: Vec<Attachment>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Organisation {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Folder {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub position: u32,
    pub name: String,
    #[serde(default)]
    pub page_count: u32,
}

impl Attachment {
    /// Name of the file on disk (and the name sent to Paperless).
    pub fn file_name(&self) -> String {
        strip_conversion_suffix(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// An attachment read into memory, ready for upload.
#[derive(Debug, Clone)]
pub struct AttachmentFile {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Parse a descriptor file.
pub fn load_metadata(path: &Path) -> Result<Metadata> {
    let content = std::fs::read_to_string(path).map_err(|e| MigrateError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| MigrateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove the first `.converted` occurrence from a stored attachment name.
pub fn strip_conversion_suffix(name: &str) -> String {
    name.replacen(CONVERSION_SUFFIX, "", 1)
}

/// On-disk location of one attachment: `<descriptor dir>/files/<name>`.
pub fn attachment_path(descriptor_path: &Path, attachment: &Attachment) -> PathBuf {
    descriptor_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(FILES_DIR)
        .join(attachment.file_name())
}

pub fn attachment_paths(metadata: &Metadata, descriptor_path: &Path) -> Vec<PathBuf> {
    metadata
        .attachments
        .iter()
        .map(|a| attachment_path(descriptor_path, a))
        .collect()
}

/// Read one attachment file. A missing file is reported as
/// [`MigrateError::AttachmentNotFound`].
pub fn read_attachment(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MigrateError::AttachmentNotFound {
            path: path.to_path_buf(),
        },
        _ => MigrateError::io(path, e),
    })
}

/// Read every attachment of a descriptor, in descriptor order.
pub fn read_attachments(metadata: &Metadata, descriptor_path: &Path) -> Result<Vec<AttachmentFile>> {
    metadata
        .attachments
        .iter()
        .map(|attachment| {
            let path = attachment_path(descriptor_path, attachment);
            let bytes = read_attachment(&path)?;
            Ok(AttachmentFile {
                file_name: attachment.file_name(),
                path,
                bytes,
            })
        })
        .collect()
}

/// Docspell writes timestamps as epoch milliseconds; hand-edited exports
/// may carry date strings instead.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Millis(i64),
    Text(String),
}

impl RawDate {
    fn into_datetime(self) -> std::result::Result<DateTime<Utc>, String> {
        match self {
            RawDate::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| format!("timestamp out of range: {}", ms)),
            RawDate::Text(s) => parse_date_text(&s),
        }
    }
}

fn parse_date_text(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date: '{}'", s))
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    RawDate::deserialize(deserializer)?
        .into_datetime()
        .map_err(serde::de::Error::custom)
}

fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDate>::deserialize(deserializer)? {
        Some(raw) => raw.into_datetime().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
