//! Configuration loading.
//!
//! Settings come from an optional TOML file and are overridden by
//! environment variables (a `.env` file is loaded into the environment by the
//! binary before this runs). The input folder has a default; every Paperless
//! and Docspell setting is required.
//!
//! ```toml
//! input_folder = "./input"
//!
//! [paperless]
//! host = "localhost"
//! port = 8000
//! protocol = "http"
//! api_token = "0123456789abcdef"
//! storage_path_id = 1
//!
//! [docspell]
//! category_name = "Category"
//! document_type_name = "Document Type"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};

pub const DEFAULT_INPUT_FOLDER: &str = "./input";
pub const DEFAULT_PROTOCOL: &str = "http";

pub const ENV_INPUT_FOLDER: &str = "INPUT_FOLDER";
pub const ENV_PAPERLESS_HOST: &str = "PAPERLESS_HOST";
pub const ENV_PAPERLESS_PORT: &str = "PAPERLESS_PORT";
pub const ENV_PAPERLESS_PROTOCOL: &str = "PAPERLESS_PROTOCOL";
pub const ENV_PAPERLESS_API_TOKEN: &str = "PAPERLESS_API_TOKEN";
pub const ENV_PAPERLESS_STORAGE_PATH_ID: &str = "PAPERLESS_STORAGE_PATH_ID";
pub const ENV_DOCSPELL_CATEGORY_NAME: &str = "DOCSPELL_CATEGORY_NAME";
pub const ENV_DOCSPELL_DOCUMENT_TYPE_NAME: &str = "DOCSPELL_DOCUMENT_TYPE_NAME";

#[derive(Debug, Clone)]
pub struct Config {
    pub input_folder: PathBuf,
    pub paperless: PaperlessConfig,
    pub docspell: DocspellConfig,
}

#[derive(Debug, Clone)]
pub struct PaperlessConfig {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub api_token: String,
    /// Storage path every migrated document is filed under.
    pub storage_path_id: i64,
}

impl PaperlessConfig {
    /// Base URL of the REST API, e.g. `http://localhost:8000/api`.
    pub fn api_url(&self) -> String {
        format!("{}://{}:{}/api", self.protocol, self.host, self.port)
    }
}

/// Docspell tag categories that carry meaning on the Paperless side.
#[derive(Debug, Clone)]
pub struct DocspellConfig {
    /// Tags in this category become Paperless tags.
    pub category_name: String,
    /// Tags in this category become the Paperless document type.
    pub document_type_name: String,
}

/// Raw contents of the TOML file. Every field is optional so the
/// environment can fill the gaps.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FileConfig {
    pub input_folder: Option<PathBuf>,
    #[serde(default)]
    pub paperless: PaperlessFileConfig,
    #[serde(default)]
    pub docspell: DocspellFileConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PaperlessFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    pub api_token: Option<String>,
    pub storage_path_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DocspellFileConfig {
    pub category_name: Option<String>,
    pub document_type_name: Option<String>,
}

pub fn read_config_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MigrateError::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        MigrateError::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Load the full configuration from an optional file plus the process
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    load_config_with(path, env_lookup)
}

/// Load only the input folder. Used by `count` and `undo`, which never talk
/// to Paperless.
pub fn load_input_folder(path: Option<&Path>) -> Result<PathBuf> {
    load_input_folder_with(path, env_lookup)
}

pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(p) => read_config_file(p)?,
        None => FileConfig::default(),
    };

    let input_folder = resolve_input_folder(&file, &lookup);

    let host = lookup(ENV_PAPERLESS_HOST)
        .or(file.paperless.host)
        .ok_or_else(|| not_set(ENV_PAPERLESS_HOST))?;

    let port = match lookup(ENV_PAPERLESS_PORT) {
        Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
            MigrateError::Config(format!(
                "{} must be a port number, got '{}'",
                ENV_PAPERLESS_PORT, raw
            ))
        })?,
        None => file
            .paperless
            .port
            .ok_or_else(|| not_set(ENV_PAPERLESS_PORT))?,
    };

    let protocol = lookup(ENV_PAPERLESS_PROTOCOL)
        .or(file.paperless.protocol)
        .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());
    match protocol.as_str() {
        "http" | "https" => {}
        other => {
            return Err(MigrateError::Config(format!(
                "{} must be http or https, got '{}'",
                ENV_PAPERLESS_PROTOCOL, other
            )))
        }
    }

    let api_token = lookup(ENV_PAPERLESS_API_TOKEN)
        .or(file.paperless.api_token)
        .ok_or_else(|| not_set(ENV_PAPERLESS_API_TOKEN))?;

    let storage_path_id = match lookup(ENV_PAPERLESS_STORAGE_PATH_ID) {
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            MigrateError::Config(format!(
                "{} must be a numeric id, got '{}'",
                ENV_PAPERLESS_STORAGE_PATH_ID, raw
            ))
        })?,
        None => file
            .paperless
            .storage_path_id
            .ok_or_else(|| not_set(ENV_PAPERLESS_STORAGE_PATH_ID))?,
    };

    let category_name = lookup(ENV_DOCSPELL_CATEGORY_NAME)
        .or(file.docspell.category_name)
        .ok_or_else(|| not_set(ENV_DOCSPELL_CATEGORY_NAME))?;

    let document_type_name = lookup(ENV_DOCSPELL_DOCUMENT_TYPE_NAME)
        .or(file.docspell.document_type_name)
        .ok_or_else(|| not_set(ENV_DOCSPELL_DOCUMENT_TYPE_NAME))?;

    Ok(Config {
        input_folder,
        paperless: PaperlessConfig {
            host,
            port,
            protocol,
            api_token,
            storage_path_id,
        },
        docspell: DocspellConfig {
            category_name,
            document_type_name,
        },
    })
}

pub fn load_input_folder_with<F>(path: Option<&Path>, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(p) => read_config_file(p)?,
        None => FileConfig::default(),
    };
    Ok(resolve_input_folder(&file, &lookup))
}

fn resolve_input_folder<F>(file: &FileConfig, lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_INPUT_FOLDER)
        .map(PathBuf::from)
        .or_else(|| file.input_folder.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FOLDER))
}

/// Reads a variable from the process environment, treating an empty value
/// as unset.
fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn not_set(var: &str) -> MigrateError {
    MigrateError::Config(format!("{} is not set", var))
}
