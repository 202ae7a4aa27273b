//! Paperless-ngx REST API.
//!
//! Defines the target-side entity models, the [`PaperlessApi`] trait the
//! migration driver talks through, and [`PaperlessClient`], the reqwest
//! implementation.
//!
//! # Endpoints
//!
//! | Method | Path | Use |
//! |--------|------|-----|
//! | `GET`  | `/api/correspondents/?name__iexact=` | look up one correspondent |
//! | `POST` | `/api/correspondents/` | create a correspondent |
//! | `GET`  | `/api/tags/` | list tags (paginated) |
//! | `POST` | `/api/tags/` | create a tag |
//! | `GET`  | `/api/document_types/` | list document types (paginated) |
//! | `POST` | `/api/document_types/` | create a document type |
//! | `POST` | `/api/documents/post_document/` | upload one file (multipart) |
//!
//! All requests carry `Authorization: Token <token>`. Requests have no
//! timeout and are never retried.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PaperlessConfig;
use crate::docspell::AttachmentFile;
use crate::error::{MigrateError, Result};
use crate::upload::DocumentUpload;

/// `matching_algorithm` value for "Automatic" in Paperless-ngx.
pub const MATCHING_ALGORITHM_AUTO: u8 = 6;

/// One page of a list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Correspondent {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, rename = "match")]
    pub match_text: String,
    #[serde(default)]
    pub matching_algorithm: u8,
    #[serde(default)]
    pub is_insensitive: bool,
    #[serde(default)]
    pub document_count: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, rename = "match")]
    pub match_text: String,
    #[serde(default)]
    pub matching_algorithm: u8,
    #[serde(default)]
    pub is_insensitive: bool,
    #[serde(default)]
    pub is_inbox_tag: bool,
    #[serde(default)]
    pub document_count: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, rename = "match")]
    pub match_text: String,
    #[serde(default)]
    pub matching_algorithm: u8,
    #[serde(default)]
    pub is_insensitive: bool,
    #[serde(default)]
    pub document_count: u64,
}

/// A target entity addressed by id and matched by name.
pub trait NamedEntity {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

macro_rules! impl_named_entity {
    ($($ty:ty),*) => {
        $(impl NamedEntity for $ty {
            fn id(&self) -> i64 {
                self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_named_entity!(Correspondent, Tag, DocumentType);

/// Body of every create call.
#[derive(Debug, Clone, Serialize)]
pub struct NewEntity<'a> {
    pub name: &'a str,
    pub matching_algorithm: u8,
}

impl<'a> NewEntity<'a> {
    pub fn named(name: &'a str) -> Self {
        Self {
            name,
            matching_algorithm: MATCHING_ALGORITHM_AUTO,
        }
    }
}

/// Operations the migration needs from Paperless.
///
/// Implemented by [`PaperlessClient`] for real runs; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait PaperlessApi: Send + Sync {
    /// All existing tags, across every page.
    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// All existing document types, across every page.
    async fn list_document_types(&self) -> Result<Vec<DocumentType>>;

    /// Correspondents whose name equals `name`, ignoring case.
    async fn find_correspondents(&self, name: &str) -> Result<Vec<Correspondent>>;

    async fn create_correspondent(&self, name: &str) -> Result<Correspondent>;

    async fn create_tag(&self, name: &str) -> Result<Tag>;

    async fn create_document_type(&self, name: &str) -> Result<DocumentType>;

    /// Upload one file with the shared document fields.
    async fn post_document(&self, upload: &DocumentUpload, document: AttachmentFile)
        -> Result<()>;
}

/// HTTP client for a Paperless-ngx instance.
pub struct PaperlessClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PaperlessClient {
    pub fn new(config: &PaperlessConfig) -> Result<Self> {
        Self::with_base_url(config.api_url(), &config.api_token)
    }

    /// Build a client against an explicit API base URL
    /// (e.g. `http://127.0.0.1:8000/api`).
    pub fn with_base_url(base_url: impl Into<String>, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Fetch every page of a list endpoint by following `next` links.
    async fn list_all<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(self.url(path));

        while let Some(url) = next {
            debug!(%url, "GET");
            let response = self
                .http
                .get(&url)
                .header("Authorization", self.auth_header())
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(MigrateError::upload(format!("Failed to list {}", what), status));
            }

            let page: Page<T> = response.json().await?;
            items.extend(page.results);
            next = page.next;
        }

        Ok(items)
    }

    async fn create<T: DeserializeOwned>(&self, path: &str, what: &str, name: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, entity = name, "POST");
        let response = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&NewEntity::named(name))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::upload(format!("Failed to create {}", what), status));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaperlessApi for PaperlessClient {
    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.list_all("tags/", "tags").await
    }

    async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
        self.list_all("document_types/", "document types").await
    }

    async fn find_correspondents(&self, name: &str) -> Result<Vec<Correspondent>> {
        let url = self.url("correspondents/");
        debug!(%url, entity = name, "GET");
        let response = self
            .http
            .get(&url)
            .query(&[("name__iexact", name)])
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::upload("Failed to look up correspondent", status));
        }

        let page: Page<Correspondent> = response.json().await?;
        Ok(page.results)
    }

    async fn create_correspondent(&self, name: &str) -> Result<Correspondent> {
        self.create("correspondents/", "correspondent", name).await
    }

    async fn create_tag(&self, name: &str) -> Result<Tag> {
        self.create("tags/", "tag", name).await
    }

    async fn create_document_type(&self, name: &str) -> Result<DocumentType> {
        self.create("document_types/", "document type", name).await
    }

    async fn post_document(
        &self,
        upload: &DocumentUpload,
        document: AttachmentFile,
    ) -> Result<()> {
        let url = self.url("documents/post_document/");
        debug!(%url, file = %document.file_name, "POST");

        let mut form = Form::new();
        for (field, value) in upload.fields() {
            form = form.text(field, value);
        }
        let part = Part::bytes(document.bytes)
            .file_name(document.file_name)
            .mime_str("application/octet-stream")?;
        form = form.part("document", part);

        let response = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::upload("Failed to upload document", status));
        }
        Ok(())
    }
}
