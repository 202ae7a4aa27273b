//! In-memory [`PaperlessApi`] for unit tests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Mutex;

use crate::docspell::{self, AttachmentFile};
use crate::error::{MigrateError, Result};
use crate::paperless::{Correspondent, DocumentType, PaperlessApi, Tag};
use crate::upload::DocumentUpload;

#[derive(Clone, Debug, Default)]
pub struct Calls {
    pub correspondent_lookups: usize,
    pub correspondents_created: usize,
    pub tags_created: usize,
    pub document_types_created: usize,
    pub uploads_attempted: usize,
}

#[derive(Clone, Debug)]
pub struct RecordedUpload {
    pub upload: DocumentUpload,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct FakeState {
    tags: Vec<Tag>,
    document_types: Vec<DocumentType>,
    correspondents: Vec<Correspondent>,
    next_id: i64,
    calls: Calls,
    uploads: Vec<RecordedUpload>,
    fail_creations: Option<StatusCode>,
    /// 1-based `post_document` call that fails.
    fail_upload_at: Option<(usize, StatusCode)>,
}

impl FakeState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        100 + self.next_id
    }
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            match_text: String::new(),
            matching_algorithm: 6,
            is_insensitive: true,
            is_inbox_tag: false,
            document_count: 0,
        }
    }

    pub fn document_type(id: i64, name: &str) -> DocumentType {
        DocumentType {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            match_text: String::new(),
            matching_algorithm: 6,
            is_insensitive: true,
            document_count: 0,
        }
    }

    pub fn correspondent(id: i64, name: &str) -> Correspondent {
        Correspondent {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            match_text: String::new(),
            matching_algorithm: 6,
            is_insensitive: true,
            document_count: 0,
        }
    }

    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        self.state.lock().unwrap().tags = tags;
        self
    }

    pub fn with_document_types(self, document_types: Vec<DocumentType>) -> Self {
        self.state.lock().unwrap().document_types = document_types;
        self
    }

    pub fn with_correspondents(self, correspondents: Vec<Correspondent>) -> Self {
        self.state.lock().unwrap().correspondents = correspondents;
        self
    }

    pub fn fail_creations(self, status: StatusCode) -> Self {
        self.state.lock().unwrap().fail_creations = Some(status);
        self
    }

    pub fn fail_upload_at(self, call: usize, status: StatusCode) -> Self {
        self.state.lock().unwrap().fail_upload_at = Some((call, status));
        self
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.lock().unwrap().uploads.clone()
    }
}

#[async_trait]
impl PaperlessApi for FakeApi {
    async fn list_tags(&self) -> Result<Vec<Tag>> {
        Ok(self.state.lock().unwrap().tags.clone())
    }

    async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
        Ok(self.state.lock().unwrap().document_types.clone())
    }

    async fn find_correspondents(&self, name: &str) -> Result<Vec<Correspondent>> {
        let mut state = self.state.lock().unwrap();
        state.calls.correspondent_lookups += 1;
        let wanted = name.to_lowercase();
        Ok(state
            .correspondents
            .iter()
            .filter(|c| c.name.to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    async fn create_correspondent(&self, name: &str) -> Result<Correspondent> {
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.fail_creations {
            return Err(MigrateError::Upload {
                action: "Failed to create correspondent".into(),
                status,
            });
        }
        state.calls.correspondents_created += 1;
        let created = FakeApi::correspondent(state.allocate_id(), name);
        state.correspondents.push(created.clone());
        Ok(created)
    }

    async fn create_tag(&self, name: &str) -> Result<Tag> {
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.fail_creations {
            return Err(MigrateError::Upload {
                action: "Failed to create tag".into(),
                status,
            });
        }
        state.calls.tags_created += 1;
        let created = FakeApi::tag(state.allocate_id(), name);
        state.tags.push(created.clone());
        Ok(created)
    }

    async fn create_document_type(&self, name: &str) -> Result<DocumentType> {
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.fail_creations {
            return Err(MigrateError::Upload {
                action: "Failed to create document type".into(),
                status,
            });
        }
        state.calls.document_types_created += 1;
        let created = FakeApi::document_type(state.allocate_id(), name);
        state.document_types.push(created.clone());
        Ok(created)
    }

    async fn post_document(
        &self,
        upload: &DocumentUpload,
        document: AttachmentFile,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.uploads_attempted += 1;
        if let Some((call, status)) = state.fail_upload_at {
            if call == state.calls.uploads_attempted {
                return Err(MigrateError::Upload {
                    action: "Failed to upload document".into(),
                    status,
                });
            }
        }
        state.uploads.push(RecordedUpload {
            upload: upload.clone(),
            file_name: document.file_name,
            bytes: document.bytes,
        });
        Ok(())
    }
}

pub fn docspell_tag(name: &str, category: Option<&str>) -> docspell::Tag {
    docspell::Tag {
        id: format!("id-{}", name),
        name: name.to_string(),
        category: category.map(str::to_string),
    }
}

/// Collects human progress lines for assertions.
#[derive(Default)]
pub struct RecordingProgress {
    lines: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl crate::progress::MigrationProgressReporter for RecordingProgress {
    fn report(&self, event: crate::progress::MigrationProgressEvent) {
        self.lines.lock().unwrap().push(event.human_line());
    }
}
