//! Reference entity reconciliation.
//!
//! Docspell references correspondents and tags by name; Paperless wants ids.
//! [`EntityCache`] maps one to the other, creating missing entities on the
//! target. Names match exactly but ignore case.
//!
//! Tags and document types are listed once per run and kept in memory;
//! entities created during the run are appended so each missing name is
//! created once. Correspondents are looked up live on first sight and the
//! resulting id is remembered.

use std::collections::HashMap;
use tracing::info;

use crate::config::DocspellConfig;
use crate::docspell;
use crate::error::Result;
use crate::paperless::{DocumentType, NamedEntity, PaperlessApi, Tag};

/// Id of the first entity whose name equals `name`, ignoring case.
pub fn find_id<E: NamedEntity>(entities: &[E], name: &str) -> Option<i64> {
    let wanted = name.to_lowercase();
    entities
        .iter()
        .find(|e| e.name().to_lowercase() == wanted)
        .map(|e| e.id())
}

/// What a Docspell tag becomes on the Paperless side.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagRole {
    DocumentType,
    Tag,
    /// Category not migrated.
    Ignored,
}

/// The two Docspell tag categories that are migrated.
#[derive(Clone, Debug)]
pub struct TagCategories {
    pub document_type: String,
    pub tag: String,
}

impl TagCategories {
    pub fn new(document_type: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            tag: tag.into(),
        }
    }

    pub fn classify(&self, tag: &docspell::Tag) -> TagRole {
        match tag.category.as_deref() {
            Some(c) if c == self.document_type => TagRole::DocumentType,
            Some(c) if c == self.tag => TagRole::Tag,
            _ => TagRole::Ignored,
        }
    }
}

impl From<&DocspellConfig> for TagCategories {
    fn from(config: &DocspellConfig) -> Self {
        Self::new(&config.document_type_name, &config.category_name)
    }
}

/// In-memory view of the target's correspondents, tags and document types.
#[derive(Debug, Default)]
pub struct EntityCache {
    tags: Vec<Tag>,
    document_types: Vec<DocumentType>,
    correspondents: HashMap<String, i64>,
}

impl EntityCache {
    pub fn new(tags: Vec<Tag>, document_types: Vec<DocumentType>) -> Self {
        Self {
            tags,
            document_types,
            correspondents: HashMap::new(),
        }
    }

    /// Snapshot the current tags and document types.
    pub async fn load<A: PaperlessApi + ?Sized>(api: &A) -> Result<Self> {
        let document_types = api.list_document_types().await?;
        let tags = api.list_tags().await?;
        info!(
            tags = tags.len(),
            document_types = document_types.len(),
            "loaded paperless entities"
        );
        Ok(Self::new(tags, document_types))
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn document_types(&self) -> &[DocumentType] {
        &self.document_types
    }

    pub async fn resolve_correspondent_id<A: PaperlessApi + ?Sized>(
        &mut self,
        api: &A,
        name: &str,
    ) -> Result<i64> {
        let key = name.to_lowercase();
        if let Some(id) = self.correspondents.get(&key) {
            return Ok(*id);
        }

        let id = match api.find_correspondents(name).await?.first() {
            Some(existing) => existing.id,
            None => {
                let created = api.create_correspondent(name).await?;
                info!(id = created.id, entity = name, "created correspondent");
                created.id
            }
        };

        self.correspondents.insert(key, id);
        Ok(id)
    }

    pub async fn resolve_tag_id<A: PaperlessApi + ?Sized>(
        &mut self,
        api: &A,
        name: &str,
    ) -> Result<i64> {
        if let Some(id) = find_id(&self.tags, name) {
            return Ok(id);
        }
        let created = api.create_tag(name).await?;
        info!(id = created.id, entity = name, "created tag");
        let id = created.id;
        self.tags.push(created);
        Ok(id)
    }

    pub async fn resolve_document_type_id<A: PaperlessApi + ?Sized>(
        &mut self,
        api: &A,
        name: &str,
    ) -> Result<i64> {
        if let Some(id) = find_id(&self.document_types, name) {
            return Ok(id);
        }
        let created = api.create_document_type(name).await?;
        info!(id = created.id, entity = name, "created document type");
        let id = created.id;
        self.document_types.push(created);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::testing::{docspell_tag, FakeApi};
    use reqwest::StatusCode;

    #[test]
    fn find_id_ignores_case() {
        let tags = vec![FakeApi::tag(3, "Invoice"), FakeApi::tag(4, "Tax")];
        assert_eq!(find_id(&tags, "invoice"), Some(3));
        assert_eq!(find_id(&tags, "TAX"), Some(4));
        assert_eq!(find_id(&tags, "Taxes"), None);
    }

    #[test]
    fn classification_follows_configured_categories() {
        let categories = TagCategories::new("Doctype", "Category");
        assert_eq!(
            categories.classify(&docspell_tag("Invoice", Some("Doctype"))),
            TagRole::DocumentType
        );
        assert_eq!(
            categories.classify(&docspell_tag("Home", Some("Category"))),
            TagRole::Tag
        );
        assert_eq!(
            categories.classify(&docspell_tag("Blue", Some("Colour"))),
            TagRole::Ignored
        );
        assert_eq!(
            categories.classify(&docspell_tag("Loose", None)),
            TagRole::Ignored
        );
    }

    #[tokio::test]
    async fn load_snapshots_tags_and_document_types() {
        let api = FakeApi::default()
            .with_tags(vec![FakeApi::tag(1, "Home")])
            .with_document_types(vec![FakeApi::document_type(2, "Invoice")]);

        let cache = EntityCache::load(&api).await.unwrap();
        assert_eq!(cache.tags().len(), 1);
        assert_eq!(cache.document_types().len(), 1);
    }

    #[tokio::test]
    async fn missing_tag_is_created_once() {
        let api = FakeApi::default();
        let mut cache = EntityCache::load(&api).await.unwrap();

        let first = cache.resolve_tag_id(&api, "Garden").await.unwrap();
        let second = cache.resolve_tag_id(&api, "garden").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.calls().tags_created, 1);
    }

    #[tokio::test]
    async fn cached_document_type_is_reused_regardless_of_case() {
        let api = FakeApi::default().with_document_types(vec![FakeApi::document_type(7, "Invoice")]);
        let mut cache = EntityCache::load(&api).await.unwrap();

        assert_eq!(cache.resolve_document_type_id(&api, "INVOICE").await.unwrap(), 7);
        assert_eq!(cache.resolve_document_type_id(&api, "invoice").await.unwrap(), 7);
        assert_eq!(api.calls().document_types_created, 0);
    }

    #[tokio::test]
    async fn new_correspondent_is_created_once() {
        let api = FakeApi::default();
        let mut cache = EntityCache::default();

        let id = cache.resolve_correspondent_id(&api, "ACME Corp").await.unwrap();
        let again = cache.resolve_correspondent_id(&api, "acme corp").await.unwrap();

        assert_eq!(id, again);
        let calls = api.calls();
        assert_eq!(calls.correspondents_created, 1);
        assert_eq!(calls.correspondent_lookups, 1);
    }

    #[tokio::test]
    async fn existing_correspondent_returns_first_match() {
        let api = FakeApi::default().with_correspondents(vec![
            FakeApi::correspondent(11, "acme"),
            FakeApi::correspondent(12, "ACME"),
        ]);
        let mut cache = EntityCache::default();

        assert_eq!(cache.resolve_correspondent_id(&api, "Acme").await.unwrap(), 11);
        assert_eq!(api.calls().correspondents_created, 0);
    }

    #[tokio::test]
    async fn failed_creation_surfaces_status() {
        let api = FakeApi::default().fail_creations(StatusCode::BAD_REQUEST);
        let mut cache = EntityCache::default();

        let err = cache.resolve_tag_id(&api, "Garden").await.unwrap_err();
        match err {
            MigrateError::Upload { status, .. } => assert_eq!(status, StatusCode::BAD_REQUEST),
            other => panic!("expected upload error, got {other:?}"),
        }
    }
}
