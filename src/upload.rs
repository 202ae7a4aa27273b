//! Multipart fields shared by every attachment of one document.

use chrono::{DateTime, SecondsFormat, Utc};

/// Metadata sent with each `post_document` call for a document.
///
/// Every attachment of a Docspell item becomes its own Paperless document
/// carrying these same fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub title: String,
    /// ISO 8601 UTC instant with millisecond precision.
    pub created: String,
    pub storage_path: i64,
    pub correspondent: Option<i64>,
    pub tags: Vec<i64>,
    pub document_type: Option<i64>,
}

impl DocumentUpload {
    pub fn new(title: impl Into<String>, created: DateTime<Utc>, storage_path: i64) -> Self {
        Self {
            title: title.into(),
            created: format_created(created),
            storage_path,
            correspondent: None,
            tags: Vec::new(),
            document_type: None,
        }
    }

    pub fn set_correspondent(&mut self, id: i64) {
        self.correspondent = Some(id);
    }

    pub fn add_tag(&mut self, id: i64) {
        self.tags.push(id);
    }

    /// Paperless accepts a single document type; a later call replaces an
    /// earlier one.
    pub fn set_document_type(&mut self, id: i64) {
        self.document_type = Some(id);
    }

    /// Form fields in send order. `tags` repeats once per tag.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.clone()),
            ("created", self.created.clone()),
            ("storage_path", self.storage_path.to_string()),
        ];
        if let Some(id) = self.correspondent {
            fields.push(("correspondent", id.to_string()));
        }
        for id in &self.tags {
            fields.push(("tags", id.to_string()));
        }
        if let Some(id) = self.document_type {
            fields.push(("document_type", id.to_string()));
        }
        fields
    }
}

/// Format a timestamp the way Paperless expects `created`:
/// `2021-03-04T00:00:00.000Z`.
pub fn format_created(created: DateTime<Utc>) -> String {
    created.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0).unwrap()
    }

    #[test]
    fn created_is_millisecond_utc() {
        assert_eq!(format_created(created()), "2021-03-04T00:00:00.000Z");
    }

    #[test]
    fn base_fields_only() {
        let upload = DocumentUpload::new("Bill", created(), 5);
        assert_eq!(
            upload.fields(),
            vec![
                ("title", "Bill".to_string()),
                ("created", "2021-03-04T00:00:00.000Z".to_string()),
                ("storage_path", "5".to_string()),
            ]
        );
    }

    #[test]
    fn tags_repeat_and_last_document_type_wins() {
        let mut upload = DocumentUpload::new("Bill", created(), 5);
        upload.set_correspondent(9);
        upload.add_tag(1);
        upload.set_document_type(20);
        upload.add_tag(2);
        upload.set_document_type(21);

        let fields = upload.fields();
        let tags: Vec<_> = fields.iter().filter(|(k, _)| *k == "tags").collect();
        let doc_types: Vec<_> = fields.iter().filter(|(k, _)| *k == "document_type").collect();

        assert_eq!(tags.len(), 2);
        assert_eq!(doc_types, vec![&("document_type", "21".to_string())]);
        assert!(fields.contains(&("correspondent", "9".to_string())));
    }
}
