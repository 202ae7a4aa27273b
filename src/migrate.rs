//! Migration driver.
//!
//! Walks the input folder for pending descriptors and, one document at a
//! time, uploads every attachment to Paperless before renaming the
//! descriptor to its done form.
//!
//! ```text
//! Pending ──(no attachments)──▶ Skipped      descriptor left as is
//! Pending ──▶ Uploading ──▶ Done             descriptor renamed *.done
//!               └──────────▶ Failed          run aborted, descriptor left pending
//! ```
//!
//! Any error stops the whole run. Documents finished before the failure stay
//! done; the failing one is retried from its first attachment next time,
//! which re-uploads attachments that already went through.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::docspell::{self, Metadata};
use crate::entities::{EntityCache, TagCategories, TagRole};
use crate::error::{MigrateError, Result};
use crate::paperless::PaperlessApi;
use crate::progress::{MigrationProgressEvent, MigrationProgressReporter};
use crate::state::{self, METADATA_FILE_NAME};
use crate::upload::DocumentUpload;
use crate::walker;

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Process at most this many pending descriptors.
    pub limit: Option<usize>,
    /// Parse descriptors and check attachments without contacting Paperless.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Pending descriptors queued for this run.
    pub total: usize,
    pub migrated: usize,
    pub skipped: usize,
    /// Dry run only: descriptors whose attachments are all present.
    pub checked: usize,
    pub attachments_uploaded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    Skipped,
    Migrated { attachments: usize },
}

/// All pending descriptors below `root`, in walk order.
pub fn pending_descriptors(root: &Path) -> Result<Vec<PathBuf>> {
    walker::collect_named(root, METADATA_FILE_NAME)
}

/// Run one migration pass over `config.input_folder`.
pub async fn run_migration<A: PaperlessApi + ?Sized>(
    api: &A,
    config: &Config,
    options: &MigrateOptions,
    progress: &dyn MigrationProgressReporter,
) -> Result<MigrationSummary> {
    if options.dry_run {
        return run_dry_run(&config.input_folder, options.limit, progress);
    }

    let paths = queued_descriptors(&config.input_folder, options.limit)?;
    let total = paths.len() as u64;
    progress.report(MigrationProgressEvent::Discovered { total });

    let mut migrator = Migrator::connect(
        api,
        TagCategories::from(&config.docspell),
        config.paperless.storage_path_id,
    )
    .await?;

    let mut summary = MigrationSummary {
        total: paths.len(),
        ..Default::default()
    };

    for (i, path) in paths.iter().enumerate() {
        let n = i as u64 + 1;
        let metadata = match docspell::load_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                report_failure(progress, n, total, &path.display().to_string(), &e);
                return Err(e);
            }
        };

        match migrator
            .migrate_document(path, &metadata, n, total, progress)
            .await
        {
            Ok(DocumentOutcome::Skipped) => summary.skipped += 1,
            Ok(DocumentOutcome::Migrated { attachments }) => {
                summary.migrated += 1;
                summary.attachments_uploaded += attachments;
            }
            Err(e) => {
                report_failure(progress, n, total, &metadata.name, &e);
                return Err(e);
            }
        }
    }

    info!(
        migrated = summary.migrated,
        skipped = summary.skipped,
        attachments = summary.attachments_uploaded,
        "migration finished"
    );
    Ok(summary)
}

fn report_failure(
    progress: &dyn MigrationProgressReporter,
    n: u64,
    total: u64,
    name: &str,
    err: &MigrateError,
) {
    error!(document = name, error = %err, "aborting migration");
    progress.report(MigrationProgressEvent::Failed {
        n,
        total,
        name: name.to_string(),
        error: err.to_string(),
    });
}

/// Parse every queued descriptor and check its attachments exist, without
/// any Paperless settings or network access.
pub fn run_dry_run(
    input_folder: &Path,
    limit: Option<usize>,
    progress: &dyn MigrationProgressReporter,
) -> Result<MigrationSummary> {
    let paths = queued_descriptors(input_folder, limit)?;
    progress.report(MigrationProgressEvent::Discovered {
        total: paths.len() as u64,
    });
    check_descriptors(&paths, progress)
}

fn queued_descriptors(root: &Path, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut paths = pending_descriptors(root)?;
    if let Some(limit) = limit {
        paths.truncate(limit);
    }
    Ok(paths)
}

/// Every descriptor must parse and every attachment must exist.
fn check_descriptors(
    paths: &[PathBuf],
    progress: &dyn MigrationProgressReporter,
) -> Result<MigrationSummary> {
    let total = paths.len() as u64;
    let mut summary = MigrationSummary {
        total: paths.len(),
        ..Default::default()
    };

    for (i, path) in paths.iter().enumerate() {
        let n = i as u64 + 1;
        let metadata = docspell::load_metadata(path)?;
        if metadata.attachments.is_empty() {
            progress.report(MigrationProgressEvent::Skipped {
                n,
                total,
                name: metadata.name,
            });
            summary.skipped += 1;
            continue;
        }

        for attachment_path in docspell::attachment_paths(&metadata, path) {
            if !attachment_path.is_file() {
                return Err(MigrateError::AttachmentNotFound {
                    path: attachment_path,
                });
            }
        }

        progress.report(MigrationProgressEvent::Checked {
            n,
            total,
            name: metadata.name,
            attachments: metadata.attachments.len() as u64,
        });
        summary.checked += 1;
    }

    Ok(summary)
}

/// Uploads documents and reconciles their reference entities.
pub struct Migrator<'a, A: PaperlessApi + ?Sized> {
    api: &'a A,
    cache: EntityCache,
    categories: TagCategories,
    storage_path_id: i64,
}

impl<'a, A: PaperlessApi + ?Sized> Migrator<'a, A> {
    /// Snapshot the target's tags and document types, then build a migrator.
    pub async fn connect(
        api: &'a A,
        categories: TagCategories,
        storage_path_id: i64,
    ) -> Result<Self> {
        let cache = EntityCache::load(api).await?;
        Ok(Self::with_cache(api, cache, categories, storage_path_id))
    }

    pub fn with_cache(
        api: &'a A,
        cache: EntityCache,
        categories: TagCategories,
        storage_path_id: i64,
    ) -> Self {
        Self {
            api,
            cache,
            categories,
            storage_path_id,
        }
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// Resolve the correspondent and tags of `metadata` into upload fields.
    /// Missing entities are created on the target.
    pub async fn build_upload(&mut self, metadata: &Metadata) -> Result<DocumentUpload> {
        let mut upload = DocumentUpload::new(&metadata.name, metadata.date, self.storage_path_id);

        if let Some(org) = &metadata.corr_org {
            let id = self
                .cache
                .resolve_correspondent_id(self.api, &org.name)
                .await?;
            upload.set_correspondent(id);
        }

        for tag in &metadata.tags {
            match self.categories.classify(tag) {
                TagRole::DocumentType => {
                    let id = self
                        .cache
                        .resolve_document_type_id(self.api, &tag.name)
                        .await?;
                    upload.set_document_type(id);
                }
                TagRole::Tag => {
                    let id = self.cache.resolve_tag_id(self.api, &tag.name).await?;
                    upload.add_tag(id);
                }
                TagRole::Ignored => {
                    debug!(tag = %tag.name, category = ?tag.category, "tag not migrated");
                }
            }
        }

        Ok(upload)
    }

    /// Migrate one pending descriptor. `n` and `total` only feed progress.
    pub async fn migrate_document(
        &mut self,
        path: &Path,
        metadata: &Metadata,
        n: u64,
        total: u64,
        progress: &dyn MigrationProgressReporter,
    ) -> Result<DocumentOutcome> {
        if metadata.attachments.is_empty() {
            warn!(document = %metadata.name, path = %path.display(), "no attachments, skipping");
            progress.report(MigrationProgressEvent::Skipped {
                n,
                total,
                name: metadata.name.clone(),
            });
            return Ok(DocumentOutcome::Skipped);
        }

        let files = docspell::read_attachments(metadata, path)?;
        let attachments = files.len();
        progress.report(MigrationProgressEvent::Found {
            n,
            total,
            name: metadata.name.clone(),
            attachments: attachments as u64,
        });

        let upload = self.build_upload(metadata).await?;
        for file in files {
            debug!(document = %metadata.name, file = %file.file_name, "uploading attachment");
            self.api.post_document(&upload, file).await?;
        }
        progress.report(MigrationProgressEvent::Uploaded {
            n,
            total,
            name: metadata.name.clone(),
        });

        state::mark_done(path)?;
        progress.report(MigrationProgressEvent::marked_done(n, total, path));

        Ok(DocumentOutcome::Migrated { attachments })
    }
}
