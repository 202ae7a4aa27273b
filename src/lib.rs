//! # docspell-migrate
//!
//! Moves a Docspell export into Paperless-ngx.
//!
//! A Docspell export is a directory tree with one `metadata.json` per
//! document and the document's files in a sibling `files/` folder. Each
//! pending descriptor is uploaded through the Paperless REST API (one
//! Paperless document per attachment, sharing title, date, storage path,
//! correspondent, tags and document type) and then renamed to
//! `metadata.json.done`, so interrupted runs resume where they stopped.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Walker  │──▶│ Descriptor │──▶│   Migrator   │──▶│  Paperless  │
//! │ (walkdir)│   │   Loader   │   │ + EntityCache│   │  REST API   │
//! └──────────┘   └────────────┘   └──────┬───────┘   └─────────────┘
//!                                        ▼
//!                              metadata.json → .done
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export PAPERLESS_HOST=localhost PAPERLESS_PORT=8000
//! export PAPERLESS_API_TOKEN=... PAPERLESS_STORAGE_PATH_ID=1
//! export DOCSPELL_CATEGORY_NAME=Category DOCSPELL_DOCUMENT_TYPE_NAME="Document Type"
//! dsmig count            # pending vs. imported
//! dsmig migrate          # upload everything pending
//! dsmig undo             # mark everything pending again
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`error`] | Error types |
//! | [`walker`] | Recursive file discovery |
//! | [`state`] | Pending / done marker renames |
//! | [`docspell`] | Descriptor parsing and attachment files |
//! | [`paperless`] | Paperless API models, trait and HTTP client |
//! | [`entities`] | Correspondent / tag / document type reconciliation |
//! | [`upload`] | Per-document upload fields |
//! | [`migrate`] | Migration driver |
//! | [`count`] | Pending / done counter |
//! | [`undo`] | Done → pending replay |
//! | [`progress`] | Progress reporting |

pub mod config;
pub mod count;
pub mod docspell;
pub mod entities;
pub mod error;
pub mod migrate;
pub mod paperless;
pub mod progress;
pub mod state;
pub mod undo;
pub mod upload;
pub mod walker;

#[cfg(test)]
mod testing;

pub use error::{MigrateError, Result};
