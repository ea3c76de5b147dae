//! File organization module for Arquivista.
//!
//! This module provides:
//! - Extension to category classification
//! - Path containment checks for user-supplied paths
//! - Upload filename sanitization
//! - Per-account storage: listing, upload and delete

mod category;
mod guard;
mod sanitize;
mod storage;

pub use category::Classifier;
pub use guard::{resolve_strictly_within_root, resolve_within_root};
pub use sanitize::secure_filename;
pub use storage::{
    AccountFiles, DeleteOutcome, FileStore, Listing, StorageStats, StoredFileEntry, UploadEntry,
    UploadFailure, UploadReport, CATEGORY_SEPARATOR, ROOT_CATEGORY,
};
