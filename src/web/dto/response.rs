//! Response DTOs for the Web API.

use serde::Serialize;

use crate::file::{Listing, StorageStats, StoredFileEntry, UploadReport};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Auth DTOs
// ============================================================================

/// Account information in responses.
#[derive(Debug, Serialize)]
pub struct AccountInfo {
    /// Account ID.
    pub id: i64,
    /// Username.
    pub username: String,
}

/// Response to a successful login or registration.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session token; also set as the session cookie.
    pub token: String,
    /// The logged-in account.
    pub account: AccountInfo,
}

// ============================================================================
// File DTOs
// ============================================================================

/// One stored file.
#[derive(Debug, Serialize)]
pub struct FileEntryResponse {
    /// File name.
    pub name: String,
    /// Path relative to the account root; pass it to `/delete/{path}`.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

impl From<StoredFileEntry> for FileEntryResponse {
    fn from(entry: StoredFileEntry) -> Self {
        Self {
            name: entry.name,
            path: entry.path,
            size: entry.size,
        }
    }
}

/// One category folder and its files.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Display name, e.g. `imagens / png`.
    pub name: String,
    /// Files sorted by name.
    pub files: Vec<FileEntryResponse>,
}

/// Listing of the caller's files.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    /// Non-empty categories, sorted by name.
    pub categories: Vec<CategoryResponse>,
    /// Number of files.
    pub total_files: usize,
    /// Total size in bytes.
    pub total_bytes: u64,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        let stats = StorageStats::from_listing(&listing);
        let categories = listing
            .into_iter()
            .map(|(name, files)| CategoryResponse {
                name,
                files: files.into_iter().map(FileEntryResponse::from).collect(),
            })
            .collect();

        Self {
            categories,
            total_files: stats.files,
            total_bytes: stats.bytes,
        }
    }
}

/// Outcome of an upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Number of files saved.
    pub accepted: usize,
    /// Original names of refused files.
    pub rejected: Vec<String>,
    /// Saved paths relative to the account root.
    pub saved: Vec<String>,
    /// Original names of allowed files that could not be written.
    pub failed: Vec<String>,
    /// Human-readable summary lines.
    pub messages: Vec<String>,
}

impl From<UploadReport> for UploadResponse {
    fn from(report: UploadReport) -> Self {
        let mut messages: Vec<String> = report
            .rejected
            .iter()
            .map(|name| format!("File \"{name}\" ignored (type not allowed)."))
            .collect();
        messages.extend(
            report
                .failed
                .iter()
                .map(|f| format!("File \"{}\" could not be saved: {}", f.filename, f.message)),
        );
        if report.accepted > 0 {
            messages.push(format!(
                "{} file(s) organized successfully.",
                report.accepted
            ));
        }

        Self {
            accepted: report.accepted,
            rejected: report.rejected,
            saved: report.saved,
            failed: report.failed.into_iter().map(|f| f.filename).collect(),
            messages,
        }
    }
}

/// Outcome of a delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// The path that was removed.
    pub deleted: String,
    /// Human-readable summary.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::UploadFailure;

    #[test]
    fn test_listing_response_totals() {
        let mut listing = Listing::new();
        listing.insert(
            "imagens / png".to_string(),
            vec![StoredFileEntry {
                name: "photo.PNG".to_string(),
                path: "imagens/png/photo.PNG".to_string(),
                size: 10,
            }],
        );
        listing.insert(
            "documentos / pdf".to_string(),
            vec![StoredFileEntry {
                name: "report.pdf".to_string(),
                path: "documentos/pdf/report.pdf".to_string(),
                size: 32,
            }],
        );

        let response = ListingResponse::from(listing);
        assert_eq!(response.total_files, 2);
        assert_eq!(response.total_bytes, 42);
        assert_eq!(response.categories[0].name, "documentos / pdf");
        assert_eq!(response.categories[1].files[0].path, "imagens/png/photo.PNG");
    }

    #[test]
    fn test_upload_response_messages() {
        let report = UploadReport {
            accepted: 2,
            rejected: vec!["virus.exe".to_string()],
            saved: vec![
                "imagens/png/photo.PNG".to_string(),
                "documentos/pdf/report.pdf".to_string(),
            ],
            failed: vec![],
        };

        let response = UploadResponse::from(report);
        assert!(response.failed.is_empty());
        assert_eq!(response.messages.len(), 2);
        assert!(response.messages[0].contains("virus.exe"));
        assert!(response.messages[1].starts_with("2 file(s)"));
    }

    #[test]
    fn test_upload_response_reports_failed_writes() {
        let report = UploadReport {
            accepted: 1,
            rejected: vec![],
            saved: vec!["imagens/png/photo.png".to_string()],
            failed: vec![UploadFailure {
                filename: "report.pdf".to_string(),
                message: "Not a directory (os error 20)".to_string(),
            }],
        };

        let response = UploadResponse::from(report);
        assert_eq!(response.failed, vec!["report.pdf"]);
        assert_eq!(response.messages.len(), 2);
        assert!(response.messages[0].contains("report.pdf"));
        assert!(response.messages[0].contains("Not a directory"));
        assert!(response.messages[1].starts_with("1 file(s)"));
    }

    #[test]
    fn test_api_response_serializes_under_data() {
        let body = serde_json::to_value(ApiResponse::new(AccountInfo {
            id: 1,
            username: "alice".to_string(),
        }))
        .unwrap();
        assert_eq!(body["data"]["username"], "alice");
    }
}
