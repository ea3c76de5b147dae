//! File handlers: listing, upload and delete.
//!
//! Every handler takes the account root from the session identity; no
//! request parameter can name another account.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::file::{DeleteOutcome, UploadEntry};
use crate::web::dto::{ApiResponse, DeleteResponse, ListingResponse, UploadResponse};
use crate::web::error::{ApiError, ErrorCode};
use crate::web::middleware::AuthUser;
use crate::ArquivistaError;

use super::AppState;

/// GET / - List the caller's files by category.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<ListingResponse>>, ApiError> {
    let listing = state.store.for_account(identity.account_id).list_files()?;

    info!(
        account_id = identity.account_id,
        categories = listing.len(),
        "Listing accessed"
    );

    Ok(Json(ApiResponse::new(listing.into())))
}

/// POST /upload - Sort uploaded files into category folders.
///
/// Request body: multipart/form-data. Every part that carries a filename is
/// an upload entry, whatever its field name.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut entries = Vec::new();

    // Read the whole batch first so an oversized batch writes nothing.
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(ErrorCode::PayloadTooLarge, "Request body too large")
        } else {
            ApiError::bad_request("Invalid multipart data")
        }
    })? {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let content = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read file content: {}", e);
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::new(ErrorCode::PayloadTooLarge, "Request body too large")
            } else {
                ApiError::bad_request("Failed to read file")
            }
        })?;

        entries.push(UploadEntry::new(filename, content.to_vec()));
    }

    let report = state
        .store
        .for_account(identity.account_id)
        .upload(&entries, state.max_files_per_upload)?;

    Ok(Json(ApiResponse::new(report.into())))
}

/// POST /delete/*path - Delete one of the caller's files.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(path): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let files = state.store.for_account(identity.account_id);

    match files.delete(&path) {
        Ok(DeleteOutcome::Deleted) => {
            let name = path.rsplit('/').next().unwrap_or(&path).to_string();
            Ok(Json(ApiResponse::new(DeleteResponse {
                message: format!("File \"{name}\" deleted."),
                deleted: path,
            })))
        }
        Ok(DeleteOutcome::NotFound) => Err(ApiError::not_found("File not found")),
        Err(ArquivistaError::Io(e)) => Err(ApiError::internal(format!(
            "Failed to delete file: {e}"
        ))),
        Err(e) => Err(e.into()),
    }
}
