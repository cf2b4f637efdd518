//! Image upload routes.
//!
//! Multipart uploads are persisted under the configured directory and
//! served statically at `/uploads`; the response carries the public URLs.
//! Anything that is not an image is rejected before touching disk.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use std::path::Path as FsPath;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::response::ApiResponse;

/// Metadata echoed back for each stored file.
#[derive(Debug, Serialize)]
pub struct StoredFile {
    pub original_name: Option<String>,
    pub filename: String,
    pub size: usize,
    pub content_type: String,
}

/// `data` payload for upload responses.
#[derive(Debug, Serialize)]
pub struct UploadData {
    pub image_urls: Vec<String>,
    pub files: Vec<StoredFile>,
}

/// Upload up to `uploads.max_files_per_request` listing images.
///
/// POST /api/uploads (multipart, field name `images`)
pub async fn upload_images(
    State(state): State<AppState>,
    auth: UserAuth,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    let stored = store_images(
        &state,
        multipart,
        state.config.uploads.max_files_per_request,
    )
    .await?;

    if stored.files.is_empty() {
        return Err(ApiError::Validation("No files uploaded".to_string()));
    }

    info!(
        user_id = auth.user_id,
        count = stored.files.len(),
        "Images uploaded"
    );

    Ok(Json(ApiResponse::with_message(
        "Files uploaded successfully",
        stored,
    )))
}

/// Upload a single profile picture.
///
/// POST /api/uploads/profile (multipart, field name `profilePicture`)
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    auth: UserAuth,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    let stored = store_images(&state, multipart, 1).await?;

    if stored.files.is_empty() {
        return Err(ApiError::Validation(
            "No profile picture uploaded".to_string(),
        ));
    }

    info!(user_id = auth.user_id, "Profile picture uploaded");

    Ok(Json(ApiResponse::with_message(
        "Profile picture uploaded successfully",
        stored,
    )))
}

async fn store_images(
    state: &AppState,
    mut multipart: Multipart,
    max_files: usize,
) -> Result<UploadData, ApiError> {
    let uploads = &state.config.uploads;
    let mut image_urls = Vec::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        if field.file_name().is_none() {
            // Skip non-file parts
            continue;
        }

        if files.len() >= max_files {
            return Err(ApiError::Validation(format!(
                "At most {} files are accepted per upload",
                max_files
            )));
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::Validation(
                "Only image files are allowed".to_string(),
            ));
        }

        let field_name = field.name().unwrap_or("file").to_string();
        let original_name = field.file_name().map(|n| n.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;

        if data.len() > uploads.max_file_size_bytes {
            return Err(ApiError::Validation(format!(
                "Files may be at most {} bytes",
                uploads.max_file_size_bytes
            )));
        }

        let extension = original_name
            .as_deref()
            .and_then(|n| FsPath::new(n).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let filename = format!("{}-{}{}", field_name, Uuid::new_v4(), extension);
        let path = FsPath::new(&uploads.dir).join(&filename);

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to persist upload: {}", e)))?;

        image_urls.push(format!(
            "{}/{}",
            uploads.public_base_url.trim_end_matches('/'),
            filename
        ));
        files.push(StoredFile {
            original_name,
            filename,
            size: data.len(),
            content_type,
        });
    }

    Ok(UploadData { image_urls, files })
}
