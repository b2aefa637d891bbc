use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;

use crate::api::models::uploads::{FailedUpload, PartialUploadResponse, UploadResponse};
use crate::errors::{Error, Result};
use crate::storage::{StorageError, UploadFile};
use crate::AppState;

/// Multipart field name the upload client submits files under
pub const FILES_FIELD: &str = "files";

/// Fallback when neither the declared part content-type nor the filename
/// extension says anything useful. Phone cameras produce JPEGs; so does the
/// client-side shrink step.
const DEFAULT_MIME: &str = "image/jpeg";

/// Resolve the MIME type forwarded to the provider.
///
/// The filename extension takes priority over the declared part content-type when
/// the two disagree - browsers routinely declare `application/octet-stream` for
/// files they did not sniff, while the extension is what the guest's camera wrote.
/// Matching is case-insensitive. Unknown or missing extensions fall back to the
/// declared type, then to [`DEFAULT_MIME`].
fn resolve_mime(declared: Option<&str>, filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    let from_extension = if lower.ends_with(".png") {
        Some("image/png")
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        Some("image/jpeg")
    } else if lower.ends_with(".webp") {
        Some("image/webp")
    } else {
        None
    };

    from_extension.or(declared).unwrap_or(DEFAULT_MIME).to_string()
}

/// Handle a photo upload batch.
///
/// Collects every `files` part from the multipart form, enforces the batch limits
/// at the server boundary, mints one storage credential for the request, then fans
/// out one create-object call per file and joins the results back in submission
/// order.
#[utoipa::path(
    post,
    path = "/uploadPhotos",
    tag = "uploads",
    summary = "Upload photos",
    description = "Relay a batch of guest photos to the configured storage folder. \
                   Files are carried as repeated `files` entries of a multipart form.",
    request_body(
        content = Vec<u8>,
        content_type = "multipart/form-data",
        description = "One or more image files under the `files` field"
    ),
    responses(
        (status = 200, description = "Every file was stored", body = UploadResponse),
        (status = 207, description = "Partial success (only when partial reporting is enabled)", body = PartialUploadResponse),
        (status = 400, description = "No files, too many files, or malformed form data"),
        (status = 405, description = "Any verb other than POST"),
        (status = 413, description = "A file exceeds the size limit"),
        (status = 500, description = "Credential acquisition or upload failure")
    )
)]
pub async fn upload_photos(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    // A non-multipart body never reaches the field loop; map the extractor
    // rejection into the JSON error shape instead of axum's plain-text reply
    let mut multipart = multipart.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })?;

    let limits = &state.config.uploads;
    let mut files: Vec<UploadFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        if field.name() != Some(FILES_FIELD) {
            // Ignore unknown fields (forward compatibility)
            continue;
        }

        // Fail before buffering another file once the batch is over the limit
        if files.len() >= limits.max_files {
            return Err(Error::TooManyFiles {
                received: files.len() + 1,
                max: limits.max_files,
            });
        }

        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let declared = field.content_type().map(|s| s.to_string());

        let bytes = field.bytes().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to read file '{filename}': {e}"),
        })?;

        if bytes.len() as u64 > limits.max_file_size {
            return Err(Error::PayloadTooLarge {
                filename,
                max_bytes: limits.max_file_size,
            });
        }

        let content_type = resolve_mime(declared.as_deref(), &filename);
        files.push(UploadFile {
            filename,
            content_type,
            bytes,
        });
    }

    if files.is_empty() {
        return Err(Error::BadRequest {
            message: "No files were submitted".to_string(),
        });
    }

    tracing::info!(count = files.len(), "Received upload batch");

    // One credential per request, never cached across requests
    let token = state.storage.authenticate().await?;

    // Fan out one create-object call per file. join_all keeps the output in
    // submission order, so results stay paired with their originating file by
    // index rather than by completion time.
    let results = join_all(files.iter().map(|file| state.storage.create_object(&token, file))).await;

    let mut data = Vec::with_capacity(files.len());
    let mut failed = Vec::new();
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(object) => data.push(object),
            Err(err) => failed.push((file.filename.clone(), err)),
        }
    }

    if failed.is_empty() {
        tracing::info!(count = data.len(), "Upload batch completed");
        return Ok((StatusCode::OK, Json(UploadResponse { success: true, data })).into_response());
    }

    if limits.report_partial_results {
        tracing::warn!(succeeded = data.len(), failed = failed.len(), "Upload batch partially failed");
        let failed = failed
            .into_iter()
            .map(|(filename, err)| FailedUpload {
                filename,
                error: match err {
                    StorageError::Upload { message, .. } => message,
                    other => other.to_string(),
                },
            })
            .collect();
        return Ok((
            StatusCode::MULTI_STATUS,
            Json(PartialUploadResponse {
                success: false,
                data,
                failed,
            }),
        )
            .into_response());
    }

    // Compatibility contract: the first failure collapses the whole batch. Files
    // that already made it to the provider stay there - there is no rollback - but
    // the caller is not told about them.
    let (_, first_error) = failed.swap_remove(0);
    Err(first_error.into())
}

/// Answer any non-POST verb on the upload endpoint with the fixed 405 body
pub async fn method_not_allowed(method: Method) -> Error {
    Error::MethodNotAllowed {
        method: method.to_string(),
    }
}
