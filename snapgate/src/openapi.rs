//! OpenAPI documentation for the relay's HTTP surface.

use utoipa::OpenApi;

use crate::api::models::uploads::{FailedUpload, PartialUploadResponse, UploadResponse};
use crate::storage::StoredObject;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "snapgate",
        description = "Stateless relay that forwards event-guest photo uploads to Google Drive"
    ),
    paths(crate::api::handlers::uploads::upload_photos),
    components(schemas(UploadResponse, PartialUploadResponse, FailedUpload, StoredObject))
)]
pub struct ApiDoc;
