use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoredObject;

/// Response for a fully successful batch: one provider object per submitted file,
/// in submission order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub data: Vec<StoredObject>,
}

/// One file that failed, attributed by its original filename
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FailedUpload {
    pub filename: String,
    pub error: String,
}

/// Response for a partially failed batch when `uploads.report_partial_results` is
/// enabled: succeeded objects in `data`, failures in `failed`, both in submission
/// order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PartialUploadResponse {
    pub success: bool,
    pub data: Vec<StoredObject>,
    pub failed: Vec<FailedUpload>,
}
