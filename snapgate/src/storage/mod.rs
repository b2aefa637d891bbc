//! Storage provider abstraction layer
//!
//! This module defines the `StorageProvider` trait which abstracts the object-storage
//! backend the relay forwards files to. Google Drive is the only backend today; the
//! trait keeps the seam so tests can substitute a mock and another backend can be
//! added without touching the handlers.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::StorageConfig;

pub mod drive;

/// Create a storage provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new backend requires adding a constructor call here.
pub fn create_provider(config: &StorageConfig) -> anyhow::Result<std::sync::Arc<dyn StorageProvider>> {
    Ok(std::sync::Arc::new(drive::DriveProvider::new(config.clone())?))
}

/// Result type for storage provider operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur at the storage boundary.
///
/// Credential acquisition is tagged separately from object creation so the two
/// failure classes stay distinguishable in logs, even though both surface to the
/// caller as a 500.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to obtain storage credential: {message}")]
    Credential { message: String },

    #[error("Failed to upload '{filename}': {message}")]
    Upload { filename: String, message: String },
}

/// A short-lived bearer token minted for a single relay request.
///
/// Constructed fresh per request and never cached across requests, so a leaked
/// token is only ever valid for the provider defaults (one hour), and the relay
/// itself holds no long-lived secrets beyond the configured key.
#[derive(Debug, Clone)]
pub struct AccessToken(pub(crate) String);

impl AccessToken {
    pub fn secret(&self) -> &str {
        &self.0
    }
}

/// One file to forward, as received from the multipart form.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original filename as submitted; becomes the object name at the provider
    pub filename: String,
    /// Resolved MIME type (extension override already applied)
    pub content_type: String,
    pub bytes: Bytes,
}

/// Provider metadata describing a newly created object.
///
/// Field names mirror the provider's wire format so the response body round-trips
/// to the upload client unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// An object-storage backend consumed via two call shapes: one authentication
/// call per request, then one create-object call per file.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Mint a credential for one relay request
    async fn authenticate(&self) -> Result<AccessToken>;

    /// Create one object under the given credential, returning its metadata
    async fn create_object(&self, token: &AccessToken, file: &UploadFile) -> Result<StoredObject>;
}
