//! Google Drive storage backend.
//!
//! Consumes the Drive v3 API via two call shapes:
//!
//! 1. An OAuth2 JWT-bearer exchange: an RS256-signed assertion built from the
//!    service-account identity is posted to the token endpoint and answered with a
//!    short-lived access token.
//! 2. A `multipart/related` media upload: JSON object metadata (name + parent folder)
//!    in the first part, the raw file bytes in the second.
//!
//! Both endpoints are taken from configuration so tests can point them at a mock
//! server. The credential is minted fresh for every relay request; nothing is cached
//! across requests.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::config::StorageConfig;
use crate::storage::{AccessToken, Result, StorageError, StorageProvider, StoredObject, UploadFile};

/// Scope set granted to the minted token. Fixed; not configurable.
const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/drive.appdata",
    "https://www.googleapis.com/auth/drive.file",
];

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime claimed for the signed assertion. The provider caps assertions at one
/// hour, and the token is only used within a single request anyway.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Claims of the JWT-bearer assertion, per the service-account flow
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl Claims {
    fn new(config: &StorageConfig, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: config.service_account_email.clone(),
            scope: SCOPES.join(" "),
            aud: config.token_uri.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct DriveProvider {
    http: reqwest::Client,
    upload_url: Url,
    config: StorageConfig,
}

impl DriveProvider {
    pub fn new(config: StorageConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.request_timeout).build()?;
        // A base URL that cannot carry the upload path is a configuration
        // problem; catch it at startup instead of on the first upload
        let upload_url = config
            .upload_base_url
            .join("/upload/drive/v3/files")
            .context("invalid storage.upload_base_url")?;
        Ok(Self { http, upload_url, config })
    }

    /// Build and sign the JWT-bearer assertion for the token exchange
    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let key = EncodingKey::from_rsa_pem(self.config.private_key.as_bytes()).map_err(|e| StorageError::Credential {
            message: format!("invalid service-account private key: {e}"),
        })?;

        let claims = Claims::new(&self.config, now);
        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| StorageError::Credential {
            message: format!("failed to sign assertion: {e}"),
        })
    }
}

#[async_trait]
impl StorageProvider for DriveProvider {
    async fn authenticate(&self) -> Result<AccessToken> {
        let assertion = self.signed_assertion(Utc::now())?;

        let response = self
            .http
            .post(self.config.token_uri.clone())
            .form(&[("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StorageError::Credential {
                message: format!("token exchange request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = truncated_body(response).await;
            return Err(StorageError::Credential {
                message: format!("token endpoint answered {status}: {body}"),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| StorageError::Credential {
            message: format!("malformed token response: {e}"),
        })?;

        tracing::debug!("Minted storage credential for request");

        Ok(AccessToken(token.access_token))
    }

    async fn create_object(&self, token: &AccessToken, file: &UploadFile) -> Result<StoredObject> {
        // An unset folder id is forwarded as an empty parent; the provider ignores it
        // rather than the relay refusing the upload.
        let metadata = json!({
            "name": file.filename,
            "parents": [self.config.folder_id],
        });

        let boundary = format!("snapgate-{}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default(), file.bytes.len());
        let body = related_body(&metadata, file, &boundary);

        let upload_error = |message: String| StorageError::Upload {
            filename: file.filename.clone(),
            message,
        };

        let response = self
            .http
            .post(self.upload_url.clone())
            .query(&[("uploadType", "multipart")])
            .bearer_auth(token.secret())
            .header("content-type", format!("multipart/related; boundary={boundary}"))
            .body(body)
            .send()
            .await
            .map_err(|e| upload_error(format!("upload request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = truncated_body(response).await;
            return Err(upload_error(format!("provider answered {status}: {body}")));
        }

        let object: StoredObject = response
            .json()
            .await
            .map_err(|e| upload_error(format!("malformed provider response: {e}")))?;

        tracing::debug!(filename = %file.filename, object_id = %object.id, "Created provider object");

        Ok(object)
    }
}

/// Assemble the two-part `multipart/related` upload body: JSON metadata first,
/// raw file bytes second.
fn related_body(metadata: &serde_json::Value, file: &UploadFile, boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(file.bytes.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Read at most the first few hundred bytes of an error body for diagnostics
async fn truncated_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) => text.chars().take(300).collect(),
        Err(_) => "<unreadable body>".to_string(),
    }
}
