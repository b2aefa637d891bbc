//! Test utilities for integration testing

use std::time::Duration;

use axum_test::TestServer;
use url::Url;

use crate::config::{Config, StorageConfig};

/// Throwaway RSA key used only to exercise the signing path in tests
pub(crate) const TEST_PRIVATE_KEY: &str = include_str!("data/drive_key.pem");

/// Storage config pointing both provider endpoints at `base` (a mock server)
pub fn test_storage_config(base: &str) -> StorageConfig {
    let base = Url::parse(base).expect("invalid test base URL");
    StorageConfig {
        service_account_email: "relay@snapgate-test.iam.gserviceaccount.com".to_string(),
        private_key: TEST_PRIVATE_KEY.to_string(),
        folder_id: "test-folder".to_string(),
        token_uri: base.join("/token").unwrap(),
        upload_base_url: base,
        request_timeout: Duration::from_secs(5),
    }
}

pub fn create_test_config(mock_base: &str) -> Config {
    Config {
        storage: test_storage_config(mock_base),
        ..Config::default()
    }
}

pub fn create_test_server(config: Config) -> TestServer {
    crate::Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}
