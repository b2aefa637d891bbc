//! # snapgate: event-photo upload relay
//!
//! `snapgate` is a single-purpose HTTP service: event guests upload photos from a
//! browser form, and the relay forwards each file to a shared Google Drive folder
//! under a pre-provisioned service account, answering with the provider's object
//! metadata. Nothing is persisted locally - no database, no queue, no sessions.
//!
//! ## Request flow
//!
//! A `POST /uploadPhotos` request carries one or more images as repeated `files`
//! entries of a multipart form. The handler enforces the batch limits at the
//! server boundary (the browser client has its own cap, but client checks are
//! trivially bypassable), resolves a MIME type per file (filename extension wins
//! over the declared part type), mints a fresh service-account credential for the
//! request, and fans out one create-object call per file. The per-file calls run
//! concurrently and are joined back in submission order, so each result stays
//! paired with its originating file by index.
//!
//! By default a single failing file collapses the whole batch into a `500` with
//! no partial results - the contract the existing upload client expects. Setting
//! `uploads.report_partial_results` switches to a `207` response that lists
//! succeeded objects and failed filenames side by side.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use snapgate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = snapgate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     snapgate::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod openapi;
pub mod storage;
pub mod telemetry;


use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use utoipa::OpenApi;

pub use config::Config;

use crate::config::CorsOrigin;
use crate::storage::StorageProvider;

/// Application state shared across all request handlers.
///
/// Deliberately small: the read-only configuration and the storage provider are
/// the only things requests share. There is no mutable process-wide state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn StorageProvider>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A literal "*" is rejected by `AllowOrigin::list`; a wildcard anywhere in
    // the list switches the whole layer to `Any` instead
    if config.cors_allowed_origins.contains(&CorsOrigin::Wildcard) {
        return Ok(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    let mut origins = Vec::new();
    for origin in &config.cors_allowed_origins {
        if let CorsOrigin::Url(url) = origin {
            origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
        }
    }

    Ok(CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any))
}

/// Build the application router with all endpoints and middleware.
///
/// The upload route gets a request body limit sized to the configured batch
/// (count times per-file size, plus headroom for the multipart framing), so an
/// oversized request is refused while it streams in instead of buffering fully.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let uploads = &state.config.uploads;
    let body_limit = (uploads.max_file_size as usize).saturating_mul(uploads.max_files) + 1024 * 1024;

    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
        .route(
            "/uploadPhotos",
            post(api::handlers::uploads::upload_photos)
                .fallback(api::handlers::uploads::method_not_allowed)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] builds the storage provider and router
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles requests
///    until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance from configuration
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let storage = storage::create_provider(&config.storage)?;

        let state = AppState {
            config: config.clone(),
            storage,
        };

        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("snapgate listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutdown complete");

        Ok(())
    }
}
