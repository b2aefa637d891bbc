//! API layer for HTTP request handling and data models.
//!
//! This module contains the relay's HTTP surface, organized into:
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! The surface is intentionally small: `POST /uploadPhotos` does all the work,
//! `/healthz` answers liveness probes, and `/api-docs/openapi.json` serves the
//! generated OpenAPI document.

pub mod handlers;
pub mod models;
