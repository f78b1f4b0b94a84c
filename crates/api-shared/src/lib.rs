//! # API Shared
//!
//! Shared utilities and definitions for the clinic APIs.
//!
//! Contains:
//! - Request and response bodies with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - API key checking
//!
//! Used by `api-rest` and the root `clinic-run` binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER};
pub use health::{HealthRes, HealthService};
