//! # API Shared
//!
//! Shared utilities and definitions for the portal's surfaces.
//!
//! Contains:
//! - Wire types for requests and responses (`dto` module)
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest`, which serves these shapes and documents them in its OpenAPI schema.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{validate_api_key, AuthError};
pub use dto::*;
pub use health::HealthService;
