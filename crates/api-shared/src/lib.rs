//! # API Shared
//!
//! Shared utilities and definitions for the clinic APIs.
//!
//! Contains:
//! - Wire types (`dto` module) with their OpenAPI schemas
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest`. The `clinic` CLI reuses the intake request type.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{validate_api_key, AuthError};
pub use health::HealthService;
