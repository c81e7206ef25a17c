//! REST API client module for the DGolf backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! DGolf API: authentication, destination and article catalogs,
//! inquiries, testimonials and file uploads.
//!
//! The API uses JWT bearer token authentication obtained through
//! the `/api/auth/login` and `/api/auth/register` endpoints.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
