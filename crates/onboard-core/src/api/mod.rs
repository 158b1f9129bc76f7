//! REST API client module for the employee backend.
//!
//! This module provides the `ApiClient` for authenticated requests and the
//! `EmployeeApi` wrapper over the profile, password, to-do and upload
//! endpoints.
//!
//! The backend uses bearer token authentication; the token is obtained
//! through the sign-in endpoint (see `auth::flows`).

pub mod client;
pub mod employees;
pub mod error;

pub use client::{ApiClient, RequestOptions};
pub use employees::{EmployeeApi, ProfileDocument};
pub use error::{ApiError, GENERIC_FAILURE_MESSAGE};
