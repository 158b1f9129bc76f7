//! Onboard core - session handling and backend access for the employee
//! onboarding and to-do client.
//!
//! The pieces, leaves first:
//! - [`auth::CredentialStore`]: persisted bearer token and user id
//! - [`api::ApiClient`]: attaches the token to outbound requests
//! - [`auth::SessionController`]: authenticated/unauthenticated gate
//! - [`auth::AuthFlows`]: sign-up and sign-in
//! - [`api::EmployeeApi`]: profile, password, to-dos, uploads
//! - [`validation`]: local form rules shared by every form

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod models;
pub mod validation;

pub use app::App;
pub use config::Config;
