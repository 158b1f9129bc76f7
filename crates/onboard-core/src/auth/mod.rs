//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `CredentialStore`: persistence for the bearer token and user id
//! - `SessionController`: the authenticated/unauthenticated gate, observable
//!   through a watch channel
//! - `AuthFlows`: sign-up and sign-in against the backend
//! - `Keychain`: optional OS-keychain memory of sign-in passwords

pub mod credentials;
pub mod flows;
pub mod keychain;
pub mod session;

pub use credentials::{
    Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore, StorageError,
};
pub use flows::{AuthFlowError, AuthFlows};
pub use keychain::Keychain;
pub use session::{
    SessionController, SessionSnapshot, SessionState, TransitionReason, SESSION_EXPIRED_NOTICE,
};
