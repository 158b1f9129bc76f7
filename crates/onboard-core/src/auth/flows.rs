use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::credentials::{Credential, StorageError};
use super::session::{SessionController, TransitionReason};
use crate::api::{ApiClient, ApiError, GENERIC_FAILURE_MESSAGE};
use crate::models::{id_string, Registration};
use crate::validation::ValidationErrors;

/// Shown when the backend rejects a registration without saying why.
const REGISTRATION_FAILED_MESSAGE: &str =
    "Registration failed. Email already registered or invalid date.";

#[derive(Error, Debug)]
pub enum AuthFlowError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    RegistrationRejected(String),

    /// The account exists but the follow-up sign-in did not produce a session.
    #[error("Registered, but signing in failed: {0}")]
    AutoSignInFailed(#[source] Box<AuthFlowError>),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthFlowError {
    /// Text to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            AuthFlowError::Validation(errors) => errors.to_string(),
            AuthFlowError::InvalidCredentials => self.to_string(),
            AuthFlowError::RegistrationRejected(message) => message.clone(),
            AuthFlowError::AutoSignInFailed(_) | AuthFlowError::Storage(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            AuthFlowError::Api(e) => e.user_message(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    token: String,
    #[serde(deserialize_with = "id_string")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    message: Option<String>,
}

/// Sign-up and sign-in against the backend, driving the session on success.
#[derive(Clone)]
pub struct AuthFlows {
    client: ApiClient,
    session: Arc<SessionController>,
}

impl AuthFlows {
    pub fn new(client: ApiClient, session: Arc<SessionController>) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    /// Exchange email and password for a token. The credential is saved
    /// before the session becomes authenticated; on rejection nothing changes.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, AuthFlowError> {
        self.sign_in_as(email, password, TransitionReason::SignedIn)
            .await
    }

    async fn sign_in_as(
        &self,
        email: &str,
        password: &str,
        reason: TransitionReason,
    ) -> Result<Credential, AuthFlowError> {
        let url = self.client.url("/api/employees/signin");
        let response = self
            .client
            .post_query_anonymous(&url, &[("email", email), ("password", password)])
            .await?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Sign-in rejected");
            return Err(AuthFlowError::InvalidCredentials);
        }

        let body: SignInResponse = ApiClient::parse_json(response).await?;
        let credential = Credential::new(body.token, body.id);
        self.session.establish(&credential, reason)?;
        info!(user_id = %credential.user_id, "Signed in");
        Ok(credential)
    }

    /// Register a new employee, then sign in with the same credentials.
    ///
    /// Nothing is sent unless every local rule passes. If registration
    /// succeeds but the sign-in does not, the account exists and the user
    /// stays signed out: [`AuthFlowError::AutoSignInFailed`].
    pub async fn sign_up(
        &self,
        registration: &Registration,
        confirm_password: &str,
    ) -> Result<Credential, AuthFlowError> {
        registration.validate(confirm_password)?;

        let url = self.client.url("/api/employees");
        let response = self.client.post_json_anonymous(&url, registration).await?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;

        if !status.is_success() {
            let message = serde_json::from_str::<RejectionBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| REGISTRATION_FAILED_MESSAGE.to_string());
            warn!(status = status.as_u16(), %message, "Registration rejected");
            return Err(AuthFlowError::RegistrationRejected(message));
        }
        info!(email = %registration.email, "Registered");

        self.sign_in_as(
            &registration.email,
            &registration.password,
            TransitionReason::SignedUp,
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "Automatic sign-in after registration failed");
            AuthFlowError::AutoSignInFailed(Box::new(e))
        })
    }

    /// Clear the stored credential and leave the authenticated area.
    pub fn logout(&self) -> Result<(), AuthFlowError> {
        self.session.logout()?;
        Ok(())
    }
}
