//! Wiring of the shared application services.
//!
//! One `App` per process: a single credential store, a single session
//! controller, and the flows/resources built on top of them.

use std::sync::Arc;

use tracing::debug;

use crate::api::{ApiClient, ApiError, EmployeeApi};
use crate::auth::{AuthFlows, CredentialStore, SessionController};
use crate::config::Config;

#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub session: Arc<SessionController>,
    pub auth: AuthFlows,
    pub employees: EmployeeApi,
}

impl App {
    /// Build the services around `store`, optimistically restoring a saved
    /// session.
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let session = Arc::new(SessionController::restore(store.clone()));
        let client = ApiClient::new(&config, store)?;
        debug!(api_url = %client.base_url(), authenticated = session.is_authenticated(), "App services ready");

        Ok(Self {
            auth: AuthFlows::new(client.clone(), session.clone()),
            employees: EmployeeApi::new(client, session.clone()),
            session,
            config,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}
