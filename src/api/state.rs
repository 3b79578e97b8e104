//! Application state for shared services

use std::sync::Arc;

use crate::domain::auth::CredentialVerifier;
use crate::domain::storage::DocumentStore;
use crate::infrastructure::registration::RegistrationService;
use crate::infrastructure::team::TeamLifecycleService;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub teams: Arc<TeamLifecycleService>,
    pub registration: Arc<RegistrationService>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(
        teams: Arc<TeamLifecycleService>,
        registration: Arc<RegistrationService>,
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            teams,
            registration,
            verifier,
            store,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
