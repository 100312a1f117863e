use std::sync::Arc;

use stashbot_core::{
    Authenticator, BatchCoordinator, CleanupService, Config, CredentialCache,
    MaintenanceScheduler, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    credentials: Arc<CredentialCache>,
    coordinator: Arc<BatchCoordinator>,
    cleanup: Arc<CleanupService>,
    maintenance: Option<Arc<MaintenanceScheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        credentials: Arc<CredentialCache>,
        coordinator: Arc<BatchCoordinator>,
        cleanup: Arc<CleanupService>,
        maintenance: Option<Arc<MaintenanceScheduler>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            credentials,
            coordinator,
            cleanup,
            maintenance,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    pub fn coordinator(&self) -> &BatchCoordinator {
        &self.coordinator
    }

    pub fn cleanup(&self) -> &CleanupService {
        &self.cleanup
    }

    /// Present only when the scheduled sweep is configured.
    pub fn maintenance(&self) -> Option<&Arc<MaintenanceScheduler>> {
        self.maintenance.as_ref()
    }

    /// Directory submissions go to and cleanup works under.
    pub fn offline_dir(&self) -> &str {
        &self.config.storage.offline_dir
    }
}
