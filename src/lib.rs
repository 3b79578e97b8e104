//! Hackathon Teams API
//!
//! Participant registration and team formation for a hackathon:
//! - Team lifecycle (create, invite, accept, decline, leave, disband, remove)
//! - Registration status machine with a time-gated check-in window
//! - In-memory or PostgreSQL document storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use chrono::Utc;
use domain::{
    AccountDirectory, CheckInWindow, DocumentStore, NotificationDispatcher, SystemClock,
};
use infrastructure::{
    auth::{JwtConfig, JwtService},
    directory::{HttpAccountDirectory, StoreAccountDirectory},
    notification::{LogNotificationDispatcher, WebhookNotificationDispatcher},
    registration::RegistrationService,
    storage::{PostgresConfig, StorageConfig, StorageFactory, StorageType},
    team::TeamLifecycleService,
    user::StorageUserRepository,
};
use tracing::{info, warn};

/// Create the application state from configuration
///
/// Connects the document store first so a bad database URL fails startup.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = StorageFactory::create_document_store(&storage_config(config)?).await?;

    let directory: Arc<dyn AccountDirectory> = match &config.directory.base_url {
        Some(base_url) => {
            info!(base_url = %base_url, "Using remote account directory");
            Arc::new(HttpAccountDirectory::new(
                base_url.clone(),
                Duration::from_secs(config.directory.timeout_secs),
            )?)
        }
        None => Arc::new(StoreAccountDirectory::new(store.users())),
    };

    let notifier: Arc<dyn NotificationDispatcher> = match &config.notifications.webhook_url {
        Some(url) => {
            info!(url = %url, "Publishing notifications to webhook");
            Arc::new(WebhookNotificationDispatcher::new(
                url.clone(),
                config.notifications.secret.clone(),
                Duration::from_secs(config.notifications.timeout_secs),
            )?)
        }
        None => Arc::new(LogNotificationDispatcher),
    };

    let check_in_start = config.event.check_in_start.unwrap_or_else(|| {
        warn!("event.check_in_start not configured, check-in opens now");
        Utc::now()
    });

    let jwt = Arc::new(JwtService::new(JwtConfig::new(
        config.auth.jwt_secret.clone(),
        config.auth.token_ttl_hours,
    )));

    let teams = Arc::new(TeamLifecycleService::new(store.clone(), directory));
    let registration = Arc::new(RegistrationService::new(
        Arc::new(StorageUserRepository::new(store.users())),
        notifier,
        Arc::new(SystemClock),
        CheckInWindow::new(check_in_start),
    ));

    Ok(AppState::new(teams, registration, jwt, store))
}

fn storage_config(config: &AppConfig) -> anyhow::Result<StorageConfig> {
    let settings = &config.storage;

    match StorageType::from_str(&settings.backend) {
        Some(StorageType::InMemory) => Ok(StorageConfig::in_memory()),
        Some(StorageType::Postgres) => {
            let url = settings
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("storage.url is required for the postgres backend"))?;

            Ok(StorageConfig::postgres(
                PostgresConfig::new(url)
                    .with_max_connections(settings.max_connections)
                    .with_min_connections(settings.min_connections)
                    .with_connect_timeout(settings.connect_timeout_secs),
            ))
        }
        None => anyhow::bail!("Unknown storage backend '{}'", settings.backend),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_selection() {
        let mut config = AppConfig::default();
        assert_eq!(storage_config(&config).unwrap().storage_type(), StorageType::InMemory);

        config.storage.backend = "postgres".to_string();
        assert!(storage_config(&config).is_err());

        config.storage.url = Some("postgres://localhost/hackathon".to_string());
        config.storage.max_connections = 3;
        match storage_config(&config).unwrap() {
            StorageConfig::Postgres(pg) => assert_eq!(pg.max_connections, 3),
            other => panic!("unexpected {:?}", other),
        }

        config.storage.backend = "mongo".to_string();
        assert!(storage_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_create_app_state_in_memory() {
        let state = create_app_state(&AppConfig::default()).await.unwrap();
        assert!(state.store.health_check().await.is_ok());
    }
}
