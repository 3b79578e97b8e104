//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, DirectoryConfig, EventConfig, LogFormat, LoggingConfig,
    MetricsConfig, NotificationsConfig, ServerConfig, StorageSettings,
};
