//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CredentialsConfig, IdentityConfig, LogFormat, LoggingConfig, ProposerConfig,
    RemediationConfig, ServerConfig, StorageConfig,
};
