use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub credentials: CredentialsConfig,
    pub identity: IdentityConfig,
    pub remediation: RemediationConfig,
    pub proposer: ProposerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Workflow record persistence backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `memory` or `postgres` (the latter reads DATABASE_URL)
    pub backend: String,
}

/// Engine credential resolution backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// `env` or `postgres`
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// User id assumed for requests without an X-User-Id header
    pub default_user: String,
}

/// Defaults used by remediation patch rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    pub credential_type: String,
    pub credential_name: String,
    pub credential_id: String,
    pub max_tries: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProposerConfig {
    /// Endpoint of the text-to-graph proposal service; proposal-based
    /// deploys are rejected when unset
    pub endpoint: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: "env".to_string(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_user: "default".to_string(),
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            credential_type: "httpHeaderAuth".to_string(),
            credential_name: "Default credential".to_string(),
            credential_id: "default".to_string(),
            max_tries: 3,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.credentials.backend, "env");
        assert_eq!(config.identity.default_user, "default");
        assert_eq!(config.remediation.max_tries, 3);
        assert!(config.proposer.endpoint.is_none());
    }

    #[test]
    fn test_partial_deserialization_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"server": {"port": 9999}}"#).unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.backend, "memory");
    }
}
