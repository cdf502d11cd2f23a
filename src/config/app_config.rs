use serde::Deserialize;

const MIN_SECRET_LENGTH: usize = 32;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
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

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Token signing configuration
///
/// Access and refresh tokens use independent secrets; both must be at least
/// 32 characters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_hours: u64,
    pub refresh_ttl_days: u64,
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

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/account_service".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: "change-me-in-production-0123456789ab".to_string(),
            refresh_secret: "change-me-too-in-production-0123456".to_string(),
            access_ttl_hours: 24,
            refresh_ttl_days: 7,
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

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.access_secret.len() < MIN_SECRET_LENGTH {
            return Err(config::ConfigError::Message(format!(
                "auth.access_secret must be at least {} characters",
                MIN_SECRET_LENGTH
            )));
        }

        if self.auth.refresh_secret.len() < MIN_SECRET_LENGTH {
            return Err(config::ConfigError::Message(format!(
                "auth.refresh_secret must be at least {} characters",
                MIN_SECRET_LENGTH
            )));
        }

        if self.auth.access_secret == self.auth.refresh_secret {
            return Err(config::ConfigError::Message(
                "auth.access_secret and auth.refresh_secret must differ".to_string(),
            ));
        }

        Ok(())
    }
}
