use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

/// HTTP server settings, read from `mailwatch.toml` and the environment
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Comma-separated list of allowed origins; permissive CORS when unset
    pub cors_allowed_origins: Option<String>,
}

fn default_port() -> u16 {
    3001
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_builder(
            config::Config::builder()
                .add_source(File::with_name("mailwatch").required(false))
                .add_source(Environment::default()),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .context("Failed to read server configuration")?
            .try_deserialize()
            .context("PORT must be a valid port number")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<AppConfig> {
        AppConfig::from_builder(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_default_port() {
        let config = from_toml("").expect("should load");
        assert_eq!(config.port, 3001);
        assert!(config.cors_allowed_origins.is_none());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(from_toml("port = 70000").is_err());
    }
}
