use case_router::config::{Config as RelayConfig, Environment, ValidationError};
use serde::Deserialize;
use std::fs::File;
use url::Url;

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            sentry_dsn: None,
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Deserialize, Debug)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub relay: RelayConfig,
}

/// Deployment-time variables taking precedence over the config file.
pub const SECRET_VAR: &str = "SITE_FORM_SUPPORT_KEY";
pub const SUBMIT_URL_VAR: &str = "SITE_FORM_SUBMIT_URL";
pub const ORG_ID_VAR: &str = "SITE_SFDC_ORG_ID";
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let mut config: Config = serde_yaml::from_reader(file)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relay.validate()?;
        Ok(())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(SECRET_VAR) {
            self.relay.auth.secret = secret;
        }
        if let Some(url) = lookup(SUBMIT_URL_VAR) {
            self.relay.downstream.submit_url =
                Url::parse(&url).map_err(|e| ConfigError::InvalidOverride {
                    name: SUBMIT_URL_VAR,
                    reason: e.to_string(),
                })?;
        }
        if let Some(org_id) = lookup(ORG_ID_VAR) {
            self.relay.downstream.org_id = org_id;
        }
        if let Some(environment) = lookup(ENVIRONMENT_VAR) {
            self.relay.downstream.environment = serde_yaml::from_str::<Environment>(&environment)
                .map_err(|e| ConfigError::InvalidOverride {
                    name: ENVIRONMENT_VAR,
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid value for {name}: {reason}")]
    InvalidOverride { name: &'static str, reason: String },
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}
