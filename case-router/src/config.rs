use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_AUTH_HEADER: &str = "x-stellar-site-form-support-key";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Empty auth header name")]
    EmptyAuthHeader,

    #[error("Empty shared secret")]
    EmptySecret,

    #[error("Empty organization id")]
    EmptyOrgId,

    #[error("debug_email is required in the development environment")]
    MissingDebugEmail,
}

/// Deployment environment of the downstream organization.
///
/// Anything other than production attaches the downstream debug fields.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Relay configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for form submissions
    pub listener: Listener,
    /// Admin listener for health and readiness checks
    pub admin_listener: Listener,
    pub auth: AuthConfig,
    pub downstream: DownstreamConfig,
    #[serde(default)]
    pub network_origin: NetworkOriginConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Treat a 200 from the downstream API whose `is-processed` header reports an
    /// exception as a failed submission.
    #[serde(default = "default_true")]
    pub detect_silent_failure: bool,
}

impl Config {
    /// Validates the relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.auth.header.is_empty() {
            return Err(ValidationError::EmptyAuthHeader);
        }
        if self.auth.secret.is_empty() {
            return Err(ValidationError::EmptySecret);
        }
        if self.downstream.org_id.is_empty() {
            return Err(ValidationError::EmptyOrgId);
        }

        let has_debug_email = self
            .downstream
            .debug_email
            .as_deref()
            .is_some_and(|email| !email.is_empty());
        if !self.downstream.environment.is_production() && !has_debug_email {
            return Err(ValidationError::MissingDebugEmail);
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Shared-secret authentication
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Request header carrying the secret
    #[serde(default = "default_auth_header")]
    pub header: String,
    pub secret: String,
}

/// Case-management API the submissions are forwarded to
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DownstreamConfig {
    /// Form ingestion endpoint; the case record is appended as its query string
    pub submit_url: Url,
    /// Organization identifier sent as `orgid`
    pub org_id: String,
    #[serde(default)]
    pub environment: Environment,
    /// Address receiving downstream debug reports outside of production
    pub debug_email: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Request headers the edge platform uses to describe the network origin of a request
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkOriginConfig {
    pub country_header: String,
    pub asn_header: String,
    /// Header identifying the edge node. A `cf-ray` header carries the node code as
    /// the suffix of the ray id.
    pub pop_header: String,
}

impl Default for NetworkOriginConfig {
    fn default() -> Self {
        NetworkOriginConfig {
            country_header: "cf-ipcountry".into(),
            asn_header: "x-client-asn".into(),
            pop_header: "cf-ray".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        CorsConfig {
            enabled: true,
            allow_origin: "*".into(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_auth_header() -> String {
    DEFAULT_AUTH_HEADER.into()
}

fn default_timeout_secs() -> u64 {
    30
}
