pub mod auth;
pub mod client_info;
pub mod config;
pub mod cors;
pub mod downstream;
pub mod errors;
pub mod metrics_defs;
pub mod relay;
pub mod response;
pub mod submission;
pub mod user_agent;

#[cfg(test)]
mod testutils;

use config::{Config, ValidationError};
use downstream::HttpCaseSink;
use errors::RelayError;
use relay::{CaseRelay, RelayService};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use user_agent::HeuristicParser;

#[derive(thiserror::Error, Debug)]
pub enum CaseRouterError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
    #[error("invalid CORS header value: {0}")]
    InvalidCorsHeader(#[from] http::header::InvalidHeaderValue),
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Serves form submissions and the admin endpoints until either listener fails.
pub async fn run(config: Config) -> Result<(), CaseRouterError> {
    config.validate()?;

    let sink = Arc::new(HttpCaseSink::new(&config.downstream)?);
    let relay = CaseRelay::new(config.clone(), Arc::new(HeuristicParser), sink)?;

    tracing::info!(
        environment = ?config.downstream.environment,
        cors = config.cors.enabled,
        detect_silent_failure = config.detect_silent_failure,
        "Starting form relay"
    );

    let relay_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        RelayService::new(relay),
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, RelayError>::new(|| true),
    );

    tokio::try_join!(relay_task, admin_task)?;
    Ok(())
}
