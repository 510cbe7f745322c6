use crate::auth::is_authorized;
use crate::client_info::ClientInfo;
use crate::config::Config;
use crate::cors::CorsPolicy;
use crate::downstream::CaseSink;
use crate::errors::RelayError;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS};
use crate::response::{RelayBody, RelayResponse, json_response};
use crate::submission::{CaseRecord, FormSubmission};
use crate::user_agent::UserAgentParser;
use http_body_util::BodyExt;
use hyper::body::{Body, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::{counter, histogram};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Takes a form submission from authentication through to the downstream reply.
pub struct CaseRelay {
    config: Config,
    parser: Arc<dyn UserAgentParser>,
    sink: Arc<dyn CaseSink>,
    cors: Option<CorsPolicy>,
}

impl CaseRelay {
    pub fn new(
        config: Config,
        parser: Arc<dyn UserAgentParser>,
        sink: Arc<dyn CaseSink>,
    ) -> Result<Self, crate::CaseRouterError> {
        let cors = match config.cors.enabled {
            true => Some(CorsPolicy::new(&config.cors, &config.auth.header)?),
            false => None,
        };

        Ok(Self {
            config,
            parser,
            sink,
            cors,
        })
    }

    /// Handles one request. Failures are turned into JSON responses here and
    /// nowhere else.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<RelayBody>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let started = Instant::now();

        if req.method() == Method::OPTIONS
            && let Some(cors) = &self.cors
        {
            self.record("preflight", started);
            return cors.preflight(req.headers());
        }

        let (outcome, mut response) = match self.process(req).await {
            Ok(()) => {
                tracing::info!("Case submitted");
                (
                    "success",
                    json_response(StatusCode::OK, &RelayResponse::success()),
                )
            }
            Err(e) => {
                match &e {
                    RelayError::Unauthorized => {
                        tracing::warn!("Rejected form submission with invalid key")
                    }
                    RelayError::DownstreamRejected { status, .. } => {
                        tracing::warn!(status = %status, "Downstream rejected case")
                    }
                    RelayError::DownstreamSilentFailure { is_processed } => tracing::error!(
                        is_processed = %is_processed,
                        "Downstream failed to process case"
                    ),
                    _ => tracing::error!(error = %e, "Failed to submit case"),
                }
                (
                    e.outcome(),
                    json_response(e.status(), &RelayResponse::failure(e.to_string())),
                )
            }
        };

        if let Some(cors) = &self.cors {
            cors.apply(response.headers_mut());
        }

        self.record(outcome, started);
        response
    }

    async fn process<B>(&self, req: Request<B>) -> Result<(), RelayError>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let auth = &self.config.auth;
        if !is_authorized(req.headers(), &auth.header, &auth.secret) {
            return Err(RelayError::Unauthorized);
        }

        let (parts, body) = req.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| RelayError::RequestBodyError(e.to_string()))?
            .to_bytes();
        let form: FormSubmission = serde_json::from_slice(&bytes)?;

        let client_info = ClientInfo::from_headers(
            &parts.headers,
            &self.config.network_origin,
            self.parser.as_ref(),
        );
        tracing::debug!(?client_info, "Built client info");

        let record = CaseRecord::new(form, &client_info, &self.config.downstream);
        let response = self.sink.submit(&record).await?;

        if response.status != StatusCode::OK {
            let status = response.status;
            return Err(RelayError::DownstreamRejected {
                status,
                reason: status
                    .canonical_reason()
                    .unwrap_or(status.as_str())
                    .to_string(),
            });
        }

        if self.config.detect_silent_failure
            && let Some(is_processed) = response.silent_failure()
        {
            return Err(RelayError::DownstreamSilentFailure {
                is_processed: is_processed.to_string(),
            });
        }

        Ok(())
    }

    fn record(&self, outcome: &'static str, started: Instant) {
        counter!(REQUESTS, "outcome" => outcome).increment(1);
        histogram!(REQUEST_DURATION, "outcome" => outcome)
            .record(started.elapsed().as_secs_f64());
    }
}

/// Hyper service wrapper around a shared [`CaseRelay`].
#[derive(Clone)]
pub struct RelayService {
    relay: Arc<CaseRelay>,
}

impl RelayService {
    pub fn new(relay: CaseRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

impl Service<Request<Incoming>> for RelayService {
    type Response = Response<RelayBody>;
    type Error = RelayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let relay = self.relay.clone();
        Box::pin(async move { Ok(relay.handle(req).await) })
    }
}
