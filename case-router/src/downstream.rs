use crate::config::DownstreamConfig;
use crate::errors::RelayError;
use crate::metrics_defs::DOWNSTREAM_DURATION;
use crate::submission::CaseRecord;
use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use shared::histogram;
use std::time::{Duration, Instant};
use url::Url;

/// Header the downstream API uses to report how a submission was processed.
pub const IS_PROCESSED_HEADER: &str = "is-processed";

/// Status and headers of the downstream reply. The body carries nothing useful.
#[derive(Clone, Debug)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl DownstreamResponse {
    /// Returns the `is-processed` value when it reports an exception.
    ///
    /// The downstream API answers 200 even when a required field is missing or
    /// invalid, and only flags the failure with e.g.
    /// `Is-Processed: true Exception:common.exception.SalesforceGenericException`.
    pub fn silent_failure(&self) -> Option<&str> {
        self.headers
            .get(IS_PROCESSED_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.contains("Exception"))
    }
}

/// Destination for case records.
#[async_trait]
pub trait CaseSink: Send + Sync {
    async fn submit(&self, record: &CaseRecord) -> Result<DownstreamResponse, RelayError>;
}

/// Posts case records to the downstream form endpoint the way a browser submits an
/// HTML form: every field in the query string, no body.
pub struct HttpCaseSink {
    client: reqwest::Client,
    submit_url: Url,
}

impl HttpCaseSink {
    pub fn new(config: &DownstreamConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpCaseSink {
            client,
            submit_url: config.submit_url.clone(),
        })
    }
}

#[async_trait]
impl CaseSink for HttpCaseSink {
    async fn submit(&self, record: &CaseRecord) -> Result<DownstreamResponse, RelayError> {
        let url = record.submit_url(&self.submit_url);
        let started = Instant::now();

        let result = self.client.post(url).send().await;
        histogram!(DOWNSTREAM_DURATION).record(started.elapsed().as_secs_f64());

        // The request URL carries the whole case, so it never leaves in an error.
        let response = result.map_err(reqwest::Error::without_url)?;
        tracing::debug!(status = %response.status(), "Downstream responded");

        Ok(DownstreamResponse {
            status: response.status(),
            headers: response.headers().clone(),
        })
    }
}
