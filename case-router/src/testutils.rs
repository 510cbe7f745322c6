use crate::config::{
    AuthConfig, Config, CorsConfig, DEFAULT_AUTH_HEADER, DownstreamConfig, Environment, Listener,
    NetworkOriginConfig,
};
use crate::downstream::{CaseSink, DownstreamResponse};
use crate::errors::RelayError;
use crate::submission::CaseRecord;
use crate::user_agent::{Browser, Device, DeviceType, Os, ParsedUserAgent, UserAgentParser};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

pub fn test_config() -> Config {
    Config {
        listener: Listener {
            host: "0.0.0.0".to_string(),
            port: 3000,
        },
        admin_listener: Listener {
            host: "127.0.0.1".to_string(),
            port: 3001,
        },
        auth: AuthConfig {
            header: DEFAULT_AUTH_HEADER.to_string(),
            secret: "s3cret".to_string(),
        },
        downstream: DownstreamConfig {
            submit_url: Url::parse("https://cases.example.com/servlet/WebToCase").unwrap(),
            org_id: "00D000000000001".to_string(),
            environment: Environment::Production,
            debug_email: None,
            timeout_secs: 5,
        },
        network_origin: NetworkOriginConfig::default(),
        cors: CorsConfig::default(),
        detect_silent_failure: true,
    }
}

/// Parser returning a fixed result regardless of input.
pub struct StubParser(pub ParsedUserAgent);

impl StubParser {
    pub fn fully_parsed() -> Self {
        StubParser(ParsedUserAgent {
            browser: Some(Browser {
                name: "Chrome".into(),
                version: Some("120.0".into()),
            }),
            os: Some(Os {
                name: "Android".into(),
                version: Some("14".into()),
            }),
            device: Some(Device {
                vendor: "Google".into(),
                model: Some("Pixel 8".into()),
                device_type: Some(DeviceType::Mobile),
            }),
        })
    }
}

impl UserAgentParser for StubParser {
    fn parse(&self, _user_agent: &str) -> ParsedUserAgent {
        self.0.clone()
    }
}

/// In-memory sink that records every case and replies with a canned result.
pub struct RecordingSink {
    reply: Result<DownstreamResponse, String>,
    records: Mutex<Vec<CaseRecord>>,
}

impl RecordingSink {
    pub fn new(reply: DownstreamResponse) -> Self {
        Self {
            reply: Ok(reply),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(status: StatusCode) -> Self {
        Self::new(DownstreamResponse {
            status,
            headers: HeaderMap::new(),
        })
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<CaseRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaseSink for RecordingSink {
    async fn submit(&self, record: &CaseRecord) -> Result<DownstreamResponse, RelayError> {
        self.records.lock().unwrap().push(record.clone());
        self.reply.clone().map_err(RelayError::InternalError)
    }
}

#[derive(Clone, Debug)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
}

impl ReceivedRequest {
    pub fn query_pairs(&self) -> HashMap<String, String> {
        url::form_urlencoded::parse(self.query.as_deref().unwrap_or_default().as_bytes())
            .into_owned()
            .collect()
    }
}

/// A local HTTP server standing in for the case-management API.
pub struct TestDownstream {
    pub url: Url,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl TestDownstream {
    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

/// Starts a server that records requests and answers with `status` and `headers`.
pub async fn start_downstream(
    status: StatusCode,
    headers: &[(&'static str, &'static str)],
) -> TestDownstream {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");
    let port = listener.local_addr().unwrap().port();

    let received = Arc::new(Mutex::new(Vec::new()));
    let mut reply_headers = HeaderMap::new();
    for (name, value) in headers {
        reply_headers.insert(
            HeaderName::from_static(*name),
            HeaderValue::from_static(*value),
        );
    }

    let recorder = received.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let recorder = recorder.clone();
            let reply_headers = reply_headers.clone();

            tokio::spawn(async move {
                let handler = move |req: Request<Incoming>| {
                    let recorder = recorder.clone();
                    let reply_headers = reply_headers.clone();
                    async move {
                        let (parts, body) = req.into_parts();
                        let body = body
                            .collect()
                            .await
                            .map(|collected| collected.to_bytes())
                            .unwrap_or_else(|_| Bytes::new());
                        recorder.lock().unwrap().push(ReceivedRequest {
                            method: parts.method.to_string(),
                            path: parts.uri.path().to_string(),
                            query: parts.uri.query().map(str::to_string),
                            body,
                        });

                        let mut response = Response::new(Empty::<Bytes>::new());
                        *response.status_mut() = status;
                        *response.headers_mut() = reply_headers;
                        Ok::<_, Infallible>(response)
                    }
                };

                if let Err(err) =
                    hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service_fn(handler))
                        .await
                {
                    eprintln!("Error serving connection: {:?}", err);
                }
            });
        }
    });

    TestDownstream {
        url: Url::parse(&format!("http://127.0.0.1:{port}/servlet/servlet.WebToCase")).unwrap(),
        received,
    }
}
