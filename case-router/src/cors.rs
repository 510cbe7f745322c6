use crate::config::CorsConfig;
use crate::response::{RelayBody, empty_body};
use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ALLOW, CONTENT_TYPE, HeaderMap,
    HeaderValue, InvalidHeaderValue, ORIGIN,
};
use hyper::Response;

pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Permissive CORS headers attached to every form response.
#[derive(Clone, Debug)]
pub struct CorsPolicy {
    headers: HeaderMap,
}

impl CorsPolicy {
    pub fn new(config: &CorsConfig, auth_header: &str) -> Result<Self, InvalidHeaderValue> {
        let allow_headers = format!("Content-Type, {auth_header}, User-Agent");

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_str(&allow_headers)?,
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_str(&config.allow_origin)?,
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );

        Ok(CorsPolicy { headers })
    }

    /// Adds the CORS headers, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }

    /// Answers an `OPTIONS` request.
    ///
    /// A real preflight (Origin plus the requested method and headers) gets the CORS
    /// headers; any other `OPTIONS` request only learns the allowed methods.
    pub fn preflight(&self, request_headers: &HeaderMap) -> Response<RelayBody> {
        let mut response = Response::new(empty_body());

        if is_preflight(request_headers) {
            let headers = response.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            self.apply(headers);
        } else {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }

        response
    }
}

fn is_preflight(headers: &HeaderMap) -> bool {
    [
        ORIGIN,
        ACCESS_CONTROL_REQUEST_METHOD,
        ACCESS_CONTROL_REQUEST_HEADERS,
    ]
    .iter()
    .all(|name| headers.get(name).is_some_and(|v| !v.is_empty()))
}
