use crate::errors::RelayError;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use shared::http::make_boxed_error_response;

pub type RelayBody = BoxBody<Bytes, RelayError>;

pub const SUCCESS_MESSAGE: &str = "Successfully submitted case.";

/// JSON body of every form response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    pub message: String,
}

impl RelayResponse {
    pub fn success() -> Self {
        RelayResponse {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        RelayResponse {
            success: false,
            message: message.into(),
        }
    }
}

/// Serializes a value to a JSON body.
pub fn serialize_to_body<T: Serialize>(value: &T) -> Result<RelayBody, RelayError> {
    let bytes = serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| RelayError::InternalError(format!("Failed to serialize response: {e}")))?;
    Ok(Full::new(bytes).map_err(|e| match e {}).boxed())
}

pub fn empty_body() -> RelayBody {
    Empty::new().map_err(|e| match e {}).boxed()
}

pub fn json_response(status: StatusCode, body: &RelayResponse) -> Response<RelayBody> {
    match serialize_to_body(body) {
        Ok(body) => {
            let mut response = Response::new(body);
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build response");
            make_boxed_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
