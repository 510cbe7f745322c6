use hyper::header::HeaderMap;

/// Checks the shared secret a form submission carries in `header`.
///
/// The header must be present, non-empty and exactly equal to `secret`.
pub fn is_authorized(headers: &HeaderMap, header: &str, secret: &str) -> bool {
    let Some(value) = headers.get(header) else {
        return false;
    };

    match value.to_str() {
        Ok(key) => !key.is_empty() && key == secret,
        Err(_) => false,
    }
}
