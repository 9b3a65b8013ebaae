//! JSON body parsing middleware.
//!
//! Installed on every route. Requests declaring `Content-Type:
//! application/json` are buffered, size-checked and parsed once; the parsed
//! value is attached as a [`JsonBody`] extension and the raw bytes are put
//! back so later extractors still see the body. Other requests pass through
//! untouched.
//!
//! Rules:
//! - charset, if present, must be UTF-8 (415 otherwise)
//! - `Content-Encoding`, if still present, must be `identity` (415 otherwise);
//!   gzip and deflate are inflated by the decompression layer in front of this
//! - bodies over the configured limit are rejected (413)
//! - an empty body parses as `{}`
//! - the top level must be an object or array (400 otherwise)

use std::error::Error as StdError;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};

use crate::http::response::ApiError;

/// Parsed JSON request body, available as a request extension.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

/// Settings for [`parse_json_body`].
#[derive(Debug, Clone, Copy)]
pub struct JsonBodyConfig {
    /// Maximum body size in bytes.
    pub limit: usize,
}

/// Middleware entry point, used with `axum::middleware::from_fn_with_state`.
pub async fn parse_json_body(
    State(config): State<JsonBodyConfig>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(charset) = json_charset(request.headers()) else {
        return Ok(next.run(request).await);
    };
    if let Some(charset) = charset {
        if charset != "utf-8" && charset != "utf8" {
            return Err(ApiError::UnsupportedCharset(charset));
        }
    }
    if let Some(encoding) = content_encoding(request.headers()) {
        if encoding != "identity" {
            return Err(ApiError::UnsupportedEncoding(encoding));
        }
    }

    let (parts, body) = request.into_parts();

    if content_length(&parts.headers).is_some_and(|len| len > config.limit) {
        return Err(ApiError::PayloadTooLarge { limit: config.limit });
    }

    let bytes = axum::body::to_bytes(body, config.limit)
        .await
        .map_err(|e| {
            let inner = e.into_inner();
            if is_length_limit(&*inner) {
                ApiError::PayloadTooLarge { limit: config.limit }
            } else {
                ApiError::BodyRead(inner.to_string())
            }
        })?;

    let value = parse_strict(&bytes)?;

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(JsonBody(value));
    Ok(next.run(request).await)
}

/// `None` when the request is not JSON, otherwise the lowercased charset
/// parameter if one was given.
fn json_charset(headers: &HeaderMap) -> Option<Option<String>> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mut params = content_type.split(';');

    let essence = params.next()?.trim();
    if !essence.eq_ignore_ascii_case("application/json") {
        return None;
    }

    let charset = params.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
    });
    Some(charset)
}

fn content_encoding(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_ENCODING)?;
    Some(
        value
            .to_str()
            .unwrap_or("unknown")
            .trim()
            .to_ascii_lowercase(),
    )
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn is_length_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

fn parse_strict(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ApiError::MalformedJson(e.to_string()))?;
    if !(value.is_object() || value.is_array()) {
        return Err(ApiError::MalformedJson(
            "top-level value must be an object or array".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn detects_json_content_type() {
        assert_eq!(json_charset(&headers("application/json")), Some(None));
        assert_eq!(
            json_charset(&headers("Application/JSON; charset=\"UTF-8\"")),
            Some(Some("utf-8".to_string()))
        );
        assert_eq!(json_charset(&headers("text/plain")), None);
        assert_eq!(json_charset(&headers("application/x-www-form-urlencoded")), None);
        assert_eq!(json_charset(&HeaderMap::new()), None);
    }

    #[test]
    fn reads_content_encoding() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_encoding(&headers), None);
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static(" GZip "));
        assert_eq!(content_encoding(&headers).as_deref(), Some("gzip"));
    }

    #[test]
    fn strict_parsing() {
        assert_eq!(parse_strict(b"").unwrap(), json!({}));
        assert_eq!(parse_strict(b"  \n").unwrap(), json!({}));
        assert_eq!(parse_strict(br#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(parse_strict(b"[1,2]").unwrap(), json!([1, 2]));
        assert!(matches!(parse_strict(b"42"), Err(ApiError::MalformedJson(_))));
        assert!(matches!(parse_strict(b"\"str\""), Err(ApiError::MalformedJson(_))));
        assert!(matches!(parse_strict(b"{\"a\":"), Err(ApiError::MalformedJson(_))));
    }

    #[tokio::test]
    async fn length_limit_found_in_chain() {
        let err = axum::body::to_bytes(Body::from("0123456789"), 4)
            .await
            .unwrap_err()
            .into_inner();
        assert!(is_length_limit(&*err));

        let other = std::io::Error::other("boom");
        assert!(!is_length_limit(&other));
    }
}
