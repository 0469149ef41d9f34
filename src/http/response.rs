//! HTTP response building module
//!
//! Builders for the status codes the dispatcher produces, decoupled from routing.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ALLOW, CACHE_CONTROL, CONTENT_LENGTH,
    CONTENT_RANGE, CONTENT_TYPE, ETAG, LOCATION,
};
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::range::ByteRange;

/// Response type produced by every handler
pub type HttpResponse = Response<Full<Bytes>>;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Build a compact JSON response
///
/// Serialization failure degrades to a 500 with a JSON error body.
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(json) => finish(
            "JSON",
            Response::builder()
                .status(status)
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .header(CONTENT_LENGTH, json.len()),
            Bytes::from(json),
        ),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            build_500_response()
        }
    }
}

/// Build 200 response for a static asset with cache validators
pub fn build_cached_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    cache_control: &str,
) -> HttpResponse {
    finish(
        "200",
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, data.len())
            .header(ACCEPT_RANGES, "bytes")
            .header(ETAG, etag)
            .header(CACHE_CONTROL, cache_control),
        data,
    )
}

/// Build 206 Partial Content response for `range` of a `total` byte asset
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    cache_control: &str,
    range: ByteRange,
    total: usize,
) -> HttpResponse {
    finish(
        "206",
        Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, range.content_length())
            .header(CONTENT_RANGE, range.content_range(total))
            .header(ACCEPT_RANGES, "bytes")
            .header(ETAG, etag)
            .header(CACHE_CONTROL, cache_control),
        data,
    )
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, cache_control: &str) -> HttpResponse {
    finish(
        "304",
        Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(ETAG, etag)
            .header(CACHE_CONTROL, cache_control),
        Bytes::new(),
    )
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS);

    if enable_cors {
        builder = builder
            .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .header(ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
            .header(ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Range")
            .header(ACCESS_CONTROL_MAX_AGE, "86400");
    }

    finish("OPTIONS", builder, Bytes::new())
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 301 redirect, used for directories requested without a trailing slash
pub fn build_301_response(location: &str) -> HttpResponse {
    let body = format!("Redirecting to {location}");
    finish(
        "301",
        Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header(LOCATION, location)
            .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
            .header(CONTENT_LENGTH, body.len()),
        Bytes::from(body),
    )
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> HttpResponse {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(size: usize) -> HttpResponse {
    let mut response = build_text_response(StatusCode::RANGE_NOT_SATISFIABLE, "416 Range Not Satisfiable");
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
        response.headers_mut().insert(CONTENT_RANGE, value);
    }
    response
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> HttpResponse {
    let body = Bytes::from_static(br#"{"error":"Internal server error"}"#);
    finish(
        "500",
        Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(CONTENT_LENGTH, body.len()),
        body,
    )
}

fn build_text_response(status: StatusCode, text: &'static str) -> HttpResponse {
    finish(
        status.as_str(),
        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
            .header(CONTENT_LENGTH, text.len()),
        Bytes::from_static(text.as_bytes()),
    )
}

/// Attach the body, logging and degrading to an empty response if the builder failed
fn finish(kind: &str, builder: hyper::http::response::Builder, body: Bytes) -> HttpResponse {
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to build {kind} response: {e}"));
        Response::new(Full::new(Bytes::new()))
    })
}
