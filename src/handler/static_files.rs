//! Static file serving module
//!
//! Resolves request paths inside the public directory, loads the file and
//! builds the response with `ETag`, conditional and Range support. Anything
//! that does not resolve falls through to the API routes.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use hyper::body::Bytes;
use percent_encoding::percent_decode_str;
use tokio::fs;

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::cache;
use crate::http::response::{build_cached_response, build_partial_response};
use crate::http::{self, mime, HttpResponse, RangeParseResult};
use crate::logger;

/// Result of mapping a request path onto the public directory
#[derive(Debug, PartialEq, Eq)]
pub enum PublicPath {
    /// Regular file inside the public directory
    File(PathBuf),
    /// Directory requested without a trailing slash
    Redirect,
    /// Nothing to serve here
    NotFound,
}

/// Serve the landing page for `GET /`
pub async fn serve_index(ctx: &RequestContext<'_>, state: &AppState) -> HttpResponse {
    match read_file(&state.index_path).await {
        Some(data) => build_file_response(ctx, state, data, mime::content_type_for_path(&state.index_path)),
        None => {
            logger::log_warning(&format!(
                "Index file not found: {}",
                state.index_path.display()
            ));
            http::build_404_response()
        }
    }
}

/// Serve an asset from the public directory
///
/// `None` means the public directory has nothing for this path and the
/// request continues to the API routes.
pub async fn serve_public(ctx: &RequestContext<'_>, state: &AppState) -> Option<HttpResponse> {
    match resolve_public_path(&state.public_dir, ctx.path, &state.config.app.index_file).await {
        PublicPath::File(file_path) => {
            let data = read_file(&file_path).await?;
            Some(build_file_response(ctx, state, data, mime::content_type_for_path(&file_path)))
        }
        PublicPath::Redirect => Some(http::build_301_response(&directory_location(ctx))),
        PublicPath::NotFound => None,
    }
}

/// `Location` for a directory redirect: the path with a trailing slash, query kept
fn directory_location(ctx: &RequestContext<'_>) -> String {
    // Collapse leading slashes so `//host/dir` cannot become a protocol-relative URL
    let path = ctx.path.trim_start_matches('/');
    match ctx.query {
        Some(query) => format!("/{path}/?{query}"),
        None => format!("/{path}/"),
    }
}

/// Percent-decode one path segment
///
/// Rejects invalid UTF-8, dotfiles (including `.` and `..`) and segments that
/// decode to a separator or NUL.
fn decode_segment(segment: &str) -> Option<Cow<'_, str>> {
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    if decoded.starts_with('.') || decoded.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
        return None;
    }
    Some(decoded)
}

fn is_within(root: &Path, resolved: &Path, request_path: &str) -> bool {
    if resolved.starts_with(root) {
        return true;
    }
    logger::log_warning(&format!(
        "Path traversal attempt blocked: {request_path} -> {}",
        resolved.display()
    ));
    false
}

/// Map a request path to a file inside `public_dir`
///
/// Segments are percent-decoded first. The canonical result must stay inside
/// `public_dir` and be a regular file. A directory resolves to its
/// `index_file` when the path ends in `/`, otherwise to a redirect.
pub async fn resolve_public_path(
    public_dir: &Path,
    request_path: &str,
    index_file: &str,
) -> PublicPath {
    let mut candidate = public_dir.to_path_buf();
    for segment in request_path.split('/').filter(|s| !s.is_empty()) {
        let Some(decoded) = decode_segment(segment) else {
            return PublicPath::NotFound;
        };
        candidate.push(decoded.as_ref());
    }

    let root = match fs::canonicalize(public_dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Public directory not found or inaccessible '{}': {e}",
                public_dir.display()
            ));
            return PublicPath::NotFound;
        }
    };

    // Missing files are the common fallthrough case, not worth a log line
    let Ok(mut resolved) = fs::canonicalize(&candidate).await else {
        return PublicPath::NotFound;
    };
    if !is_within(&root, &resolved, request_path) {
        return PublicPath::NotFound;
    }

    let Ok(metadata) = fs::metadata(&resolved).await else {
        return PublicPath::NotFound;
    };
    if metadata.is_dir() {
        if !request_path.ends_with('/') {
            return PublicPath::Redirect;
        }
        resolved = match fs::canonicalize(resolved.join(index_file)).await {
            Ok(p) => p,
            Err(_) => return PublicPath::NotFound,
        };
        if !is_within(&root, &resolved, request_path) {
            return PublicPath::NotFound;
        }
    }

    match fs::metadata(&resolved).await {
        Ok(m) if m.is_file() => PublicPath::File(resolved),
        _ => PublicPath::NotFound,
    }
}

async fn read_file(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path).await {
        Ok(data) => Some(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            None
        }
    }
}

/// Build a 200, 206, 304 or 416 response for file content
fn build_file_response(
    ctx: &RequestContext<'_>,
    state: &AppState,
    data: Vec<u8>,
    content_type: &str,
) -> HttpResponse {
    let etag = cache::generate_etag(&data);
    let cache_control = cache::public_cache_control(state.config.app.static_max_age);

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag, &cache_control);
    }

    let data = Bytes::from(data);
    let total = data.len();

    match http::parse_range_header(ctx.range_header.as_deref(), total) {
        RangeParseResult::Valid(range) => build_partial_response(
            data.slice(range.start..=range.end),
            content_type,
            &etag,
            &cache_control,
            range,
            total,
        ),
        RangeParseResult::NotSatisfiable => http::build_416_response(total),
        RangeParseResult::None => build_cached_response(data, content_type, &etag, &cache_control),
    }
}
