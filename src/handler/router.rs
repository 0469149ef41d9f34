//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Dispatch order: the JSON body
//! limit, then the public directory, then the API routes and `/`, then 404.
//! The public directory is consulted first, so a file at `public/api/health`
//! shadows the health route.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH,
    CONTENT_TYPE, IF_NONE_MATCH, RANGE, REFERER, SERVER, USER_AGENT,
};
use hyper::{Method, Request};

use crate::config::AppState;
use crate::handler::{api, static_files};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
#[derive(Debug)]
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            path: req.uri().path(),
            query: req.uri().query(),
            if_none_match: header_string(req.headers(), &IF_NONE_MATCH),
            range_header: header_string(req.headers(), &RANGE),
        }
    }
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body: no route reads it.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();

    let mut response = route_request(&req, &state).await;

    if let Ok(server_name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }
    if state.config.http.enable_cors {
        response
            .headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }

    // HEAD keeps the GET headers, including Content-Length, but sends no body
    if req.method() == Method::HEAD {
        *response.body_mut() = Full::new(Bytes::new());
    }

    if state.access_log() {
        log_access(&req, &response, remote_addr, started, &state);
    }

    Ok(response)
}

/// Body limit, public directory, then routes
async fn route_request<B>(req: &Request<B>, state: &AppState) -> HttpResponse {
    // 1. JSON body limit applies to every method and path
    if let Some(resp) = check_json_body_size(req.headers(), state.config.http.max_body_size) {
        return resp;
    }

    let ctx = RequestContext::from_request(req);
    let route = normalize_route(ctx.path);

    // 2. Only GET and HEAD are served; OPTIONS is answered for routed paths
    match *req.method() {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS if is_routed(route) => {
            return http::build_options_response(state.config.http.enable_cors);
        }
        _ => return http::build_404_response(),
    }

    // 3. Public directory
    if let Some(resp) = static_files::serve_public(&ctx, state).await {
        return resp;
    }

    // 4. API routes and the landing page
    if route.eq_ignore_ascii_case(api::HEALTH_PATH) {
        api::health()
    } else if route.eq_ignore_ascii_case(api::MESSAGE_PATH) {
        api::message(&state.config.app)
    } else if route == "/" {
        static_files::serve_index(&ctx, state).await
    } else {
        http::build_404_response()
    }
}

/// Drop a single trailing slash so `/api/health/` routes like `/api/health`
fn normalize_route(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Whether a normalized path has a route of its own
fn is_routed(route: &str) -> bool {
    route == "/"
        || route.eq_ignore_ascii_case(api::HEALTH_PATH)
        || route.eq_ignore_ascii_case(api::MESSAGE_PATH)
}

/// `Content-Type` is `application/json`, parameters ignored
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Return 413 when a JSON body's Content-Length exceeds the limit
fn check_json_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<HttpResponse> {
    if !is_json(headers) {
        return None;
    }
    let size_str = headers.get(CONTENT_LENGTH)?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
    }
}

fn log_access<B>(
    req: &Request<B>,
    response: &HttpResponse,
    remote_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0".to_string(),
        hyper::Version::HTTP_2 => "2".to_string(),
        _ => "1.1".to_string(),
    };
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_string(req.headers(), &REFERER);
    entry.user_agent = header_string(req.headers(), &USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::collections::HashMap;

    const PEER: &str = "127.0.0.1:50000";

    fn test_state(public_dir: &std::path::Path, overrides: &[(&str, &str)]) -> Arc<AppState> {
        let mut vars: HashMap<String, String> = overrides
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        vars.insert("DEMO_CONFIG".into(), "does-not-exist/config".into());
        vars.insert(
            "DEMO__APP__PUBLIC_DIR".into(),
            public_dir.to_string_lossy().into_owned(),
        );
        vars.insert("DEMO__LOGGING__ACCESS_LOG".into(), "false".into());
        let cfg = Config::load_from(&vars).unwrap();
        Arc::new(AppState::new(&cfg))
    }

    fn public_fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<!DOCTYPE html><h1>hi</h1>").unwrap();
        std::fs::write(dir.path().join("style.css"), "body { color: #333; }").unwrap();
        dir
    }

    async fn send(state: &Arc<AppState>, req: Request<()>) -> HttpResponse {
        handle_request(req, Arc::clone(state), PEER.parse().unwrap())
            .await
            .unwrap()
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_route() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);
        let response = send(&state, get("/api/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "pipeline-demo/1.0.0");

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
        assert_eq!(body["version"], "1.0.0");
    }

    #[tokio::test]
    async fn test_message_route_reports_environment() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[("NODE_ENV", "production")]);
        let body = body_json(send(&state, get("/api/message")).await).await;
        assert_eq!(body["message"], "Hello from CI/CD Pipeline!");
        assert_eq!(body["environment"], "production");

        let state = test_state(dir.path(), &[]);
        let body = body_json(send(&state, get("/api/message")).await).await;
        assert_eq!(body["environment"], "development");
    }

    #[tokio::test]
    async fn test_api_routes_tolerate_trailing_slash_and_case() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);
        assert_eq!(send(&state, get("/api/health/")).await.status(), StatusCode::OK);
        assert_eq!(send(&state, get("/API/Message")).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_root_serves_html() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);
        let response = send(&state, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.contains("html"));
    }

    #[tokio::test]
    async fn test_root_without_index_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), &[]);
        assert_eq!(send(&state, get("/")).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_asset_and_fallthrough() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);

        let response = send(&state, get("/style.css")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/css; charset=utf-8");
        assert_eq!(response.headers()["cache-control"], "public, max-age=0");

        assert_eq!(send(&state, get("/missing.png")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(send(&state, get("/api/unknown")).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_conditional_get() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);
        let first = send(&state, get("/style.css")).await;
        let etag = first.headers()["etag"].clone();

        let req = Request::builder()
            .uri("/style.css")
            .header(IF_NONE_MATCH, etag)
            .body(())
            .unwrap();
        assert_eq!(send(&state, req).await.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_range_request() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);
        let req = Request::builder()
            .uri("/style.css")
            .header(RANGE, "bytes=0-3")
            .body(())
            .unwrap();
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "body");

        let req = Request::builder()
            .uri("/style.css")
            .header(RANGE, "bytes=1000-")
            .body(())
            .unwrap();
        assert_eq!(send(&state, req).await.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[tokio::test]
    async fn test_head_has_headers_but_no_body() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);
        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/api/message")
            .body(())
            .unwrap();
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        let length: usize = response.headers()[CONTENT_LENGTH].to_str().unwrap().parse().unwrap();
        assert!(length > 0);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    fn request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    #[tokio::test]
    async fn test_unrouted_methods_fall_through_to_404() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);

        let cases = [
            (Method::POST, "/api/health"),
            (Method::POST, "/api/message"),
            (Method::PUT, "/style.css"),
            (Method::DELETE, "/nowhere"),
            (Method::OPTIONS, "/nowhere"),
            (Method::OPTIONS, "/style.css"),
        ];
        for (method, uri) in cases {
            let response = send(&state, request(method.clone(), uri)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_options_on_routed_paths() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);

        for uri in ["/", "/api/health", "/api/message/"] {
            let response = send(&state, request(Method::OPTIONS, uri)).await;
            assert_eq!(response.status(), StatusCode::NO_CONTENT, "OPTIONS {uri}");
            assert!(response.headers().contains_key("allow"));
        }
    }

    fn with_body_headers(uri: &str, content_type: &str, length: &str) -> Request<()> {
        Request::builder()
            .uri(uri)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, length)
            .body(())
            .unwrap()
    }

    #[tokio::test]
    async fn test_oversized_json_body_rejected() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[("DEMO__HTTP__MAX_BODY_SIZE", "10")]);

        let req = with_body_headers("/api/health", "application/json", "11");
        assert_eq!(send(&state, req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let req = with_body_headers("/nowhere", "Application/JSON; charset=utf-8", "11");
        assert_eq!(send(&state, req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let req = with_body_headers("/api/health", "application/json", "10");
        assert_eq!(send(&state, req).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_size_limit_ignores_other_content_types() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[]);

        let req = with_body_headers("/api/health", "text/plain", "200000");
        assert_eq!(send(&state, req).await.status(), StatusCode::OK);

        let req = Request::builder()
            .uri("/api/health")
            .header(CONTENT_LENGTH, "200000")
            .body(())
            .unwrap();
        assert_eq!(send(&state, req).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_percent_encoded_asset() {
        let dir = public_fixture();
        std::fs::write(dir.path().join("my file.css"), "p { margin: 0; }").unwrap();
        std::fs::write(dir.path().join("caf\u{e9}.css"), "p {}").unwrap();
        let state = test_state(dir.path(), &[]);

        let response = send(&state, get("/my%20file.css")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/css; charset=utf-8");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "p { margin: 0; }");

        assert_eq!(send(&state, get("/caf%C3%A9.css")).await.status(), StatusCode::OK);
        assert_eq!(send(&state, get("/my%2Ffile.css")).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_directory_redirects_to_trailing_slash() {
        let dir = public_fixture();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("index.html"), "<h1>docs</h1>").unwrap();
        let state = test_state(dir.path(), &[]);

        let response = send(&state, get("/docs?page=2")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[hyper::header::LOCATION], "/docs/?page=2");

        let response = send(&state, get("/docs/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "<h1>docs</h1>");
    }

    #[tokio::test]
    async fn test_public_files_shadow_api_routes() {
        let dir = public_fixture();
        std::fs::create_dir(dir.path().join("api")).unwrap();
        std::fs::write(dir.path().join("api").join("health"), "static health").unwrap();
        let state = test_state(dir.path(), &[]);

        let response = send(&state, get("/api/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "static health");

        // Routes without a matching file are unaffected
        let body = body_json(send(&state, get("/api/message")).await).await;
        assert_eq!(body["message"], "Hello from CI/CD Pipeline!");
    }

    #[tokio::test]
    async fn test_cors_header_when_enabled() {
        let dir = public_fixture();
        let state = test_state(dir.path(), &[("DEMO__HTTP__ENABLE_CORS", "true")]);
        let response = send(&state, get("/api/health")).await;
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[test]
    fn test_is_routed() {
        assert!(is_routed("/"));
        assert!(is_routed("/API/health"));
        assert!(!is_routed("/style.css"));
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route("/api/health/"), "/api/health");
        assert_eq!(normalize_route("/api/health"), "/api/health");
    }
}
