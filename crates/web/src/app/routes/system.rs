use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::app::AppState;
use crate::app::errors::json_error;

/// Body of `GET /api/health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub service: String,
    pub timestamp: String,
    pub environment: String,
    pub port: u16,
    pub protocol: String,
    pub host: String,
    pub base_url: String,
    pub ssl: bool,
}

/// Scheme the client used, honoring a TLS-terminating proxy.
fn request_protocol(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "http".to_string())
}

fn request_host(headers: &HeaderMap, port: u16) -> String {
    ["x-forwarded-host", header::HOST.as_str()]
        .iter()
        .find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{port}"))
}

pub async fn health(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let config = &state.config;
    let protocol = request_protocol(&headers);
    let host = request_host(&headers, config.port);
    let base_url = config
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("{protocol}://{host}"));

    let report = HealthReport {
        status: "healthy",
        service: config.service_name.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: config.environment.clone(),
        port: config.port,
        ssl: protocol == "https",
        protocol,
        host,
        base_url,
    };

    let mut response = Json(report).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

pub async fn not_found(uri: Uri) -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("no route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_headers_win() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("10.0.0.5:3000"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("mall.example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("HTTPS, http"));

        assert_eq!(request_protocol(&headers), "https");
        assert_eq!(request_host(&headers, 3000), "mall.example.com");
    }

    #[test]
    fn falls_back_to_plain_http_on_localhost() {
        let headers = HeaderMap::new();
        assert_eq!(request_protocol(&headers), "http");
        assert_eq!(request_host(&headers, 4000), "localhost:4000");
    }
}
