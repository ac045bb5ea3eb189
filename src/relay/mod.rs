//! Authenticated relay from the storefront origin to the upstream API.
//!
//! Calls under the mount prefix are re-issued against the upstream base with
//! the caller's bearer token. The upstream session cookie is handed back under
//! a cookie policy that is valid for the storefront's own origin.

pub mod cookies;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use url::Url;

use crate::{api::AppState, config::RelayConfig, errors::AppError};

pub fn router(config: &RelayConfig) -> Router<AppState> {
    let prefix = config.mount_prefix.as_str();
    Router::new()
        .route(prefix, any(relay))
        .route(&format!("{prefix}/"), any(relay))
        .route(&format!("{prefix}/*rest"), any(relay))
}

async fn relay(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let target = upstream_url(&state.relay, &uri)?;
    tracing::debug!(%method, %target, "relaying request");

    let authorization = headers
        .get(header::AUTHORIZATION)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(""));

    let mut request = state
        .client
        .request(method.clone(), target.clone())
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, authorization);
    if let Some(cookie) = headers.get(header::COOKIE) {
        request = request.header(header::COOKIE, cookie.clone());
    }
    if forwards_body(&method) {
        request = request.body(body);
    }

    let upstream = request.send().await?;
    let status = upstream.status();
    let session_cookies = cookies::translate_session_cookies(
        upstream.headers().get_all(header::SET_COOKIE),
        &state.relay,
    );
    let text = upstream.text().await?;
    tracing::debug!(%target, status = status.as_u16(), "upstream responded");

    let mut response = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(data) => (status, Json(data)).into_response(),
        Err(_) => (status, text).into_response(),
    };
    for cookie in session_cookies {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }

    Ok(response)
}

fn forwards_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn upstream_url(config: &RelayConfig, uri: &Uri) -> Result<Url, AppError> {
    let path_and_query = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or_else(|| uri.path());
    let forwarded = path_and_query
        .strip_prefix(config.mount_prefix.as_str())
        .unwrap_or(path_and_query);

    Url::parse(&format!("{}{}", config.upstream_base, forwarded))
        .map_err(|err| AppError::Internal(format!("invalid upstream url: {err}")))
}
