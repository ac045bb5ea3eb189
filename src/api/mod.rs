use std::{sync::Arc, time::Duration};

use axum::{extract::DefaultBodyLimit, response::IntoResponse, routing::get, Json, Router};
use tower_http::trace::TraceLayer;

use crate::{config::RelayConfig, errors::AppError, relay};

#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub relay: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(client: reqwest::Client, relay: RelayConfig) -> Self {
        Self {
            client,
            relay: Arc::new(relay),
        }
    }

    /// Builds the shared upstream client with the relay's timeout.
    pub fn from_config(relay: RelayConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(relay.upstream_timeout_ms))
            .build()?;
        Ok(Self::new(client, relay))
    }
}

pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.relay.max_body_bytes;
    Router::new()
        .route("/healthz", get(liveness))
        .merge(relay::router(&state.relay))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "alive": true }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::{router, AppState};
    use crate::config::RelayConfig;

    fn test_app(relay: RelayConfig) -> axum::Router {
        router(AppState::from_config(relay).unwrap())
    }

    #[tokio::test]
    async fn liveness_reports_alive() {
        let app = test_app(RelayConfig::new("http://127.0.0.1:9"));

        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["alive"], true);
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected_before_relaying() {
        let app = test_app(RelayConfig {
            max_body_bytes: 16,
            ..RelayConfig::new("http://127.0.0.1:9")
        });

        let response = app
            .oneshot(
                Request::post("/api/proxy/orders")
                    .body(Body::from(vec![b'x'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn paths_outside_the_mount_are_not_relayed() {
        let app = test_app(RelayConfig::new("http://127.0.0.1:9"));

        let response = app
            .oneshot(Request::get("/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn custom_mount_prefix_is_honoured() {
        let app = test_app(RelayConfig {
            mount_prefix: "/bff".to_owned(),
            ..RelayConfig::new("http://127.0.0.1:9")
        });

        let response = app
            .oneshot(Request::get("/api/proxy/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
