use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("upstream request failed")]
    Upstream(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: String,
}

const PROXY_ERROR_CODE: &str = "proxy_error";
const PROXY_ERROR_MESSAGE: &str = "Proxy error";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match &self {
            AppError::Database(err) => {
                tracing::error!(error = ?err, "database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_owned(),
                )
            }
            AppError::Unavailable(message) => {
                tracing::error!(message, "store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "Service unavailable".to_owned(),
                )
            }
            AppError::Internal(message) => {
                tracing::error!(message, "proxy error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    PROXY_ERROR_CODE,
                    PROXY_ERROR_MESSAGE.to_owned(),
                )
            }
            AppError::Upstream(err) => {
                tracing::error!(error = ?err, "upstream request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    PROXY_ERROR_CODE,
                    PROXY_ERROR_MESSAGE.to_owned(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message: msg },
            }),
        )
            .into_response()
    }
}
