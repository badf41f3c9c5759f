//! Gateway failures and their HTTP rendering.
//!
//! Every error leaves the gateway as `{"error": "..."}`. Upstream statuses the
//! backend chose are passed through; transport and provider failures become
//! 502.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use tracing::error;

use crate::trace::TraceId;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The backend could not be reached or its response could not be read.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    /// The backend answered a bridged call with a non-success status.
    #[error("upstream answered {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    /// Google rejected the code exchange or the profile lookup.
    #[error("google sign-in failed: {0}")]
    OAuth(String),
    #[error("oauth session unavailable: {0}")]
    Session(String),
    /// A feature the request needs is not configured.
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl GatewayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Message shown to the browser. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Upstream(_) => "Upstream service unavailable".to_owned(),
            Self::UpstreamStatus { body, .. } => upstream_message(body),
            Self::OAuth(_) => "Google sign-in failed".to_owned(),
            Self::Session(_) => "Internal server error".to_owned(),
            Self::Config(message) | Self::BadRequest(message) => message.clone(),
        }
    }
}

/// Prefer the backend's own `message` field when it sent a JSON error.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| "Upstream request failed".to_owned())
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(_) | Self::OAuth(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            let trace_id = TraceId::current().map(|id| id.to_string());
            error!(error = %self, status = status.as_u16(), trace_id, "gateway request failed");
        }
        HttpResponse::build(status).json(ErrorBody {
            error: &self.public_message(),
        })
    }
}
