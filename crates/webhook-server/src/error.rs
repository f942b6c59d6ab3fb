//! Dispatch errors and their HTTP mapping.
//!
//! Every failure still answers with a JSON body in the shape of an invocation
//! result (`success: false`) plus a stable `errorKind` code. Detail is logged;
//! it reaches the caller only when the server runs in debug mode.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use webhook_core::{HandlerError, RouteError};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    UnknownRoute(#[from] RouteError),

    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("Malformed webhook context: {0}")]
    MalformedContext(#[source] serde_json::Error),

    #[error("Handler failed: {0}")]
    HandlerExecution(#[from] HandlerError),

    #[error("Handler did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Handler aborted: {0}")]
    Panicked(String),
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub display_text: String,
    pub error_kind: String,
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::MalformedContext(_) => StatusCode::BAD_REQUEST,
            DispatchError::HandlerExecution(_)
            | DispatchError::Timeout(_)
            | DispatchError::Panicked(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnknownRoute(_) => "unknown_route",
            DispatchError::MethodNotAllowed { .. } => "method_not_allowed",
            DispatchError::MalformedContext(_) => "malformed_context",
            DispatchError::HandlerExecution(_) => "handler_execution",
            DispatchError::Timeout(_) => "timeout",
            DispatchError::Panicked(_) => "handler_aborted",
        }
    }

    fn public_message(&self) -> String {
        match self {
            DispatchError::UnknownRoute(err) => err.to_string(),
            DispatchError::MethodNotAllowed { .. } => self.to_string(),
            DispatchError::MalformedContext(_) => "Malformed webhook context".to_string(),
            DispatchError::HandlerExecution(_) | DispatchError::Panicked(_) => {
                "The webhook failed to complete".to_string()
            }
            DispatchError::Timeout(limit) => {
                format!("The webhook did not complete within {}s", limit.as_secs())
            }
        }
    }

    pub fn body(&self, expose_detail: bool) -> ErrorBody {
        let display_text = if expose_detail {
            self.to_string()
        } else {
            self.public_message()
        };
        ErrorBody {
            success: false,
            display_text,
            error_kind: self.kind().to_string(),
        }
    }

    /// Response with detail included only when `expose_detail` is set.
    pub fn into_response_with(self, expose_detail: bool) -> Response {
        (self.status(), Json(self.body(expose_detail))).into_response()
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
