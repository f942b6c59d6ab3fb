//! Request lifecycle for one webhook call.
//!
//! resolve path → parse context → build a fresh handler → run it on its own
//! task under a time limit → serialize the result. Nothing survives the call:
//! the handler instance and context are dropped when it returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use webhook_core::{
    InvocationContext, InvocationResult, PlatformConnector, RouteRegistry, WebhookPayload,
};

use crate::config::WebhookConfig;
use crate::error::DispatchError;

/// Shared, read-only state of the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RouteRegistry>,
    pub connector: Arc<dyn PlatformConnector>,
    pub handler_timeout: Duration,
    /// Echo error detail back to the caller.
    pub debug: bool,
}

impl AppState {
    pub fn new(registry: Arc<RouteRegistry>, connector: Arc<dyn PlatformConnector>) -> Self {
        Self {
            registry,
            connector,
            handler_timeout: WebhookConfig::default().handler_timeout(),
            debug: false,
        }
    }

    pub fn with_config(mut self, config: &WebhookConfig) -> Self {
        self.handler_timeout = config.handler_timeout();
        self.debug = config.debug;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }
}

/// Fallback handler: every path not served by a fixed route lands here.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path();
    match invoke(&state, &method, path, &body).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            match &err {
                DispatchError::UnknownRoute(_)
                | DispatchError::MethodNotAllowed { .. }
                | DispatchError::MalformedContext(_) => {
                    tracing::warn!(%path, kind = err.kind(), "Rejected webhook call: {}", err);
                }
                _ => {
                    tracing::error!(%path, kind = err.kind(), "Webhook call failed: {}", err);
                }
            }
            err.into_response_with(state.debug)
        }
    }
}

/// Runs the webhook bound to `path` and returns its result.
pub async fn invoke(
    state: &AppState,
    method: &Method,
    path: &str,
    body: &[u8],
) -> Result<InvocationResult, DispatchError> {
    let handler_type = state.registry.resolve(path)?;
    if *method != Method::POST {
        return Err(DispatchError::MethodNotAllowed {
            method: method.to_string(),
            path: path.to_string(),
        });
    }

    let payload = WebhookPayload::from_slice(body).map_err(DispatchError::MalformedContext)?;
    let platform = state
        .connector
        .connect(payload.user.as_ref())
        .map_err(|e| DispatchError::HandlerExecution(e.into()))?;
    let context = InvocationContext::new(payload, platform);
    let round = context.round().label();

    tracing::debug!(%path, handler = handler_type.name(), round, "Dispatching webhook");

    let handler = handler_type.instantiate();
    let started = Instant::now();
    let task = tokio::spawn(async move { handler.run(&context).await });
    let abort = task.abort_handle();

    let outcome = match tokio::time::timeout(state.handler_timeout, task).await {
        Err(_) => {
            abort.abort();
            Err(DispatchError::Timeout(state.handler_timeout))
        }
        Ok(Err(join_err)) => Err(DispatchError::Panicked(join_err.to_string())),
        Ok(Ok(Err(handler_err))) => Err(DispatchError::HandlerExecution(handler_err)),
        Ok(Ok(Ok(result))) => Ok(result),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Ok(result) => tracing::info!(
            %path,
            handler = handler_type.name(),
            round,
            success = result.success,
            awaiting_response = result.is_awaiting_response(),
            elapsed_ms,
            "Webhook completed"
        ),
        Err(err) => tracing::info!(
            %path,
            handler = handler_type.name(),
            round,
            kind = err.kind(),
            elapsed_ms,
            "Webhook failed"
        ),
    }

    outcome
}
