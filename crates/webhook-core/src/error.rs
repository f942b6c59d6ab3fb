//! Error types for the webhook core.
//!
//! Routing errors never reach handler code; everything a handler can raise is a
//! [`HandlerError`], which the dispatcher turns into a failure response.

use thiserror::Error;

/// Errors raised while building or querying the route registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Path '{0}' is already bound to a handler")]
    DuplicatePath(String),

    #[error("No handler registered for path '{0}'")]
    UnknownRoute(String),

    #[error("Invalid route path '{0}': paths must start with '/'")]
    InvalidPath(String),
}

/// Errors raised by the external platform (record, ELN and accessioning services).
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("Platform request failed: {0}")]
    Request(String),

    #[error("Platform returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode platform response: {0}")]
    Decode(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("No platform URL available for this invocation")]
    MissingEndpoint,
}

/// Errors raised while building or reading a callback form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    #[error("Form field '{0}' is defined more than once")]
    DuplicateField(String),

    #[error("Form '{0}' has no fields")]
    EmptyForm(String),

    #[error("Invalid callback transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: crate::callback::CallbackState,
        to: crate::callback::CallbackState,
    },
}

/// Errors a handler may propagate to the dispatcher.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Callback(#[from] CallbackError),

    #[error("Invocation context is missing {0}")]
    MissingContext(&'static str),

    #[error("Cannot compute {what}: denominator is zero")]
    DivisionUndefined { what: &'static str },

    #[error("{0}")]
    Failed(String),
}

pub type HandlerResult<T> = std::result::Result<T, HandlerError>;
