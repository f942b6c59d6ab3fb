//! webhook-server - HTTP front door for ELN webhooks.
//!
//! Binds the route registry to an axum router, bounds every handler run, maps
//! failures to status codes, and talks to the platform over REST.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod rest;
pub mod router;

pub use config::{ConfigError, WebhookConfig};
pub use dispatcher::AppState;
pub use error::{DispatchError, ErrorBody};
pub use rest::RestConnector;
pub use router::build_router;
