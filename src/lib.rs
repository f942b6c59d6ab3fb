//! eln-webhooks - the demo webhook set served to the ELN platform.
//!
//! [`routes`] holds the fixed path table; [`handlers`] the handlers behind it.
//! The HTTP server itself lives in `webhook-server`.

pub mod handlers;
pub mod routes;

pub use routes::{build_registry, route_table};
