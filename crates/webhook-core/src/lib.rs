//! webhook-core - the automation contract between the ELN platform and its webhooks.
//!
//! - [`context`] / [`result`]: one invocation's input and output
//! - [`handler`]: the handler trait, its interactive variant and handler types
//! - [`callback`]: forms, user responses and the two-round protocol state
//! - [`registry`]: the fixed path → handler table
//! - [`protocol`] / [`steps`]: ordered navigation over experiment steps
//! - [`platform`]: ports onto the external platform; [`memory`] implements them in-process

pub mod callback;
pub mod context;
pub mod error;
pub mod handler;
pub mod memory;
pub mod platform;
pub mod protocol;
pub mod registry;
pub mod result;
pub mod steps;

pub use callback::{CallbackRequest, CallbackResult, FieldDefinition, FieldResponses, FormBuilder};
pub use context::{InvocationContext, WebhookPayload};
pub use error::{CallbackError, HandlerError, HandlerResult, PlatformError, RouteError};
pub use handler::{HandlerKind, HandlerType, Interactive, InteractiveHandler, WebhookHandler};
pub use memory::MemoryPlatform;
pub use platform::{PlatformConnector, PlatformHandle};
pub use protocol::{ElnProtocol, ElnStep};
pub use registry::{RouteRegistry, RouteRegistryBuilder};
pub use result::InvocationResult;
