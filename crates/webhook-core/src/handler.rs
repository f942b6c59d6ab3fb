//! Handler abstraction.
//!
//! Every webhook is a [`WebhookHandler`]. Two-round handlers implement
//! [`InteractiveHandler`] instead and are adapted by [`Interactive`], which
//! drives the callback protocol and leaves the handler three narrow hooks.
//! Routes bind paths to a [`HandlerType`], which builds a fresh handler per call.

use async_trait::async_trait;

use crate::callback::{CallbackRequest, CallbackRound, CallbackState, FieldResponses};
use crate::context::InvocationContext;
use crate::error::HandlerResult;
use crate::result::InvocationResult;

/// A unit of webhook behaviour: one context in, one result out.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult>;
}

/// A handler that asks the user something before doing its work.
#[async_trait]
pub trait InteractiveHandler: Send + Sync {
    /// Round one: the form to show.
    fn request(&self, context: &InvocationContext) -> HandlerResult<CallbackRequest>;

    /// Round two: the user submitted the form.
    async fn on_response(
        &self,
        context: &InvocationContext,
        responses: FieldResponses<'_>,
    ) -> HandlerResult<InvocationResult>;

    /// Round two: the user dismissed the form.
    fn on_cancel(&self, _context: &InvocationContext) -> InvocationResult {
        InvocationResult::success_with("You have Cancelled!")
    }
}

/// Runs an [`InteractiveHandler`] as a [`WebhookHandler`].
#[derive(Debug, Default)]
pub struct Interactive<H>(pub H);

#[async_trait]
impl<H: InteractiveHandler> WebhookHandler for Interactive<H> {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let state = CallbackState::on_entry(context.callback_result());
        let (next, result) = match context.round() {
            CallbackRound::First => {
                let request = self.0.request(context)?;
                (
                    CallbackState::AwaitingResponse,
                    InvocationResult::awaiting_response(request),
                )
            }
            CallbackRound::Cancelled => (CallbackState::Cancelled, self.0.on_cancel(context)),
            CallbackRound::Submitted(responses) => (
                CallbackState::Completed,
                self.0.on_response(context, responses).await?,
            ),
        };
        let next = state.transition(next)?;
        tracing::debug!(from = ?state, to = ?next, "Callback protocol advanced");
        Ok(result)
    }
}

/// Whether a handler type completes in one round or may ask for a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Stateless,
    Interactive,
}

/// Identifies a handler implementation and knows how to build one.
#[derive(Clone, Copy)]
pub struct HandlerType {
    name: &'static str,
    /// Fully qualified type path; two handlers in different modules may share `name`.
    type_path: &'static str,
    kind: HandlerKind,
    construct: fn() -> Box<dyn WebhookHandler>,
}

fn build_stateless<H: WebhookHandler + Default + 'static>() -> Box<dyn WebhookHandler> {
    Box::new(H::default())
}

fn build_interactive<H: InteractiveHandler + Default + 'static>() -> Box<dyn WebhookHandler> {
    Box::new(Interactive(H::default()))
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

impl HandlerType {
    pub fn stateless<H: WebhookHandler + Default + 'static>() -> Self {
        Self {
            name: short_type_name::<H>(),
            type_path: std::any::type_name::<H>(),
            kind: HandlerKind::Stateless,
            construct: build_stateless::<H>,
        }
    }

    pub fn interactive<H: InteractiveHandler + Default + 'static>() -> Self {
        Self {
            name: short_type_name::<H>(),
            type_path: std::any::type_name::<H>(),
            kind: HandlerKind::Interactive,
            construct: build_interactive::<H>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Builds a new handler instance. Instances are never shared between calls.
    pub fn instantiate(&self) -> Box<dyn WebhookHandler> {
        (self.construct)()
    }
}

impl std::fmt::Debug for HandlerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerType")
            .field("name", &self.name)
            .field("type_path", &self.type_path)
            .field("kind", &self.kind)
            .finish()
    }
}

impl PartialEq for HandlerType {
    fn eq(&self, other: &Self) -> bool {
        self.type_path == other.type_path && self.kind == other.kind
    }
}

impl Eq for HandlerType {}
