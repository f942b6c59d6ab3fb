use async_trait::async_trait;
use webhook_core::{HandlerResult, InvocationContext, InvocationResult, WebhookHandler};

/// Logs a greeting on every call.
#[derive(Debug, Default)]
pub struct HelloWorld;

#[async_trait]
impl WebhookHandler for HelloWorld {
    async fn run(&self, _context: &InvocationContext) -> HandlerResult<InvocationResult> {
        tracing::info!("Hello World!");
        Ok(InvocationResult::success())
    }
}

/// On-save rule for new `Goo` records.
#[derive(Debug, Default)]
pub struct NewGoo;

#[async_trait]
impl WebhookHandler for NewGoo {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        match context.data_record() {
            Some(record) => tracing::info!(%record, "New Goo"),
            None => tracing::info!("New Goo without a triggering record"),
        }
        Ok(InvocationResult::success_with("New Goo!"))
    }
}
