use async_trait::async_trait;
use webhook_core::platform::{EntryUpdateCriteria, ExperimentEntryStatus};
use webhook_core::{
    HandlerError, HandlerResult, InvocationContext, InvocationResult, WebhookHandler,
};

/// Position of the first user-visible entry; index 0 is the hidden overview.
const FIRST_VISIBLE_ENTRY: usize = 1;

/// Experiment-creation rule: completes the experiment's first visible entry.
#[derive(Debug, Default)]
pub struct AutoCompleteFirstEntry;

#[async_trait]
impl WebhookHandler for AutoCompleteFirstEntry {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let Some(protocol) = context.active_protocol() else {
            let message = "Error: Protocol was None";
            tracing::warn!("{}", message);
            return Ok(InvocationResult::failure(message));
        };

        let experiment_id = protocol.get_id();
        let entries = context
            .eln_manager()
            .get_experiment_entry_list(experiment_id)
            .await?;
        let first_entry = entries
            .get(FIRST_VISIBLE_ENTRY)
            .ok_or(HandlerError::MissingContext("a visible experiment entry"))?;

        let update = EntryUpdateCriteria {
            entry_status: Some(ExperimentEntryStatus::Completed),
            ..EntryUpdateCriteria::default()
        };
        context
            .eln_manager()
            .update_experiment_entry(experiment_id, first_entry.entry_id, update)
            .await?;

        tracing::info!(
            experiment_id,
            entry_id = first_entry.entry_id,
            "Completed first entry"
        );
        Ok(InvocationResult::success())
    }
}
