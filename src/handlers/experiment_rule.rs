use async_trait::async_trait;
use webhook_core::{
    HandlerError, HandlerResult, InvocationContext, InvocationResult, WebhookHandler,
};

use super::require_protocol;

/// Field reported for every record of the triggering entry.
pub const REPORTED_FIELD: &str = "NewField";

/// ELN rule that logs the entries it fired on and the first entry's values.
#[derive(Debug, Default)]
pub struct ExperimentRule;

#[async_trait]
impl WebhookHandler for ExperimentRule {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let protocol = require_protocol(context)?;
        let entries = context.experiment_entry_list();
        let names: Vec<&str> = entries.iter().map(|e| e.entry_name.as_str()).collect();
        tracing::info!(entries = %names.join(","), "Experiment entries of rule");
        tracing::info!(
            experiment = %protocol.eln_experiment().notebook_experiment_name,
            "Notebook experiment of rule"
        );

        let first = entries
            .first()
            .ok_or(HandlerError::MissingContext("a triggering entry"))?;
        let records = context
            .eln_manager()
            .get_data_records_for_entry(protocol.get_id(), first.entry_id)
            .await?;
        let values: Vec<String> = records
            .iter()
            .map(|r| match r.get_field_value(REPORTED_FIELD) {
                Some(value) => value.to_string(),
                None => "null".to_string(),
            })
            .collect();
        tracing::info!(values = %values.join(","), "Record values were");

        Ok(InvocationResult::success())
    }
}
