use async_trait::async_trait;
use webhook_core::platform::ExperimentEntry;
use webhook_core::{
    HandlerError, HandlerResult, InvocationContext, InvocationResult, WebhookHandler,
};

use super::require_protocol;

pub const SOURCE_SAMPLES_OPTION: &str = "SOURCE SAMPLES";
pub const SAMPLE_NUMBER_CHECK_OPTION: &str = "SAMPLE NUMBER CHECK";
pub const CORRECT_NUM_SAMPLES: usize = 5;

/// Passes the sample-number check entry when the source table holds exactly
/// [`CORRECT_NUM_SAMPLES`] samples.
///
/// The check record's `CorrectNumber` field is false until this handler sets it,
/// so a wrong count needs no action.
#[derive(Debug, Default)]
pub struct CheckNumberSamples;

#[async_trait]
impl WebhookHandler for CheckNumberSamples {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let experiment_id = require_protocol(context)?.get_id();
        let eln = context.eln_manager();

        let samples_table = entry_with_option(context, experiment_id, SOURCE_SAMPLES_OPTION)
            .await?
            .ok_or(HandlerError::MissingContext("an entry marked SOURCE SAMPLES"))?;
        let samples = eln
            .get_data_records_for_entry(experiment_id, samples_table.entry_id)
            .await?;
        if samples.len() != CORRECT_NUM_SAMPLES {
            tracing::debug!(count = samples.len(), "Sample count check not passed");
            return Ok(InvocationResult::success());
        }

        let check_entry = entry_with_option(context, experiment_id, SAMPLE_NUMBER_CHECK_OPTION)
            .await?
            .ok_or(HandlerError::MissingContext("an entry marked SAMPLE NUMBER CHECK"))?;
        let mut check_record = eln
            .get_data_records_for_entry(experiment_id, check_entry.entry_id)
            .await?
            .into_iter()
            .next()
            .ok_or(HandlerError::MissingContext("a sample number check record"))?;

        check_record.set_field_value("CorrectNumber", true);
        context
            .data_record_manager()
            .commit_data_records(std::slice::from_ref(&check_record))
            .await?;

        tracing::info!(record_id = check_record.record_id, "Sample count check passed");
        Ok(InvocationResult::success())
    }
}

/// First entry of the experiment carrying the entry option `option`.
pub async fn entry_with_option(
    context: &InvocationContext,
    experiment_id: i64,
    option: &str,
) -> HandlerResult<Option<ExperimentEntry>> {
    let eln = context.eln_manager();
    for entry in eln.get_experiment_entry_list(experiment_id).await? {
        let options = eln
            .get_experiment_entry_options(experiment_id, entry.entry_id)
            .await?;
        if options.contains_key(option) {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}
