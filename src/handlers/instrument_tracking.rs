use async_trait::async_trait;
use webhook_core::platform::{ElnEntryCriteria, ElnEntryType};
use webhook_core::{HandlerResult, InvocationContext, InvocationResult, WebhookHandler};

use super::require_protocol;

pub const INSTRUMENT_TRACKING_NAME: &str = "Instrument Tracking Field Set";
pub const INSTRUMENT_TRACKING_FIELD_SET_ID: i64 = 109;

/// Toolbar action: appends the instrument tracking form to the experiment once.
///
/// The form is placed after the last step (highest order plus one).
#[derive(Debug, Default)]
pub struct AddInstrumentTracking;

#[async_trait]
impl WebhookHandler for AddInstrumentTracking {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let protocol = require_protocol(context)?;

        let steps = protocol.get_sorted_step_list().await?;
        if steps.iter().any(|s| s.name() == INSTRUMENT_TRACKING_NAME) {
            return Ok(InvocationResult::success_with(
                "The Instrument Tracking Field Set is already used in this Experiment.",
            ));
        }

        let mut criteria = ElnEntryCriteria::new(
            ElnEntryType::Form,
            INSTRUMENT_TRACKING_NAME,
            protocol.next_order().await?,
        );
        criteria.field_set_id = Some(INSTRUMENT_TRACKING_FIELD_SET_ID);
        let step = protocol.add_step(criteria).await?;

        tracing::info!(
            experiment_id = protocol.get_id(),
            entry_id = step.id(),
            "Added instrument tracking field set"
        );
        Ok(InvocationResult::success())
    }
}
