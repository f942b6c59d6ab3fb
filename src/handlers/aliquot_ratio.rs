use async_trait::async_trait;
use webhook_core::protocol::record_ratio;
use webhook_core::{
    HandlerError, HandlerResult, InvocationContext, InvocationResult, WebhookHandler,
};

use super::{require_protocol, SAMPLE_TYPE};

/// Reports how many aliquots were taken per source sample.
///
/// The source table is the first `Sample` step; the aliquot table is the next
/// `Sample` step after it.
#[derive(Debug, Default)]
pub struct AliquotRatio;

#[async_trait]
impl WebhookHandler for AliquotRatio {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let protocol = require_protocol(context)?;

        let Some(sample_step) = protocol.get_first_step_of_type(SAMPLE_TYPE).await? else {
            return Ok(InvocationResult::success_with("There are no source sample table."));
        };
        let source_count = sample_step.get_records().await?.len();

        let Some(aliquot_step) = protocol.get_next_step(&sample_step, SAMPLE_TYPE).await? else {
            return Ok(InvocationResult::success_with("There are no aliquot sample table."));
        };
        let aliquot_count = aliquot_step.get_records().await?.len();

        match record_ratio(aliquot_count, source_count, "the aliquot to sample ratio") {
            // `{:?}` keeps the trailing `.0` on whole ratios (8 / 4 reads "2.0").
            Ok(ratio) => Ok(InvocationResult::success_with(format!(
                "The aliquot to sample ratio is: {:?}",
                ratio
            ))),
            Err(HandlerError::DivisionUndefined { .. }) => {
                tracing::warn!(
                    source_step = sample_step.id(),
                    aliquot_count,
                    "Source sample table is empty"
                );
                Ok(InvocationResult::success_with(
                    "The source sample table has no samples, so no ratio can be computed.",
                ))
            }
            Err(err) => Err(err),
        }
    }
}
