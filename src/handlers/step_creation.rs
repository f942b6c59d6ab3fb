//! Handlers that add steps and records to the active experiment.

use async_trait::async_trait;
use serde_json::json;
use webhook_core::platform::FieldMap;
use webhook_core::steps::{
    create_chart_step, create_form_step, create_table_step, create_text_step,
};
use webhook_core::{HandlerResult, InvocationContext, InvocationResult, WebhookHandler};

use super::{require_protocol, SAMPLE_TYPE};

pub const REQUEST_TYPE: &str = "Request";
pub const SAMPLES_STEP_NAME: &str = "Samples";

/// Number of samples accessioned per [`SampleCreation`] call.
pub const NEW_SAMPLE_COUNT: usize = 8;

/// Creates a request form, an empty sample table and a text note.
#[derive(Debug, Default)]
pub struct StepCreation;

#[async_trait]
impl WebhookHandler for StepCreation {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let protocol = require_protocol(context)?;
        let records = context.data_record_manager();

        let mut request = records.add_data_record(REQUEST_TYPE).await?;
        request.set_field_value(
            "RequestId",
            format!("Webhook Demo Request {}", chrono::Local::now().date_naive()),
        );
        records.commit_data_records(std::slice::from_ref(&request)).await?;

        // Each step lands after the last, so creation order is display order.
        create_form_step(protocol, "Request Data", REQUEST_TYPE, &request).await?;
        create_table_step(protocol, SAMPLES_STEP_NAME, SAMPLE_TYPE).await?;
        create_text_step(protocol, "Hello World!").await?;

        tracing::info!(
            experiment_id = protocol.get_id(),
            request_id = request.record_id,
            "Created request steps"
        );
        Ok(InvocationResult::success())
    }
}

/// Accessions a batch of blood samples into the experiment's sample table,
/// creating the table first when there is none.
#[derive(Debug, Default)]
pub struct SampleCreation;

#[async_trait]
impl WebhookHandler for SampleCreation {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let protocol = require_protocol(context)?;

        let sample_step = match protocol.get_first_step_of_type(SAMPLE_TYPE).await? {
            Some(step) => step,
            None => create_table_step(protocol, SAMPLES_STEP_NAME, SAMPLE_TYPE).await?,
        };

        let sample_ids = context
            .accession_manager()
            .accession_with_config_list(SAMPLE_TYPE, "SampleId", NEW_SAMPLE_COUNT)
            .await?;
        let field_maps: Vec<FieldMap> = sample_ids
            .into_iter()
            .map(|sample_id| {
                FieldMap::from([
                    ("ExemplarSampleType".to_string(), json!("Blood")),
                    ("SampleId".to_string(), json!(sample_id)),
                ])
            })
            .collect();

        let samples = context
            .data_record_manager()
            .add_data_records_with_data(SAMPLE_TYPE, field_maps)
            .await?;
        context
            .eln_manager()
            .add_records_to_table_entry(protocol.get_id(), sample_step.id(), &samples)
            .await?;

        tracing::info!(
            entry_id = sample_step.id(),
            count = samples.len(),
            "Added samples to table"
        );
        Ok(InvocationResult::success())
    }
}

/// Charts concentration per sample over the first sample table.
#[derive(Debug, Default)]
pub struct BarChart;

#[async_trait]
impl WebhookHandler for BarChart {
    async fn run(&self, context: &InvocationContext) -> HandlerResult<InvocationResult> {
        let protocol = require_protocol(context)?;

        let Some(sample_step) = protocol.get_first_step_of_type(SAMPLE_TYPE).await? else {
            return Ok(InvocationResult::success_with(
                "There are no sample step. Create it first.",
            ));
        };

        create_chart_step(
            protocol,
            &sample_step,
            "Concentration vs Sample ID",
            "SampleId",
            "Concentration",
        )
        .await?;
        Ok(InvocationResult::success())
    }
}
