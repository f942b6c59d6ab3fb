//! Factory for appending new steps to a protocol.
//!
//! Every step is placed after the current last step. Creation goes through
//! [`ElnProtocol::add_step`], so the handle passed in sees the new step on its
//! next read while other handles keep their cached list.

use crate::platform::{ChartDefinition, DataRecord, ElnEntryCriteria, ElnEntryType, PlatformResult};
use crate::protocol::{ElnProtocol, ElnStep};

/// Name given to free-text steps.
pub const TEXT_STEP_NAME: &str = "Text Entry";

/// Appends a form step showing `record`.
pub async fn create_form_step(
    protocol: &ElnProtocol,
    step_name: &str,
    data_type_name: &str,
    record: &DataRecord,
) -> PlatformResult<ElnStep> {
    let order = protocol.next_order().await?;
    let mut criteria =
        ElnEntryCriteria::new(ElnEntryType::Form, step_name, order).with_data_type(data_type_name);
    criteria.record_id = Some(record.record_id);
    protocol.add_step(criteria).await
}

/// Appends an empty table step holding records of `data_type_name`.
pub async fn create_table_step(
    protocol: &ElnProtocol,
    step_name: &str,
    data_type_name: &str,
) -> PlatformResult<ElnStep> {
    let order = protocol.next_order().await?;
    let criteria =
        ElnEntryCriteria::new(ElnEntryType::Table, step_name, order).with_data_type(data_type_name);
    protocol.add_step(criteria).await
}

/// Appends a free-text step.
pub async fn create_text_step(protocol: &ElnProtocol, text: &str) -> PlatformResult<ElnStep> {
    let order = protocol.next_order().await?;
    let mut criteria = ElnEntryCriteria::new(ElnEntryType::Text, TEXT_STEP_NAME, order);
    criteria.text_content = Some(text.to_string());
    protocol.add_step(criteria).await
}

/// Appends a bar chart over the records of `source`.
pub async fn create_chart_step(
    protocol: &ElnProtocol,
    source: &ElnStep,
    title: &str,
    x_axis_field: &str,
    y_axis_field: &str,
) -> PlatformResult<ElnStep> {
    let order = protocol.next_order().await?;
    let mut criteria = ElnEntryCriteria::new(ElnEntryType::Dashboard, title, order);
    criteria.source_entry_id = Some(source.id());
    criteria.chart = Some(ChartDefinition {
        title: title.to_string(),
        x_axis_field: x_axis_field.to_string(),
        y_axis_field: y_axis_field.to_string(),
    });
    protocol.add_step(criteria).await
}
