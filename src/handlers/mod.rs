//! Webhook handlers bound by the route table.
//!
//! Each handler is a unit struct built fresh for every call. Data-type and
//! field names (`Sample`, `SampleId`, ...) are the platform's stock schema.

use webhook_core::{ElnProtocol, HandlerError, HandlerResult, InvocationContext};

pub mod aliquot_ratio;
pub mod basic;
pub mod entry_status;
pub mod experiment_rule;
pub mod feedback;
pub mod instrument_tracking;
pub mod sample_check;
pub mod step_creation;

pub use aliquot_ratio::AliquotRatio;
pub use basic::{HelloWorld, NewGoo};
pub use entry_status::AutoCompleteFirstEntry;
pub use experiment_rule::ExperimentRule;
pub use feedback::UserFeedback;
pub use instrument_tracking::AddInstrumentTracking;
pub use sample_check::CheckNumberSamples;
pub use step_creation::{BarChart, SampleCreation, StepCreation};

/// Data type held by sample tables.
pub const SAMPLE_TYPE: &str = "Sample";

/// The experiment the webhook was fired from, or a missing-context error.
pub(crate) fn require_protocol(context: &InvocationContext) -> HandlerResult<&ElnProtocol> {
    context
        .active_protocol()
        .ok_or(HandlerError::MissingContext("an active experiment"))
}
