use async_trait::async_trait;
use webhook_core::{
    CallbackRequest, FieldDefinition, FieldResponses, FormBuilder, HandlerResult,
    InteractiveHandler, InvocationContext, InvocationResult,
};

pub const FEELING_FIELD: &str = "Feeling";
pub const COMMENTS_FIELD: &str = "Comments";

/// Asks the user how they feel and reacts to the answer.
#[derive(Debug, Default)]
pub struct UserFeedback;

#[async_trait]
impl InteractiveHandler for UserFeedback {
    fn request(&self, _context: &InvocationContext) -> HandlerResult<CallbackRequest> {
        let form = FormBuilder::new("Feedback", "Please provide us with some feedback!")
            .add_field(
                FieldDefinition::boolean(FEELING_FIELD, "Are you feeling well?")
                    .required()
                    .editable(true)
                    .default_value(false),
            )
            .add_field(
                FieldDefinition::string(COMMENTS_FIELD, "Additional Comments")
                    .max_length(2000)
                    .editable(true),
            )
            .build()?;
        Ok(form)
    }

    async fn on_response(
        &self,
        _context: &InvocationContext,
        responses: FieldResponses<'_>,
    ) -> HandlerResult<InvocationResult> {
        // An unanswered Feeling reads as its default.
        let feeling = responses.get_bool(FEELING_FIELD).unwrap_or(false);
        let message = if feeling {
            "User felt very good! Nothing to do here...".to_string()
        } else {
            format!(
                "=_= User didn't feel very good. The comment left was: {}",
                responses.get_str(COMMENTS_FIELD).unwrap_or_default()
            )
        };
        tracing::info!(feeling, "Feedback received");
        Ok(InvocationResult::success_with(message))
    }
}
