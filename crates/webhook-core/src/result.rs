//! Output of a single webhook invocation.

use serde::{Deserialize, Serialize};

use crate::callback::CallbackRequest;

/// What a handler hands back to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub success: bool,
    /// Message shown to the user as a toast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    /// Present only when the handler wants a second round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_request: Option<CallbackRequest>,
}

impl InvocationResult {
    pub fn success() -> Self {
        Self {
            success: true,
            display_text: None,
            callback_request: None,
        }
    }

    pub fn success_with(display_text: impl Into<String>) -> Self {
        Self {
            success: true,
            display_text: Some(display_text.into()),
            callback_request: None,
        }
    }

    pub fn failure(display_text: impl Into<String>) -> Self {
        Self {
            success: false,
            display_text: Some(display_text.into()),
            callback_request: None,
        }
    }

    /// Provisional result of round one: the platform must show `request` and call back.
    pub fn awaiting_response(request: CallbackRequest) -> Self {
        Self {
            success: true,
            display_text: None,
            callback_request: Some(request),
        }
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.callback_request.is_some()
    }
}
