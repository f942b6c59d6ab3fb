//! Two-round user interaction on top of stateless HTTP.
//!
//! Round one returns a [`CallbackRequest`] describing a form. The platform renders
//! it and re-invokes the same path with the user's [`CallbackResult`] embedded in
//! a new context. The server keeps nothing between the rounds.
//!
//! ```text
//! Invoked ──▶ AwaitingResponse ┄┄(platform)┄┄▶ Responded ──▶ Completed
//!                                                   └──────▶ Cancelled
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::CallbackError;

// ── Form definition ───────────────────────────────────────────

/// Semantic type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    String,
    Double,
    Long,
    Date,
}

/// One field of a callback form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Key of this field in the user's response map.
    pub data_field_name: String,
    /// Label shown next to the field.
    pub display_name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_editable")]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
}

fn default_editable() -> bool {
    true
}

impl FieldDefinition {
    fn new(name: &str, display_name: &str, field_type: FieldType) -> Self {
        Self {
            data_field_name: name.to_string(),
            display_name: display_name.to_string(),
            field_type,
            required: false,
            editable: true,
            max_length: None,
            default_value: None,
        }
    }

    pub fn boolean(name: &str, display_name: &str) -> Self {
        Self::new(name, display_name, FieldType::Boolean)
    }

    pub fn string(name: &str, display_name: &str) -> Self {
        Self::new(name, display_name, FieldType::String)
    }

    pub fn double(name: &str, display_name: &str) -> Self {
        Self::new(name, display_name, FieldType::Double)
    }

    pub fn long(name: &str, display_name: &str) -> Self {
        Self::new(name, display_name, FieldType::Long)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn default_value(mut self, value: impl Into<JsonValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// A form the platform should present to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub title: String,
    pub prompt: String,
    /// Fields in display order.
    pub fields: Vec<FieldDefinition>,
}

impl CallbackRequest {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.data_field_name == name)
    }
}

/// Builds a [`CallbackRequest`], rejecting empty forms and duplicate field names.
#[derive(Debug, Clone)]
pub struct FormBuilder {
    title: String,
    prompt: String,
    fields: Vec<FieldDefinition>,
}

impl FormBuilder {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt: prompt.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<CallbackRequest, CallbackError> {
        if self.fields.is_empty() {
            return Err(CallbackError::EmptyForm(self.title));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.data_field_name.as_str()) {
                return Err(CallbackError::DuplicateField(field.data_field_name.clone()));
            }
        }
        Ok(CallbackRequest {
            title: self.title,
            prompt: self.prompt,
            fields: self.fields,
        })
    }
}

// ── User response ─────────────────────────────────────────────

/// The user's answer to a [`CallbackRequest`], echoed back by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResult {
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub responses: BTreeMap<String, JsonValue>,
}

impl CallbackResult {
    pub fn submitted(responses: BTreeMap<String, JsonValue>) -> Self {
        Self {
            cancelled: false,
            responses,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            responses: BTreeMap::new(),
        }
    }

    /// The submitted values, or `None` when the user cancelled.
    ///
    /// A cancelled response map is never interpreted, whatever it contains.
    pub fn responses(&self) -> Option<FieldResponses<'_>> {
        if self.cancelled {
            None
        } else {
            Some(FieldResponses(&self.responses))
        }
    }
}

/// Typed read access to submitted form values.
#[derive(Debug, Clone, Copy)]
pub struct FieldResponses<'a>(&'a BTreeMap<String, JsonValue>);

impl<'a> FieldResponses<'a> {
    pub fn get(&self, name: &str) -> Option<&'a JsonValue> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(JsonValue::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(JsonValue::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(JsonValue::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(JsonValue::as_i64)
    }
}

// ── Protocol state ────────────────────────────────────────────

/// Position of one invocation within the callback protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackState {
    Invoked,
    AwaitingResponse,
    Responded,
    Completed,
    Cancelled,
}

impl CallbackState {
    /// State an invocation starts in, given the prior round's result (if any).
    pub fn on_entry(prior: Option<&CallbackResult>) -> Self {
        match prior {
            None => CallbackState::Invoked,
            Some(_) => CallbackState::Responded,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CallbackState::Completed | CallbackState::Cancelled)
    }

    pub fn can_transition_to(self, next: CallbackState) -> bool {
        use CallbackState::*;
        matches!(
            (self, next),
            (Invoked, AwaitingResponse)
                | (AwaitingResponse, Responded)
                | (Responded, Completed)
                | (Responded, Cancelled)
        )
    }

    pub fn transition(self, next: CallbackState) -> Result<CallbackState, CallbackError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CallbackError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Which round of an interaction the current invocation is.
#[derive(Debug, Clone, Copy)]
pub enum CallbackRound<'a> {
    /// No prior result: the handler should ask.
    First,
    /// The user answered the form.
    Submitted(FieldResponses<'a>),
    /// The user dismissed the form.
    Cancelled,
}

impl<'a> CallbackRound<'a> {
    pub fn of(prior: Option<&'a CallbackResult>) -> Self {
        match prior {
            None => CallbackRound::First,
            Some(result) => match result.responses() {
                Some(responses) => CallbackRound::Submitted(responses),
                None => CallbackRound::Cancelled,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallbackRound::First => "first",
            CallbackRound::Submitted(_) | CallbackRound::Cancelled => "second",
        }
    }
}
