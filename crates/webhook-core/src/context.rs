//! Input of a single webhook invocation.
//!
//! [`WebhookPayload`] is the wire shape the platform posts; the dispatcher
//! pairs it with a [`PlatformHandle`] for the calling user to form the
//! [`InvocationContext`] a handler sees. A context lives for one request.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::callback::{CallbackResult, CallbackRound};
use crate::platform::{
    AccessionManager, DataRecord, DataRecordManager, ElnExperiment, ElnManager, ExperimentEntry,
    PlatformHandle, UserSession,
};
use crate::protocol::ElnProtocol;

/// Request body posted by the platform. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub user: Option<UserSession>,
    /// Record whose creation or change fired the webhook.
    #[serde(default)]
    pub data_record: Option<DataRecord>,
    /// Entries relevant to the trigger (e.g. those a rule fired on).
    #[serde(default)]
    pub experiment_entry_list: Option<Vec<ExperimentEntry>>,
    #[serde(default)]
    pub eln_experiment: Option<ElnExperiment>,
    /// Present on the second round of an interactive handler.
    #[serde(default)]
    pub callback_result: Option<CallbackResult>,
}

impl WebhookPayload {
    /// Parses a request body. A blank body or `null` is an empty context;
    /// anything other than a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<JsonValue>(body)? {
            JsonValue::Null => Ok(Self::default()),
            value @ JsonValue::Object(_) => serde_json::from_value(value),
            other => Err(serde::de::Error::custom(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Everything a handler may look at or act through during one invocation.
pub struct InvocationContext {
    user: Option<UserSession>,
    data_record: Option<DataRecord>,
    experiment_entry_list: Vec<ExperimentEntry>,
    callback_result: Option<CallbackResult>,
    active_protocol: Option<ElnProtocol>,
    platform: PlatformHandle,
}

impl InvocationContext {
    pub fn new(payload: WebhookPayload, platform: PlatformHandle) -> Self {
        let active_protocol = payload
            .eln_experiment
            .map(|experiment| ElnProtocol::new(experiment, platform.eln.clone()));
        Self {
            user: payload.user,
            data_record: payload.data_record,
            experiment_entry_list: payload.experiment_entry_list.unwrap_or_default(),
            callback_result: payload.callback_result,
            active_protocol,
            platform,
        }
    }

    pub fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    pub fn data_record(&self) -> Option<&DataRecord> {
        self.data_record.as_ref()
    }

    pub fn experiment_entry_list(&self) -> &[ExperimentEntry] {
        &self.experiment_entry_list
    }

    pub fn eln_experiment(&self) -> Option<&ElnExperiment> {
        self.active_protocol.as_ref().map(ElnProtocol::eln_experiment)
    }

    pub fn active_protocol(&self) -> Option<&ElnProtocol> {
        self.active_protocol.as_ref()
    }

    /// The prior round's answer; `None` on a first round.
    pub fn callback_result(&self) -> Option<&CallbackResult> {
        self.callback_result.as_ref()
    }

    pub fn round(&self) -> CallbackRound<'_> {
        CallbackRound::of(self.callback_result.as_ref())
    }

    pub fn platform(&self) -> &PlatformHandle {
        &self.platform
    }

    pub fn data_record_manager(&self) -> &dyn DataRecordManager {
        self.platform.records.as_ref()
    }

    pub fn eln_manager(&self) -> &dyn ElnManager {
        self.platform.eln.as_ref()
    }

    pub fn accession_manager(&self) -> &dyn AccessionManager {
        self.platform.accession.as_ref()
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("user", &self.user.as_ref().and_then(|u| u.username.as_deref()))
            .field("data_record", &self.data_record)
            .field("entries", &self.experiment_entry_list.len())
            .field("active_protocol", &self.active_protocol)
            .field("round", &self.round().label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_body_is_empty_context() {
        assert_eq!(WebhookPayload::from_slice(b"").unwrap(), WebhookPayload::default());
        assert_eq!(WebhookPayload::from_slice(b" \n").unwrap(), WebhookPayload::default());
        assert_eq!(WebhookPayload::from_slice(b"{}").unwrap(), WebhookPayload::default());
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(WebhookPayload::from_slice(b"not json").is_err());
        assert!(WebhookPayload::from_slice(br#"{"callbackResult": "yes"}"#).is_err());
        assert!(WebhookPayload::from_slice(br#"{"elnExperiment": {"notebookExperimentId": "x"}}"#).is_err());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert_eq!(WebhookPayload::from_slice(b"null").unwrap(), WebhookPayload::default());
        let bodies: [&[u8]; 5] = [
            b"[]",
            br#"[null,null,null,null,{"cancelled":true}]"#,
            b"5",
            br#""x""#,
            b"true",
        ];
        for body in bodies {
            assert!(WebhookPayload::from_slice(body).is_err(), "{}", String::from_utf8_lossy(body));
        }
    }

    #[test]
    fn full_payload_parses() {
        let body = json!({
            "user": { "url": "https://lims.example/webservice/api", "username": "alice" },
            "dataRecord": { "dataTypeName": "Goo", "recordId": 7, "fields": { "Name": "g" } },
            "experimentEntryList": [{
                "entryId": 3, "entryName": "Samples", "entryType": "Table",
                "dataTypeName": "Sample", "order": 1
            }],
            "elnExperiment": { "notebookExperimentId": 42, "notebookExperimentName": "Exp" },
            "callbackResult": { "cancelled": false, "responses": { "Feeling": true } }
        });
        let payload = WebhookPayload::from_slice(body.to_string().as_bytes()).unwrap();
        assert_eq!(payload.data_record.unwrap().record_id, 7);
        assert_eq!(payload.experiment_entry_list.unwrap()[0].entry_name, "Samples");
        assert_eq!(payload.eln_experiment.unwrap().notebook_experiment_id, 42);
        assert!(!payload.callback_result.unwrap().cancelled);
    }
}
