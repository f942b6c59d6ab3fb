//! Ports onto the external laboratory platform.
//!
//! Records, ELN entries and accessioning live in the platform, which is the
//! source of truth for all durable state. Handlers reach it only through the
//! traits below; the server wires a REST implementation, tests wire
//! [`crate::memory::MemoryPlatform`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::PlatformError;

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Field name → value map of a single record.
pub type FieldMap = BTreeMap<String, JsonValue>;

// ── Records ───────────────────────────────────────────────────

/// A typed record stored by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    pub data_type_name: String,
    pub record_id: i64,
    #[serde(default)]
    pub fields: FieldMap,
}

impl DataRecord {
    pub fn new(data_type_name: impl Into<String>, record_id: i64) -> Self {
        Self {
            data_type_name: data_type_name.into(),
            record_id,
            fields: FieldMap::new(),
        }
    }

    pub fn get_field_value(&self, field: &str) -> Option<&JsonValue> {
        self.fields.get(field)
    }

    /// Sets a field locally. Nothing is persisted until the record is committed.
    pub fn set_field_value(&mut self, field: impl Into<String>, value: impl Into<JsonValue>) {
        self.fields.insert(field.into(), value.into());
    }
}

impl std::fmt::Display for DataRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (Record ID: {})", self.data_type_name, self.record_id)
    }
}

// ── ELN entries ───────────────────────────────────────────────

/// Kind of an experiment entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElnEntryType {
    Form,
    Table,
    Text,
    Dashboard,
    Attachment,
}

/// Workflow status of an experiment entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExperimentEntryStatus {
    #[default]
    Enabled,
    Disabled,
    UnlockedChangeRequired,
    LockedAwaitingApproval,
    LockedRejected,
    Completed,
    CompletedApproved,
}

/// One entry of a notebook experiment, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentEntry {
    pub entry_id: i64,
    pub entry_name: String,
    pub entry_type: ElnEntryType,
    /// Data type of the records this entry holds, if any.
    #[serde(default)]
    pub data_type_name: Option<String>,
    /// Position within the experiment; lower comes first.
    pub order: i32,
    #[serde(default)]
    pub entry_status: ExperimentEntryStatus,
    #[serde(default)]
    pub field_set_id: Option<i64>,
    /// For dashboards: the entry whose records are charted.
    #[serde(default)]
    pub source_entry_id: Option<i64>,
}

/// The notebook experiment an invocation was triggered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElnExperiment {
    pub notebook_experiment_id: i64,
    #[serde(default)]
    pub notebook_experiment_name: String,
}

/// Chart settings carried by a dashboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDefinition {
    pub title: String,
    pub x_axis_field: String,
    pub y_axis_field: String,
}

/// Criteria for creating a new experiment entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElnEntryCriteria {
    pub entry_type: ElnEntryType,
    pub entry_name: String,
    #[serde(default)]
    pub data_type_name: Option<String>,
    pub order: i32,
    #[serde(default)]
    pub field_set_id: Option<i64>,
    /// Record backing a form entry.
    #[serde(default)]
    pub record_id: Option<i64>,
    #[serde(default)]
    pub source_entry_id: Option<i64>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub chart: Option<ChartDefinition>,
}

impl ElnEntryCriteria {
    pub fn new(entry_type: ElnEntryType, entry_name: impl Into<String>, order: i32) -> Self {
        Self {
            entry_type,
            entry_name: entry_name.into(),
            data_type_name: None,
            order,
            field_set_id: None,
            record_id: None,
            source_entry_id: None,
            text_content: None,
            chart: None,
        }
    }

    pub fn with_data_type(mut self, data_type_name: impl Into<String>) -> Self {
        self.data_type_name = Some(data_type_name.into());
        self
    }
}

/// Partial update of an existing entry. `None` leaves a property unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdateCriteria {
    #[serde(default)]
    pub entry_name: Option<String>,
    #[serde(default)]
    pub entry_status: Option<ExperimentEntryStatus>,
}

/// The user session an invocation runs under. Platform calls are scoped to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    /// Base URL of the platform REST API for this user.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

// ── Ports ─────────────────────────────────────────────────────

/// Record creation and persistence.
#[async_trait]
pub trait DataRecordManager: Send + Sync {
    async fn add_data_record(&self, data_type_name: &str) -> PlatformResult<DataRecord>;

    async fn add_data_records_with_data(
        &self,
        data_type_name: &str,
        field_maps: Vec<FieldMap>,
    ) -> PlatformResult<Vec<DataRecord>>;

    /// Persists the current field values of the given records.
    async fn commit_data_records(&self, records: &[DataRecord]) -> PlatformResult<()>;
}

/// Notebook experiment entries and their records.
#[async_trait]
pub trait ElnManager: Send + Sync {
    async fn get_experiment_entry_list(
        &self,
        experiment_id: i64,
    ) -> PlatformResult<Vec<ExperimentEntry>>;

    async fn get_data_records_for_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
    ) -> PlatformResult<Vec<DataRecord>>;

    async fn add_experiment_entry(
        &self,
        experiment_id: i64,
        criteria: ElnEntryCriteria,
    ) -> PlatformResult<ExperimentEntry>;

    async fn update_experiment_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
        update: EntryUpdateCriteria,
    ) -> PlatformResult<()>;

    async fn add_records_to_table_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
        records: &[DataRecord],
    ) -> PlatformResult<()>;

    async fn get_experiment_entry_options(
        &self,
        experiment_id: i64,
        entry_id: i64,
    ) -> PlatformResult<BTreeMap<String, String>>;
}

/// Unique identifier generation for new records.
#[async_trait]
pub trait AccessionManager: Send + Sync {
    async fn accession_with_config_list(
        &self,
        data_type_name: &str,
        data_field_name: &str,
        count: usize,
    ) -> PlatformResult<Vec<String>>;
}

/// Platform services scoped to one user session.
#[derive(Clone)]
pub struct PlatformHandle {
    pub records: Arc<dyn DataRecordManager>,
    pub eln: Arc<dyn ElnManager>,
    pub accession: Arc<dyn AccessionManager>,
}

impl PlatformHandle {
    /// Builds a handle whose three services are backed by one object.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: DataRecordManager + ElnManager + AccessionManager + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            records: backend.clone(),
            eln: backend.clone(),
            accession: backend,
        }
    }
}

impl std::fmt::Debug for PlatformHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformHandle").finish_non_exhaustive()
    }
}

/// Opens a [`PlatformHandle`] for the user an invocation runs as.
pub trait PlatformConnector: Send + Sync {
    fn connect(&self, user: Option<&UserSession>) -> PlatformResult<PlatformHandle>;
}
