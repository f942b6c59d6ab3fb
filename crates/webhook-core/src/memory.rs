//! In-memory platform for tests and local development.
//!
//! Implements every platform port over shared `RwLock`-guarded state. Clones
//! share that state, so a test can seed data, hand a clone to the dispatcher
//! and inspect the effects afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::platform::{
    AccessionManager, ChartDefinition, DataRecord, DataRecordManager, ElnEntryCriteria,
    ElnExperiment, ElnManager, EntryUpdateCriteria, ExperimentEntry, FieldMap, PlatformConnector,
    PlatformHandle, PlatformResult, UserSession,
};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    records: BTreeMap<i64, DataRecord>,
    experiments: BTreeMap<i64, ElnExperiment>,
    entries: BTreeMap<i64, Vec<ExperimentEntry>>,
    entry_records: HashMap<i64, Vec<i64>>,
    entry_options: HashMap<i64, BTreeMap<String, String>>,
    entry_text: HashMap<i64, String>,
    entry_charts: HashMap<i64, ChartDefinition>,
    accession_counters: HashMap<(String, String), u64>,
    offline: bool,
    latency: Option<Duration>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn new_record(&mut self, data_type_name: &str, fields: FieldMap) -> DataRecord {
        let id = self.allocate_id();
        let mut record = DataRecord::new(data_type_name, id);
        record.fields = fields;
        self.records.insert(id, record.clone());
        record
    }

    fn add_entry(
        &mut self,
        experiment_id: i64,
        criteria: ElnEntryCriteria,
    ) -> PlatformResult<ExperimentEntry> {
        if !self.experiments.contains_key(&experiment_id) {
            return Err(PlatformError::NotFound {
                kind: "Experiment",
                id: experiment_id.to_string(),
            });
        }
        let entry = ExperimentEntry {
            entry_id: self.allocate_id(),
            entry_name: criteria.entry_name,
            entry_type: criteria.entry_type,
            data_type_name: criteria.data_type_name,
            order: criteria.order,
            entry_status: Default::default(),
            field_set_id: criteria.field_set_id,
            source_entry_id: criteria.source_entry_id,
        };
        if let Some(record_id) = criteria.record_id {
            self.entry_records.entry(entry.entry_id).or_default().push(record_id);
        }
        if let Some(text) = criteria.text_content {
            self.entry_text.insert(entry.entry_id, text);
        }
        if let Some(chart) = criteria.chart {
            self.entry_charts.insert(entry.entry_id, chart);
        }
        self.entries.entry(experiment_id).or_default().push(entry.clone());
        Ok(entry)
    }

    fn entry_mut(
        &mut self,
        experiment_id: i64,
        entry_id: i64,
    ) -> PlatformResult<&mut ExperimentEntry> {
        self.entries
            .get_mut(&experiment_id)
            .and_then(|entries| entries.iter_mut().find(|e| e.entry_id == entry_id))
            .ok_or_else(|| PlatformError::NotFound {
                kind: "Experiment entry",
                id: entry_id.to_string(),
            })
    }
}

/// Shared in-memory stand-in for the laboratory platform.
#[derive(Clone, Default)]
pub struct MemoryPlatform {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> PlatformResult<std::sync::RwLockReadGuard<'_, MemoryState>> {
        self.inner
            .read()
            .map_err(|e| PlatformError::Request(format!("Lock: {}", e)))
    }

    fn write(&self) -> PlatformResult<std::sync::RwLockWriteGuard<'_, MemoryState>> {
        self.inner
            .write()
            .map_err(|e| PlatformError::Request(format!("Lock: {}", e)))
    }

    /// Applies configured latency and offline mode before a port call.
    async fn enter(&self) -> PlatformResult<()> {
        let (offline, latency) = {
            let state = self.read()?;
            (state.offline, state.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if offline {
            return Err(PlatformError::Request("platform offline".to_string()));
        }
        Ok(())
    }

    // ── Fault injection ──

    /// Makes every subsequent port call fail.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.inner.write() {
            state.offline = offline;
        }
    }

    /// Delays every subsequent port call.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut state) = self.inner.write() {
            state.latency = latency;
        }
    }

    // ── Seeding ──
    //
    // Seeding helpers panic on a poisoned lock; they are only called from tests
    // and the dev-mode bootstrap.

    pub fn create_experiment(&self, name: &str) -> ElnExperiment {
        let mut state = self.inner.write().expect("memory platform lock poisoned");
        let experiment = ElnExperiment {
            notebook_experiment_id: state.allocate_id(),
            notebook_experiment_name: name.to_string(),
        };
        state
            .experiments
            .insert(experiment.notebook_experiment_id, experiment.clone());
        state.entries.insert(experiment.notebook_experiment_id, Vec::new());
        experiment
    }

    pub fn add_entry(&self, experiment_id: i64, criteria: ElnEntryCriteria) -> ExperimentEntry {
        let mut state = self.inner.write().expect("memory platform lock poisoned");
        state
            .add_entry(experiment_id, criteria)
            .expect("experiment must exist before adding entries")
    }

    pub fn add_records(&self, data_type_name: &str, field_maps: Vec<FieldMap>) -> Vec<DataRecord> {
        let mut state = self.inner.write().expect("memory platform lock poisoned");
        field_maps
            .into_iter()
            .map(|fields| state.new_record(data_type_name, fields))
            .collect()
    }

    pub fn attach_records(&self, entry_id: i64, records: &[DataRecord]) {
        let mut state = self.inner.write().expect("memory platform lock poisoned");
        state
            .entry_records
            .entry(entry_id)
            .or_default()
            .extend(records.iter().map(|r| r.record_id));
    }

    pub fn set_entry_option(&self, entry_id: i64, key: &str, value: &str) {
        let mut state = self.inner.write().expect("memory platform lock poisoned");
        state
            .entry_options
            .entry(entry_id)
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    // ── Inspection ──

    pub fn record(&self, record_id: i64) -> Option<DataRecord> {
        self.inner.read().ok()?.records.get(&record_id).cloned()
    }

    pub fn records_of_type(&self, data_type_name: &str) -> Vec<DataRecord> {
        self.inner
            .read()
            .map(|state| {
                state
                    .records
                    .values()
                    .filter(|r| r.data_type_name == data_type_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn entries(&self, experiment_id: i64) -> Vec<ExperimentEntry> {
        self.inner
            .read()
            .ok()
            .and_then(|state| state.entries.get(&experiment_id).cloned())
            .unwrap_or_default()
    }

    pub fn records_for_entry(&self, entry_id: i64) -> Vec<DataRecord> {
        let Ok(state) = self.inner.read() else {
            return Vec::new();
        };
        state
            .entry_records
            .get(&entry_id)
            .map(|ids| ids.iter().filter_map(|id| state.records.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn entry_text(&self, entry_id: i64) -> Option<String> {
        self.inner.read().ok()?.entry_text.get(&entry_id).cloned()
    }

    pub fn entry_chart(&self, entry_id: i64) -> Option<ChartDefinition> {
        self.inner.read().ok()?.entry_charts.get(&entry_id).cloned()
    }
}

#[async_trait]
impl DataRecordManager for MemoryPlatform {
    async fn add_data_record(&self, data_type_name: &str) -> PlatformResult<DataRecord> {
        self.enter().await?;
        Ok(self.write()?.new_record(data_type_name, FieldMap::new()))
    }

    async fn add_data_records_with_data(
        &self,
        data_type_name: &str,
        field_maps: Vec<FieldMap>,
    ) -> PlatformResult<Vec<DataRecord>> {
        self.enter().await?;
        let mut state = self.write()?;
        Ok(field_maps
            .into_iter()
            .map(|fields| state.new_record(data_type_name, fields))
            .collect())
    }

    async fn commit_data_records(&self, records: &[DataRecord]) -> PlatformResult<()> {
        self.enter().await?;
        let mut state = self.write()?;
        for record in records {
            match state.records.get_mut(&record.record_id) {
                Some(stored) => stored.fields = record.fields.clone(),
                None => {
                    return Err(PlatformError::NotFound {
                        kind: "Record",
                        id: record.record_id.to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ElnManager for MemoryPlatform {
    async fn get_experiment_entry_list(
        &self,
        experiment_id: i64,
    ) -> PlatformResult<Vec<ExperimentEntry>> {
        self.enter().await?;
        self.read()?
            .entries
            .get(&experiment_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                kind: "Experiment",
                id: experiment_id.to_string(),
            })
    }

    async fn get_data_records_for_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
    ) -> PlatformResult<Vec<DataRecord>> {
        self.enter().await?;
        {
            let mut state = self.write()?;
            state.entry_mut(experiment_id, entry_id)?;
        }
        Ok(self.records_for_entry(entry_id))
    }

    async fn add_experiment_entry(
        &self,
        experiment_id: i64,
        criteria: ElnEntryCriteria,
    ) -> PlatformResult<ExperimentEntry> {
        self.enter().await?;
        self.write()?.add_entry(experiment_id, criteria)
    }

    async fn update_experiment_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
        update: EntryUpdateCriteria,
    ) -> PlatformResult<()> {
        self.enter().await?;
        let mut state = self.write()?;
        let entry = state.entry_mut(experiment_id, entry_id)?;
        if let Some(name) = update.entry_name {
            entry.entry_name = name;
        }
        if let Some(status) = update.entry_status {
            entry.entry_status = status;
        }
        Ok(())
    }

    async fn add_records_to_table_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
        records: &[DataRecord],
    ) -> PlatformResult<()> {
        self.enter().await?;
        let mut state = self.write()?;
        state.entry_mut(experiment_id, entry_id)?;
        state
            .entry_records
            .entry(entry_id)
            .or_default()
            .extend(records.iter().map(|r| r.record_id));
        Ok(())
    }

    async fn get_experiment_entry_options(
        &self,
        experiment_id: i64,
        entry_id: i64,
    ) -> PlatformResult<BTreeMap<String, String>> {
        self.enter().await?;
        let mut state = self.write()?;
        state.entry_mut(experiment_id, entry_id)?;
        Ok(state.entry_options.get(&entry_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl AccessionManager for MemoryPlatform {
    async fn accession_with_config_list(
        &self,
        data_type_name: &str,
        data_field_name: &str,
        count: usize,
    ) -> PlatformResult<Vec<String>> {
        self.enter().await?;
        let mut state = self.write()?;
        let prefix = data_type_name.to_ascii_uppercase();
        let counter = state
            .accession_counters
            .entry((data_type_name.to_string(), data_field_name.to_string()))
            .or_insert(0);
        Ok((0..count)
            .map(|_| {
                *counter += 1;
                format!("{}-{:06}", prefix, counter)
            })
            .collect())
    }
}

impl PlatformConnector for MemoryPlatform {
    fn connect(&self, _user: Option<&UserSession>) -> PlatformResult<PlatformHandle> {
        Ok(PlatformHandle::from_backend(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ElnEntryType, ExperimentEntryStatus};
    use serde_json::json;

    #[tokio::test]
    async fn committed_fields_are_persisted() {
        let platform = MemoryPlatform::new();
        let mut record = platform.add_data_record("Request").await.unwrap();
        record.set_field_value("RequestId", "R-1");
        assert!(platform.record(record.record_id).unwrap().fields.is_empty());

        platform.commit_data_records(&[record.clone()]).await.unwrap();
        assert_eq!(
            platform.record(record.record_id).unwrap().get_field_value("RequestId"),
            Some(&json!("R-1"))
        );
    }

    #[tokio::test]
    async fn accession_ids_are_unique_per_field() {
        let platform = MemoryPlatform::new();
        let first = platform
            .accession_with_config_list("Sample", "SampleId", 2)
            .await
            .unwrap();
        let second = platform
            .accession_with_config_list("Sample", "SampleId", 1)
            .await
            .unwrap();
        assert_eq!(first, vec!["SAMPLE-000001", "SAMPLE-000002"]);
        assert_eq!(second, vec!["SAMPLE-000003"]);
    }

    #[tokio::test]
    async fn entry_updates_and_unknown_entries() {
        let platform = MemoryPlatform::new();
        let exp = platform.create_experiment("Exp");
        let entry = platform.add_entry(
            exp.notebook_experiment_id,
            ElnEntryCriteria::new(ElnEntryType::Form, "Overview", 0),
        );

        platform
            .update_experiment_entry(
                exp.notebook_experiment_id,
                entry.entry_id,
                EntryUpdateCriteria {
                    entry_status: Some(ExperimentEntryStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            platform.entries(exp.notebook_experiment_id)[0].entry_status,
            ExperimentEntryStatus::Completed
        );

        let err = platform
            .get_data_records_for_entry(exp.notebook_experiment_id, 9999)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { .. }));
    }

    #[tokio::test]
    async fn offline_platform_fails_calls() {
        let platform = MemoryPlatform::new();
        platform.set_offline(true);
        let err = platform.add_data_record("Sample").await.unwrap_err();
        assert!(matches!(err, PlatformError::Request(_)));
    }
}
