//! Ordered navigation over the steps of a notebook experiment.
//!
//! An [`ElnProtocol`] is a cursor over the platform's entry list. Each handle
//! caches the sorted step list on first use; creating a step through a handle
//! invalidates that handle's cache only. Handles obtained independently
//! (see [`ElnProtocol::fresh_handle`]) keep their own cache and may go stale.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{HandlerError, HandlerResult};
use crate::platform::{
    DataRecord, ElnEntryCriteria, ElnExperiment, ElnManager, ExperimentEntry, PlatformResult,
};

/// One experiment entry, viewed as a step of the protocol.
#[derive(Clone)]
pub struct ElnStep {
    experiment_id: i64,
    entry: ExperimentEntry,
    eln: Arc<dyn ElnManager>,
}

impl ElnStep {
    pub(crate) fn new(experiment_id: i64, entry: ExperimentEntry, eln: Arc<dyn ElnManager>) -> Self {
        Self {
            experiment_id,
            entry,
            eln,
        }
    }

    pub fn id(&self) -> i64 {
        self.entry.entry_id
    }

    pub fn name(&self) -> &str {
        &self.entry.entry_name
    }

    pub fn order(&self) -> i32 {
        self.entry.order
    }

    pub fn eln_entry(&self) -> &ExperimentEntry {
        &self.entry
    }

    /// The step's type tag: the data type of the records it holds.
    pub fn data_type_name(&self) -> Option<&str> {
        self.entry.data_type_name.as_deref()
    }

    pub fn is_of_type(&self, type_tag: &str) -> bool {
        self.data_type_name() == Some(type_tag)
    }

    /// Reads the step's records from the platform.
    pub async fn get_records(&self) -> PlatformResult<Vec<DataRecord>> {
        self.eln
            .get_data_records_for_entry(self.experiment_id, self.entry.entry_id)
            .await
    }
}

impl std::fmt::Debug for ElnStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElnStep")
            .field("experiment_id", &self.experiment_id)
            .field("entry", &self.entry)
            .finish()
    }
}

/// A handle onto one experiment's ordered steps.
pub struct ElnProtocol {
    experiment: ElnExperiment,
    eln: Arc<dyn ElnManager>,
    steps: RwLock<Option<Arc<Vec<ElnStep>>>>,
}

impl ElnProtocol {
    pub fn new(experiment: ElnExperiment, eln: Arc<dyn ElnManager>) -> Self {
        Self {
            experiment,
            eln,
            steps: RwLock::new(None),
        }
    }

    pub fn get_id(&self) -> i64 {
        self.experiment.notebook_experiment_id
    }

    pub fn eln_experiment(&self) -> &ElnExperiment {
        &self.experiment
    }

    /// Opens another handle onto the same experiment, with an empty cache.
    pub fn fresh_handle(&self) -> ElnProtocol {
        ElnProtocol::new(self.experiment.clone(), self.eln.clone())
    }

    /// Drops this handle's cached step list.
    pub async fn invalidate(&self) {
        *self.steps.write().await = None;
    }

    /// Steps ordered by their position in the experiment.
    pub async fn get_sorted_step_list(&self) -> PlatformResult<Arc<Vec<ElnStep>>> {
        if let Some(steps) = self.steps.read().await.as_ref() {
            return Ok(steps.clone());
        }

        let mut guard = self.steps.write().await;
        if let Some(steps) = guard.as_ref() {
            return Ok(steps.clone());
        }

        let mut entries = self.eln.get_experiment_entry_list(self.get_id()).await?;
        entries.sort_by_key(|e| (e.order, e.entry_id));
        tracing::debug!(
            experiment_id = self.get_id(),
            steps = entries.len(),
            "Loaded protocol step list"
        );

        let steps: Arc<Vec<ElnStep>> = Arc::new(
            entries
                .into_iter()
                .map(|entry| ElnStep::new(self.get_id(), entry, self.eln.clone()))
                .collect(),
        );
        *guard = Some(steps.clone());
        Ok(steps)
    }

    /// First step whose type tag is `type_tag`.
    pub async fn get_first_step_of_type(&self, type_tag: &str) -> PlatformResult<Option<ElnStep>> {
        let steps = self.get_sorted_step_list().await?;
        Ok(steps.iter().find(|s| s.is_of_type(type_tag)).cloned())
    }

    /// First step of type `type_tag` strictly after `anchor`.
    ///
    /// The anchor and every step before it are excluded, even when they match.
    pub async fn get_next_step(
        &self,
        anchor: &ElnStep,
        type_tag: &str,
    ) -> PlatformResult<Option<ElnStep>> {
        let steps = self.get_sorted_step_list().await?;
        let after: &[ElnStep] = match steps.iter().position(|s| s.id() == anchor.id()) {
            Some(idx) => &steps[idx + 1..],
            None => {
                // Anchor from another handle: fall back to its recorded order.
                let start = steps
                    .iter()
                    .position(|s| (s.order(), s.id()) > (anchor.order(), anchor.id()))
                    .unwrap_or(steps.len());
                &steps[start..]
            }
        };
        Ok(after.iter().find(|s| s.is_of_type(type_tag)).cloned())
    }

    /// Order value that places a new step after every existing one.
    pub async fn next_order(&self) -> PlatformResult<i32> {
        let steps = self.get_sorted_step_list().await?;
        Ok(steps.iter().map(ElnStep::order).max().map_or(1, |max| max + 1))
    }

    /// Creates an entry through the platform and invalidates this handle's cache.
    pub async fn add_step(&self, criteria: ElnEntryCriteria) -> PlatformResult<ElnStep> {
        let entry = self.eln.add_experiment_entry(self.get_id(), criteria).await?;
        self.invalidate().await;
        tracing::debug!(
            experiment_id = self.get_id(),
            entry_id = entry.entry_id,
            entry_name = %entry.entry_name,
            "Created protocol step"
        );
        Ok(ElnStep::new(self.get_id(), entry, self.eln.clone()))
    }
}

impl std::fmt::Debug for ElnProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElnProtocol")
            .field("experiment", &self.experiment)
            .finish_non_exhaustive()
    }
}

/// `numerator / denominator`, refusing a zero denominator.
pub fn record_ratio(numerator: usize, denominator: usize, what: &'static str) -> HandlerResult<f64> {
    if denominator == 0 {
        return Err(HandlerError::DivisionUndefined { what });
    }
    Ok(numerator as f64 / denominator as f64)
}
