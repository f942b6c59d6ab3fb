//! Shared helpers: the production route table over a [`MemoryPlatform`].

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use webhook_core::platform::{
    DataRecord, ElnEntryCriteria, ElnEntryType, ElnExperiment, ExperimentEntry, FieldMap,
};
use webhook_core::MemoryPlatform;
use webhook_server::{build_router, AppState};

pub fn app(platform: &MemoryPlatform) -> axum::Router {
    let registry = Arc::new(eln_webhooks::build_registry().unwrap());
    build_router(AppState::new(registry, Arc::new(platform.clone())))
}

pub async fn post(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Context of a call fired from `experiment`.
pub fn in_experiment(experiment: &ElnExperiment) -> Value {
    json!({ "elnExperiment": experiment })
}

pub fn table(name: &str, data_type: &str, order: i32) -> ElnEntryCriteria {
    ElnEntryCriteria::new(ElnEntryType::Table, name, order).with_data_type(data_type)
}

/// Adds a table step holding `count` fresh records of `data_type`.
pub fn seed_table(
    platform: &MemoryPlatform,
    experiment: &ElnExperiment,
    name: &str,
    data_type: &str,
    order: i32,
    count: usize,
) -> (ExperimentEntry, Vec<DataRecord>) {
    let entry = platform.add_entry(
        experiment.notebook_experiment_id,
        table(name, data_type, order),
    );
    let records = platform.add_records(data_type, vec![FieldMap::new(); count]);
    platform.attach_records(entry.entry_id, &records);
    (entry, records)
}
