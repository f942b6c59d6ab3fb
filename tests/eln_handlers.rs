//! ELN handlers driven over HTTP against the in-memory platform.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use webhook_core::platform::{
    ElnEntryCriteria, ElnEntryType, ExperimentEntryStatus, FieldMap,
};
use webhook_core::MemoryPlatform;

use common::{app, in_experiment, post, seed_table};

// ── Step creation ─────────────────────────────────────────────

#[tokio::test]
async fn create_new_steps_appends_form_table_and_text() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Steps");
    seed_table(&platform, &exp, "Existing", "Plate", 4, 0);

    let (status, body) = post(app(&platform), "/eln/create_new_steps", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let entries = platform.entries(exp.notebook_experiment_id);
    let added: Vec<_> = entries.iter().skip(1).collect();
    assert_eq!(added.len(), 3);

    assert_eq!(added[0].entry_name, "Request Data");
    assert_eq!(added[0].entry_type, ElnEntryType::Form);
    assert_eq!(added[0].order, 5);
    assert_eq!(added[1].entry_name, "Samples");
    assert_eq!(added[1].data_type_name.as_deref(), Some("Sample"));
    assert_eq!(added[1].order, 6);
    assert_eq!(added[2].entry_type, ElnEntryType::Text);
    assert_eq!(added[2].order, 7);
    assert_eq!(platform.entry_text(added[2].entry_id).as_deref(), Some("Hello World!"));

    let requests = platform.records_of_type("Request");
    assert_eq!(requests.len(), 1);
    let request_id = requests[0].get_field_value("RequestId").unwrap().as_str().unwrap();
    assert!(request_id.starts_with("Webhook Demo Request "));
    assert_eq!(platform.records_for_entry(added[0].entry_id), requests);
}

#[tokio::test]
async fn sample_creation_makes_the_table_when_missing() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Samples");

    let (status, _) = post(app(&platform), "/eln/sample_creation", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::OK);

    let entries = platform.entries(exp.notebook_experiment_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_name, "Samples");

    let samples = platform.records_for_entry(entries[0].entry_id);
    assert_eq!(samples.len(), 8);
    assert!(samples
        .iter()
        .all(|s| s.get_field_value("ExemplarSampleType") == Some(&json!("Blood"))));
    let mut ids: Vec<_> = samples
        .iter()
        .map(|s| s.get_field_value("SampleId").unwrap().to_string())
        .collect();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}

#[tokio::test]
async fn sample_creation_reuses_the_existing_table() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Samples");
    let (table, _) = seed_table(&platform, &exp, "Blood Draw", "Sample", 1, 2);

    post(app(&platform), "/eln/sample_creation", in_experiment(&exp)).await;

    assert_eq!(platform.entries(exp.notebook_experiment_id).len(), 1);
    assert_eq!(platform.records_for_entry(table.entry_id).len(), 10);
}

#[tokio::test]
async fn bar_chart_needs_a_sample_step() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Chart");

    let (_, body) = post(app(&platform), "/eln/bar_chart_creation", in_experiment(&exp)).await;
    assert_eq!(body["displayText"], "There are no sample step. Create it first.");

    let (source, _) = seed_table(&platform, &exp, "Samples", "Sample", 1, 3);
    let (status, _) = post(app(&platform), "/eln/bar_chart_creation", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::OK);

    let entries = platform.entries(exp.notebook_experiment_id);
    let chart_entry = entries.last().unwrap();
    assert_eq!(chart_entry.entry_type, ElnEntryType::Dashboard);
    assert_eq!(chart_entry.source_entry_id, Some(source.entry_id));
    let chart = platform.entry_chart(chart_entry.entry_id).unwrap();
    assert_eq!(chart.title, "Concentration vs Sample ID");
    assert_eq!(chart.x_axis_field, "SampleId");
    assert_eq!(chart.y_axis_field, "Concentration");
}

// ── Instrument tracking ───────────────────────────────────────

#[tokio::test]
async fn instrument_tracking_is_added_once() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Tracking");
    seed_table(&platform, &exp, "Samples", "Sample", 1, 0);
    seed_table(&platform, &exp, "Results", "Result", 2, 0);

    let (status, body) =
        post(app(&platform), "/eln/add_instrument_tracking", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("displayText").is_none());

    let entries = platform.entries(exp.notebook_experiment_id);
    let tracking = entries.last().unwrap();
    assert_eq!(tracking.entry_name, "Instrument Tracking Field Set");
    assert_eq!(tracking.entry_type, ElnEntryType::Form);
    assert_eq!(tracking.field_set_id, Some(109));
    assert_eq!(tracking.order, 3);

    let (_, body) = post(app(&platform), "/eln/add_instrument_tracking", in_experiment(&exp)).await;
    assert_eq!(
        body["displayText"],
        "The Instrument Tracking Field Set is already used in this Experiment."
    );
    assert_eq!(platform.entries(exp.notebook_experiment_id).len(), 3);
}

// ── Entry status ──────────────────────────────────────────────

#[tokio::test]
async fn autocomplete_marks_the_first_visible_entry() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Autocomplete");
    let id = exp.notebook_experiment_id;
    platform.add_entry(id, ElnEntryCriteria::new(ElnEntryType::Text, "Experiment Overview", 0));
    platform.add_entry(id, ElnEntryCriteria::new(ElnEntryType::Form, "Setup", 1));
    platform.add_entry(id, ElnEntryCriteria::new(ElnEntryType::Form, "Run", 2));

    let (status, _) =
        post(app(&platform), "/eln/autocomplete_first_entry", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::OK);

    let statuses: Vec<_> = platform.entries(id).iter().map(|e| e.entry_status).collect();
    assert_eq!(
        statuses,
        [
            ExperimentEntryStatus::Enabled,
            ExperimentEntryStatus::Completed,
            ExperimentEntryStatus::Enabled,
        ]
    );
}

#[tokio::test]
async fn autocomplete_without_experiment_is_a_failure_result() {
    let (status, body) =
        post(app(&MemoryPlatform::new()), "/eln/autocomplete_first_entry", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["displayText"], "Error: Protocol was None");
}

#[tokio::test]
async fn autocomplete_with_only_the_overview_is_a_handler_error() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Bare");
    platform.add_entry(
        exp.notebook_experiment_id,
        ElnEntryCriteria::new(ElnEntryType::Text, "Experiment Overview", 0),
    );

    let (status, body) =
        post(app(&platform), "/eln/autocomplete_first_entry", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errorKind"], "handler_execution");
}

// ── Sample number check ───────────────────────────────────────

fn check_experiment(platform: &MemoryPlatform, samples: usize) -> (serde_json::Value, i64) {
    let exp = platform.create_experiment("Check");
    let (source, _) = seed_table(platform, &exp, "Source", "Sample", 1, samples);
    platform.set_entry_option(source.entry_id, "SOURCE SAMPLES", "");

    let check = platform.add_entry(
        exp.notebook_experiment_id,
        ElnEntryCriteria::new(ElnEntryType::Form, "Check", 2).with_data_type("SampleCheck"),
    );
    platform.set_entry_option(check.entry_id, "SAMPLE NUMBER CHECK", "");
    let record = platform
        .add_records(
            "SampleCheck",
            vec![FieldMap::from([("CorrectNumber".to_string(), json!(false))])],
        )
        .remove(0);
    platform.attach_records(check.entry_id, std::slice::from_ref(&record));

    (in_experiment(&exp), record.record_id)
}

#[tokio::test]
async fn sample_check_passes_on_exactly_five() {
    let platform = MemoryPlatform::new();
    let (context, record_id) = check_experiment(&platform, 5);

    let (status, _) = post(app(&platform), "/eln/check_number_samples", context).await;
    assert_eq!(status, StatusCode::OK);
    let record = platform.record(record_id).unwrap();
    assert_eq!(record.get_field_value("CorrectNumber"), Some(&json!(true)));
}

#[tokio::test]
async fn sample_check_leaves_wrong_counts_alone() {
    let platform = MemoryPlatform::new();
    let (context, record_id) = check_experiment(&platform, 4);

    let (status, _) = post(app(&platform), "/eln/check_number_samples", context).await;
    assert_eq!(status, StatusCode::OK);
    let record = platform.record(record_id).unwrap();
    assert_eq!(record.get_field_value("CorrectNumber"), Some(&json!(false)));
}

#[tokio::test]
async fn sample_check_without_marked_table_is_a_handler_error() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Unmarked");
    seed_table(&platform, &exp, "Source", "Sample", 1, 5);

    let (status, _) = post(app(&platform), "/eln/check_number_samples", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ── Rules ─────────────────────────────────────────────────────

#[tokio::test]
async fn rule_test_reads_the_first_triggering_entry() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Rules");
    let (entry, _) = seed_table(&platform, &exp, "Goo Table", "Goo", 1, 2);

    let context = json!({ "elnExperiment": exp, "experimentEntryList": [entry] });
    let (status, body) = post(app(&platform), "/eln/rule_test", context).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = post(app(&platform), "/eln/rule_test", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn new_goo_reports_the_record() {
    let platform = MemoryPlatform::new();
    let goo = platform.add_records("Goo", vec![FieldMap::new()]).remove(0);

    let (status, body) = post(app(&platform), "/new_goo", json!({ "dataRecord": goo })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayText"], "New Goo!");
}
