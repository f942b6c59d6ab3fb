//! End-to-end scenarios for the interactive feedback form and the aliquot ratio.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use webhook_core::MemoryPlatform;

use common::{app, in_experiment, post, seed_table};

#[tokio::test]
async fn hello_world_with_empty_context() {
    let (status, body) = post(app(&MemoryPlatform::new()), "/hello_world", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn unregistered_path_is_unknown_route() {
    let (status, body) = post(app(&MemoryPlatform::new()), "/goodbye_world", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorKind"], "unknown_route");
}

#[tokio::test]
async fn feedback_form_round_trip() {
    let app = app(&MemoryPlatform::new());

    let (status, body) = post(app.clone(), "/feedback_form", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let request = &body["callbackRequest"];
    assert_eq!(request["title"], "Feedback");
    let fields = request["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["dataFieldName"], "Feeling");
    assert_eq!(fields[0]["fieldType"], "boolean");
    assert_eq!(fields[0]["required"], true);
    assert_eq!(fields[0]["defaultValue"], false);
    assert_eq!(fields[1]["dataFieldName"], "Comments");
    assert_eq!(fields[1]["fieldType"], "string");
    assert_eq!(fields[1]["required"], false);
    assert_eq!(fields[1]["maxLength"], 2000);

    let submitted = json!({ "callbackResult": { "cancelled": false, "responses": { "Feeling": true } } });
    let (status, body) = post(app.clone(), "/feedback_form", submitted).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayText"], "User felt very good! Nothing to do here...");
    assert!(body.get("callbackRequest").is_none());

    let cancelled = json!({ "callbackResult": { "cancelled": true } });
    let (status, body) = post(app, "/feedback_form", cancelled).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayText"], "You have Cancelled!");
}

#[tokio::test]
async fn aliquot_ratio_of_eight_sources_and_four_aliquots() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Aliquoting");
    seed_table(&platform, &exp, "Samples", "Sample", 1, 8);
    seed_table(&platform, &exp, "Requests", "Request", 2, 1);
    seed_table(&platform, &exp, "Aliquots", "Sample", 3, 4);

    let (status, body) = post(app(&platform), "/eln/sample_aliquot_count", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayText"], "The aliquot to sample ratio is: 0.5");
}

#[tokio::test]
async fn aliquot_ratio_is_exact_for_other_counts() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Thirds");
    seed_table(&platform, &exp, "Samples", "Sample", 1, 3);
    seed_table(&platform, &exp, "Aliquots", "Sample", 2, 7);

    let (_, body) = post(app(&platform), "/eln/sample_aliquot_count", in_experiment(&exp)).await;
    assert_eq!(body["displayText"], "The aliquot to sample ratio is: 2.3333333333333335");
}

#[tokio::test]
async fn whole_ratio_keeps_its_decimal() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Doubling");
    seed_table(&platform, &exp, "Samples", "Sample", 1, 4);
    seed_table(&platform, &exp, "Aliquots", "Sample", 2, 8);

    let (_, body) = post(app(&platform), "/eln/sample_aliquot_count", in_experiment(&exp)).await;
    assert_eq!(body["displayText"], "The aliquot to sample ratio is: 2.0");
}

#[tokio::test]
async fn aliquot_ratio_follows_step_order_not_creation_order() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Shuffled");
    // Created out of display order; the source is the lowest-ordered Sample table
    // and the aliquots the next Sample table after it.
    seed_table(&platform, &exp, "Late Aliquots", "Sample", 6, 5);
    seed_table(&platform, &exp, "Plates", "Plate", 2, 9);
    seed_table(&platform, &exp, "Source", "Sample", 1, 3);
    seed_table(&platform, &exp, "Extra Aliquots", "Sample", 4, 2);
    seed_table(&platform, &exp, "Aliquots", "Sample", 3, 1);

    let (_, body) = post(app(&platform), "/eln/sample_aliquot_count", in_experiment(&exp)).await;
    assert_eq!(body["displayText"], "The aliquot to sample ratio is: 0.3333333333333333");
}

#[tokio::test]
async fn aliquot_ratio_with_empty_source_is_guarded() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Aliquoting");
    seed_table(&platform, &exp, "Samples", "Sample", 1, 0);
    seed_table(&platform, &exp, "Aliquots", "Sample", 2, 3);

    let (status, body) = post(app(&platform), "/eln/sample_aliquot_count", in_experiment(&exp)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["displayText"].as_str().unwrap().contains("no samples"));
}

#[tokio::test]
async fn aliquot_ratio_reports_missing_tables() {
    let platform = MemoryPlatform::new();
    let exp = platform.create_experiment("Empty");

    let (_, body) = post(app(&platform), "/eln/sample_aliquot_count", in_experiment(&exp)).await;
    assert_eq!(body["displayText"], "There are no source sample table.");

    seed_table(&platform, &exp, "Samples", "Sample", 1, 2);
    let (_, body) = post(app(&platform), "/eln/sample_aliquot_count", in_experiment(&exp)).await;
    assert_eq!(body["displayText"], "There are no aliquot sample table.");
}

#[tokio::test]
async fn eln_handler_without_experiment_is_handler_error() {
    let (status, body) =
        post(app(&MemoryPlatform::new()), "/eln/sample_aliquot_count", json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errorKind"], "handler_execution");
}
