//! Integration tests for wire models
//!
//! Payloads here are shaped like real server answers: extra fields the
//! client does not model, aliases from older servers, and error bodies.

use qcportal_domain::{
    BulkReport, DatasetMetadata, DatasetRecordItem, DatasetType, ErrorCategory, InsertMetadata,
    PortalError, Record, RecordStatus, RequestError, ServerInfo, Version,
};
use serde_json::{json, Map};

// ============================================================================
// Server information
// ============================================================================

#[test]
fn server_information_round_trips_unknown_fields() {
    let info: ServerInfo = serde_json::from_value(json!({
        "name": "QCArchive",
        "version": "0.54.1",
        "api_limits": {"get_records": 1000},
        "client_version_lower_limit": "0.50",
        "client_version_upper_limit": "1.00",
        "manager_heartbeat_frequency": 60
    }))
    .unwrap();

    assert_eq!(info.extra["manager_heartbeat_frequency"], json!(60));
    assert!(info.check_client_version(&"0.54".parse::<Version>().unwrap()).is_ok());

    let err = info.check_client_version(&"0.49".parse::<Version>().unwrap()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Compatibility);
    assert!(!err.is_retryable());
}

// ============================================================================
// Datasets and records
// ============================================================================

#[test]
fn legacy_collection_fields_are_accepted() {
    let meta: DatasetMetadata = serde_json::from_value(json!({
        "id": 41,
        "collection_type": "torsiondrive",
        "name": "OpenFF Torsions",
        "default_compute_tag": "openff",
        "owner_user": "bot"
    }))
    .unwrap();

    assert_eq!(meta.dataset_type, DatasetType::Torsiondrive);
    assert_eq!(meta.default_tag.as_deref(), Some("openff"));
    assert_eq!(meta.extra["owner_user"], json!("bot"));
}

#[test]
fn record_item_embeds_the_full_record() {
    let item: DatasetRecordItem = serde_json::from_value(json!({
        "entry_name": "water",
        "specification_name": "b3lyp/def2-svp",
        "record_id": 12,
        "record": {
            "id": 12,
            "status": "error",
            "manager_name": "cluster-a",
            "modified_on": "2023-04-01T10:00:00Z"
        }
    }))
    .unwrap();

    let record: &Record = item.record.as_ref().unwrap();
    assert_eq!(record.status, RecordStatus::Error);
    assert!(record.status.is_terminal());
    assert_eq!(record.compute_tag.as_deref(), Some("cluster-a"));
    assert_eq!(item.key().to_string(), "(water, b3lyp/def2-svp)");
}

#[test]
fn bulk_report_covers_every_submitted_name() {
    let meta: InsertMetadata = serde_json::from_value(json!({
        "inserted_idx": [1],
        "existing_idx": [0],
        "errors": [[2, "invalid molecule"]]
    }))
    .unwrap();

    let report = BulkReport::from_insert_metadata(["water", "ammonia", "bad"], &meta);

    assert_eq!(report.len(), 3);
    assert_eq!(report.existing().collect::<Vec<_>>(), vec!["water"]);
    assert_eq!(report.rejected().count(), 1);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn request_error_always_has_a_message() {
    let err = RequestError::from_details(503, Map::new(), "Service Unavailable");

    assert_eq!(err.details["msg"], json!("Service Unavailable"));
    assert_eq!(err.message, "Service Unavailable");

    let wrapped = PortalError::from(err);
    assert_eq!(wrapped.status_code(), Some(503));
    assert_eq!(wrapped.category(), ErrorCategory::Request);
}
