use super::{FakeContainers, FakeModel, FakeResources, FakeSystem, TestUtils};
use crate::ai::AIError;
use crate::error::RcaError;
use crate::pipeline::{Collaborators, Pipeline, RunRequest};
use crate::report::ReportStore;
use crate::scanner::ScanRequest;
use std::path::PathBuf;
use tempfile::TempDir;

async fn run_with(model: &FakeModel, scan: ScanRequest, reports: &TempDir) -> Result<(), RcaError> {
    let system = FakeSystem::default();
    let containers = FakeContainers::default();
    let resources = FakeResources::default();
    let pipeline = Pipeline::new(
        TestUtils::isolated_scanner(),
        Collaborators {
            system: &system,
            containers: &containers,
            resources: &resources,
            model,
        },
        ReportStore::new(reports.path().to_path_buf()),
    );
    pipeline
        .run(&RunRequest {
            description: "kernel panic on boot".to_string(),
            scan,
            triage: false,
        })
        .await
        .map(|_| ())
}

#[tokio::test]
async fn test_missing_log_file_stops_before_model() {
    let model = FakeModel::answering("unused");
    let reports = TempDir::new().unwrap();
    let err = run_with(
        &model,
        ScanRequest::File(PathBuf::from("/no/such/dir/app.log")),
        &reports,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RcaError::FileNotFound(_)));
    assert!(err.is_user_error());
    assert!(model.prompts().is_empty());
    assert_eq!(std::fs::read_dir(reports.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_model_failure_is_wrapped_once() {
    let model = FakeModel::failing();
    let reports = TempDir::new().unwrap();
    let err = run_with(&model, ScanRequest::Quick, &reports).await.unwrap_err();

    match &err {
        RcaError::AnalysisFailed(AIError::Unreachable { reason, .. }) => {
            assert_eq!(reason, "connection refused")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("Failed to get response from model"));
    assert_eq!(model.prompts().len(), 1);
    assert_eq!(std::fs::read_dir(reports.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unparseable_bytes_still_produce_a_run() {
    let model = FakeModel::answering("ok");
    let reports = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binary.log");
    let mut bytes = vec![0xff, 0xfe];
    bytes.extend_from_slice(b"disk error xyz");
    std::fs::write(&path, bytes).unwrap();

    run_with(&model, ScanRequest::File(path), &reports).await.unwrap();
    assert!(model.prompts()[0].contains("disk error xyz"));
}
