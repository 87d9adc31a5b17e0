mod helpers;

use filmsplit_core::{JobStage, PipelineError, S3Event, StagingLayout, TriggerEvent};
use helpers::{FakeExtractor, MockStorage, TestPipeline, DESTINATION_BUCKET, SOURCE_BUCKET};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

fn storage_with(key: &str, data: &[u8]) -> MockStorage {
    let storage = MockStorage::new();
    storage.set_object(SOURCE_BUCKET, key, data);
    storage
}

#[tokio::test]
async fn test_clip_is_split_into_uploaded_frames() {
    let pipeline = TestPipeline::new(storage_with("clip.mp4", b"video bytes"), FakeExtractor::producing(3));

    let report = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "clip.mp4"))
        .await
        .unwrap();

    assert_eq!(report.slug, "clip");
    assert_eq!(report.source_bucket, SOURCE_BUCKET);
    assert_eq!(report.destination_bucket, DESTINATION_BUCKET);
    assert_eq!(
        report.uploaded,
        vec!["clip-out1.png", "clip-out2.png", "clip-out3.png"]
    );
    assert_eq!(
        pipeline.storage.keys(DESTINATION_BUCKET),
        vec!["clip-out1.png", "clip-out2.png", "clip-out3.png"]
    );
    assert_eq!(
        pipeline.storage.object(DESTINATION_BUCKET, "clip-out2.png").unwrap(),
        b"frame 2"
    );

    // Staged files are left behind.
    let staged = std::fs::read(pipeline.staging_root.join("clip.mp4")).unwrap();
    assert_eq!(staged, b"video bytes");
    assert!(pipeline.staging_root.join("clip-out1.png").exists());
    assert_eq!(
        pipeline.extractor.last_pattern().unwrap(),
        pipeline.staging_root.join("clip-out%d.png")
    );
}

#[tokio::test]
async fn test_missing_key_fails_without_touching_staging() {
    let pipeline = TestPipeline::new(MockStorage::new(), FakeExtractor::producing(3));

    let err = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "missing.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Fetch { not_found: true, .. }));
    assert_eq!(err.stage(), JobStage::Start);
    assert_eq!(pipeline.extractor.calls(), 0);
    assert_eq!(pipeline.storage.put_attempts(), 0);
    assert!(!pipeline.staging_root.exists());
}

#[tokio::test]
async fn test_extractor_failure_keeps_diagnostics_and_uploads_nothing() {
    let diagnostics = "clip.mp4: moov atom not found\nInvalid data found when processing input";
    let pipeline = TestPipeline::new(
        storage_with("clip.mp4", b"not a video"),
        FakeExtractor::failing(diagnostics),
    );

    let err = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "clip.mp4"))
        .await
        .unwrap_err();

    match &err {
        PipelineError::Extraction { diagnostics: d, code, .. } => {
            assert_eq!(d, diagnostics);
            assert_eq!(*code, Some(1));
        }
        other => panic!("expected extraction error, got {:?}", other),
    }
    assert_eq!(err.stage(), JobStage::Downloaded);
    assert_eq!(pipeline.storage.put_attempts(), 0);
}

#[tokio::test]
async fn test_no_frames_is_a_successful_job() {
    let pipeline = TestPipeline::new(storage_with("short.mp4", b"video"), FakeExtractor::producing(0));

    let report = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "short.mp4"))
        .await
        .unwrap();

    assert!(report.uploaded.is_empty());
    assert_eq!(pipeline.storage.put_attempts(), 0);
}

#[tokio::test]
async fn test_files_from_other_jobs_are_not_uploaded() {
    let pipeline = TestPipeline::new(storage_with("clip.mp4", b"video"), FakeExtractor::producing(2));
    std::fs::create_dir_all(&pipeline.staging_root).unwrap();
    for name in ["other-out1.png", "clip2-out1.png", "unrelated.png", "clip-out.png"] {
        std::fs::write(pipeline.staging_root.join(name), b"stale").unwrap();
    }

    let report = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "clip.mp4"))
        .await
        .unwrap();

    assert_eq!(report.uploaded, vec!["clip-out1.png", "clip-out2.png"]);
    assert_eq!(
        pipeline.storage.keys(DESTINATION_BUCKET),
        vec!["clip-out1.png", "clip-out2.png"]
    );
}

#[tokio::test]
async fn test_one_failed_upload_fails_the_job_after_all_attempts() {
    let storage = storage_with("clip.mp4", b"video");
    storage.fail_put("clip-out2.png");
    let pipeline = TestPipeline::new(storage, FakeExtractor::producing(3));

    let err = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "clip.mp4"))
        .await
        .unwrap_err();

    match &err {
        PipelineError::Upload { bucket, key, .. } => {
            assert_eq!(bucket, DESTINATION_BUCKET);
            assert_eq!(key, "clip-out2.png");
        }
        other => panic!("expected upload error, got {:?}", other),
    }
    assert_eq!(err.stage(), JobStage::Listed);
    assert_eq!(pipeline.storage.put_attempts(), 3);
    assert_eq!(
        pipeline.storage.keys(DESTINATION_BUCKET),
        vec!["clip-out1.png", "clip-out3.png"]
    );
}

#[tokio::test]
async fn test_uploads_run_concurrently() {
    // Each put blocks until all three are in flight.
    let storage = MockStorage::with_put_gate(Arc::new(Barrier::new(3)));
    storage.set_object(SOURCE_BUCKET, "clip.mp4", b"video");
    let pipeline = TestPipeline::new(storage, FakeExtractor::producing(3));

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline
            .orchestrator
            .run(TriggerEvent::new(SOURCE_BUCKET, "clip.mp4")),
    )
    .await
    .expect("uploads were not started concurrently")
    .unwrap();

    assert_eq!(report.uploaded.len(), 3);
}

#[tokio::test]
async fn test_encoded_key_is_decoded_before_fetch() {
    let pipeline = TestPipeline::new(storage_with("my clip.mp4", b"video"), FakeExtractor::producing(1));
    let payload = serde_json::to_value(S3Event::for_object(SOURCE_BUCKET, "my clip.mp4")).unwrap();
    assert_eq!(payload["Records"][0]["s3"]["object"]["key"], "my+clip.mp4");

    let trigger = TriggerEvent::from_payload(payload).unwrap();
    let report = pipeline.orchestrator.run(trigger).await.unwrap();

    assert_eq!(report.source_key, "my clip.mp4");
    assert_eq!(report.uploaded, vec!["my clip-out1.png"]);
    assert!(pipeline.staging_root.join("my clip.mp4").exists());
}

#[tokio::test]
async fn test_nested_key_is_flattened_for_staging() {
    let pipeline = TestPipeline::new(
        storage_with("videos/2024/clip.mp4", b"video"),
        FakeExtractor::producing(2),
    );

    let report = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "videos/2024/clip.mp4"))
        .await
        .unwrap();

    assert_eq!(report.slug, "videos/2024/clip");
    assert_eq!(
        report.uploaded,
        vec!["videos%2F2024%2Fclip-out1.png", "videos%2F2024%2Fclip-out2.png"]
    );
    assert!(pipeline.staging_root.join("videos%2F2024%2Fclip.mp4").exists());
}

#[tokio::test]
async fn test_nested_and_flat_keys_do_not_share_staged_files() {
    let storage = MockStorage::new();
    storage.set_object(SOURCE_BUCKET, "videos/clip.mp4", b"nested");
    storage.set_object(SOURCE_BUCKET, "videos_clip.mp4", b"flat");
    let pipeline = TestPipeline::new(storage, FakeExtractor::producing(1));

    let (nested, flat) = tokio::join!(
        pipeline.orchestrator.run(TriggerEvent::new(SOURCE_BUCKET, "videos/clip.mp4")),
        pipeline.orchestrator.run(TriggerEvent::new(SOURCE_BUCKET, "videos_clip.mp4")),
    );

    assert_eq!(nested.unwrap().uploaded, vec!["videos%2Fclip-out1.png"]);
    assert_eq!(flat.unwrap().uploaded, vec!["videos_clip-out1.png"]);
    assert_eq!(
        std::fs::read(pipeline.staging_root.join("videos%2Fclip.mp4")).unwrap(),
        b"nested"
    );
    assert_eq!(
        std::fs::read(pipeline.staging_root.join("videos_clip.mp4")).unwrap(),
        b"flat"
    );
}

#[tokio::test]
async fn test_percent_in_key_reaches_the_extractor_escaped() {
    let pipeline = TestPipeline::new(storage_with("100%.mp4", b"video"), FakeExtractor::producing(2));
    let payload = serde_json::to_value(S3Event::for_object(SOURCE_BUCKET, "100%.mp4")).unwrap();
    assert_eq!(payload["Records"][0]["s3"]["object"]["key"], "100%25.mp4");

    let report = pipeline
        .orchestrator
        .run(TriggerEvent::from_payload(payload).unwrap())
        .await
        .unwrap();

    assert_eq!(
        pipeline.extractor.last_pattern().unwrap(),
        pipeline.staging_root.join("100%%25-out%d.png")
    );
    assert_eq!(report.uploaded, vec!["100%25-out1.png", "100%25-out2.png"]);
}

#[tokio::test]
async fn test_unwritable_staging_root_fails_before_extraction() {
    let pipeline = TestPipeline::new(storage_with("clip.mp4", b"video"), FakeExtractor::producing(3));
    // A regular file where the staging directory should be.
    std::fs::write(&pipeline.staging_root, b"not a directory").unwrap();

    let err = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "clip.mp4"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "WRITE_ERROR");
    assert_eq!(err.stage(), JobStage::Start);
    assert_eq!(pipeline.extractor.calls(), 0);
    assert_eq!(pipeline.storage.put_attempts(), 0);
}

#[tokio::test]
async fn test_unreadable_frame_fails_the_upload_stage() {
    let pipeline = TestPipeline::new(
        storage_with("clip.mp4", b"video"),
        FakeExtractor::producing_directories(1),
    );

    let err = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "clip.mp4"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "READ_ERROR");
    assert_eq!(err.stage(), JobStage::Listed);
    assert!(matches!(err, PipelineError::Read { ref path, .. } if path.ends_with("clip-out1.png")));
    assert_eq!(pipeline.storage.put_attempts(), 0);
}

#[tokio::test]
async fn test_per_job_layout_isolates_staging() {
    let pipeline = TestPipeline::with_layout(
        storage_with("clip.mp4", b"video"),
        FakeExtractor::producing(2),
        StagingLayout::PerJob,
    );

    let report = pipeline
        .orchestrator
        .run(TriggerEvent::new(SOURCE_BUCKET, "clip.mp4"))
        .await
        .unwrap();

    let job_dir = pipeline.staging_root.join(report.job_id.to_string());
    assert!(job_dir.join("clip.mp4").exists());
    assert!(job_dir.join("clip-out1.png").exists());
    assert!(!pipeline.staging_root.join("clip.mp4").exists());
    assert_eq!(report.uploaded, vec!["clip-out1.png", "clip-out2.png"]);
}

#[tokio::test]
async fn test_concurrent_jobs_for_different_keys_share_staging() {
    let storage = MockStorage::new();
    storage.set_object(SOURCE_BUCKET, "a.mp4", b"a");
    storage.set_object(SOURCE_BUCKET, "b.mp4", b"b");
    let pipeline = TestPipeline::new(storage, FakeExtractor::producing(2));

    let (a, b) = tokio::join!(
        pipeline.orchestrator.run(TriggerEvent::new(SOURCE_BUCKET, "a.mp4")),
        pipeline.orchestrator.run(TriggerEvent::new(SOURCE_BUCKET, "b.mp4")),
    );

    assert_eq!(a.unwrap().uploaded, vec!["a-out1.png", "a-out2.png"]);
    assert_eq!(b.unwrap().uploaded, vec!["b-out1.png", "b-out2.png"]);
    assert_eq!(pipeline.extractor.calls(), 2);
}
