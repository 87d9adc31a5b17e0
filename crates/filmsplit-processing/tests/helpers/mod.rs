//! Shared fixtures for the pipeline integration tests.
//!
//! Run with `cargo test -p filmsplit-processing`.

#![allow(dead_code)]

use async_trait::async_trait;
use filmsplit_core::{PipelineConfig, PipelineError, PipelineResult, StagingLayout, StorageBackend};
use filmsplit_processing::frames::frame_file_name;
use filmsplit_processing::{FrameExtractor, FrameOrchestrator};
use filmsplit_storage::{Storage, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Barrier;

pub const SOURCE_BUCKET: &str = "film-talk-input";
pub const DESTINATION_BUCKET: &str = "film-talk-output";

/// In-memory storage keyed by `(bucket, key)`.
pub struct MockStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    failing_puts: Mutex<HashSet<String>>,
    put_attempts: AtomicUsize,
    put_gate: Option<Arc<Barrier>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            failing_puts: Mutex::new(HashSet::new()),
            put_attempts: AtomicUsize::new(0),
            put_gate: None,
        }
    }

    /// Every `put` waits on `gate` before storing, so puts only complete once
    /// `gate`'s full party count is in flight at the same time.
    pub fn with_put_gate(gate: Arc<Barrier>) -> Self {
        Self {
            put_gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn set_object(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys stored in `bucket`.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Make every `put` of `key` fail.
    pub fn fail_put(&self, key: &str) {
        self.failing_puts.lock().unwrap().insert(key.to_string());
    }

    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.object(bucket, key)
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", bucket, key)))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.put_gate {
            gate.wait().await;
        }
        if self.failing_puts.lock().unwrap().contains(key) {
            return Err(StorageError::UploadFailed(format!("injected failure for {}", key)));
        }
        self.set_object(bucket, key, &data);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Extractor that writes `frames` numbered images next to the output pattern, or fails.
pub struct FakeExtractor {
    frames: u64,
    failure: Option<String>,
    frames_as_directories: bool,
    calls: AtomicUsize,
    last_pattern: Mutex<Option<PathBuf>>,
}

impl FakeExtractor {
    pub fn producing(frames: u64) -> Self {
        Self {
            frames,
            failure: None,
            frames_as_directories: false,
            calls: AtomicUsize::new(0),
            last_pattern: Mutex::new(None),
        }
    }

    pub fn failing(diagnostics: &str) -> Self {
        Self {
            failure: Some(diagnostics.to_string()),
            ..Self::producing(0)
        }
    }

    /// Creates directories under the frame names, which list fine but cannot be read.
    pub fn producing_directories(frames: u64) -> Self {
        Self {
            frames_as_directories: true,
            ..Self::producing(frames)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_pattern(&self) -> Option<PathBuf> {
        self.last_pattern.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrameExtractor for FakeExtractor {
    async fn extract(&self, input: &Path, output_pattern: &Path) -> PipelineResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_pattern.lock().unwrap() = Some(output_pattern.to_path_buf());

        assert!(input.exists(), "extractor ran before the input was staged");

        if let Some(diagnostics) = &self.failure {
            return Err(PipelineError::extraction_exit(Some(1), diagnostics.clone()));
        }

        let dir = output_pattern.parent().unwrap();
        let stem = output_pattern
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .strip_suffix("-out%d.png")
            .unwrap()
            .replace("%%", "%");
        for index in 1..=self.frames {
            let path = dir.join(frame_file_name(&stem, index));
            if self.frames_as_directories {
                tokio::fs::create_dir_all(&path).await.unwrap();
            } else {
                tokio::fs::write(&path, format!("frame {}", index))
                    .await
                    .unwrap();
            }
        }
        Ok(())
    }
}

/// Orchestrator wired to fakes, staging into a fresh temporary directory.
pub struct TestPipeline {
    pub storage: Arc<MockStorage>,
    pub extractor: Arc<FakeExtractor>,
    pub orchestrator: FrameOrchestrator,
    pub staging_root: PathBuf,
    _temp_dir: TempDir,
}

impl TestPipeline {
    pub fn new(storage: MockStorage, extractor: FakeExtractor) -> Self {
        Self::with_layout(storage, extractor, StagingLayout::Shared)
    }

    pub fn with_layout(storage: MockStorage, extractor: FakeExtractor, layout: StagingLayout) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        // Not created up front: the pipeline creates it when staging the input.
        let staging_root = temp_dir.path().join("staging");

        let storage = Arc::new(storage);
        let extractor = Arc::new(extractor);
        let config = PipelineConfig::new(staging_root.clone(), DESTINATION_BUCKET, "ffmpeg")
            .with_staging_layout(layout);
        let orchestrator = FrameOrchestrator::new(storage.clone(), extractor.clone(), config);

        Self {
            storage,
            extractor,
            orchestrator,
            staging_root,
            _temp_dir: temp_dir,
        }
    }
}
