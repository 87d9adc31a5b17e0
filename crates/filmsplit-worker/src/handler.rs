//! Invocation handler
//!
//! One handler is built per process and reused for every invocation. Each
//! invocation is independent: no state carries over from one job to the next.

use std::sync::Arc;

use anyhow::Context;
use filmsplit_core::{Config, PipelineConfig, PipelineResult, TriggerEvent};
use filmsplit_processing::{FfmpegExtractor, FrameExtractor, FrameOrchestrator, JobReport};
use filmsplit_storage::{create_storage, Storage};

use crate::completion::Completion;

pub struct InvocationHandler {
    orchestrator: FrameOrchestrator,
}

impl InvocationHandler {
    pub fn new(
        storage: Arc<dyn Storage>,
        extractor: Arc<dyn FrameExtractor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            orchestrator: FrameOrchestrator::new(storage, extractor, config),
        }
    }

    /// Wire the configured storage backend and ffmpeg binary.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage = create_storage(&config.storage)
            .await
            .context("Failed to initialize storage backend")?;
        let extractor = Arc::new(FfmpegExtractor::new(config.pipeline.extractor_binary.clone()));

        tracing::info!(
            backend = %storage.backend_type(),
            staging_dir = %config.pipeline.staging_dir.display(),
            destination_bucket = %config.pipeline.destination_bucket,
            ffmpeg = %config.pipeline.extractor_binary,
            "Invocation handler ready"
        );

        Ok(Self::new(storage, extractor, config.pipeline.clone()))
    }

    /// Handle one trigger payload.
    ///
    /// `completion` is told the outcome exactly once, after every stage has
    /// resolved. The same outcome is returned to the caller.
    pub async fn handle(
        &self,
        payload: serde_json::Value,
        completion: Box<dyn Completion>,
    ) -> PipelineResult<JobReport> {
        let result = match TriggerEvent::from_payload(payload) {
            Ok(trigger) => self.orchestrator.run(trigger).await,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected trigger payload");
                Err(e)
            }
        };

        match &result {
            Ok(_) => completion.succeed(),
            Err(e) => completion.fail(e.clone()),
        }
        result
    }
}
