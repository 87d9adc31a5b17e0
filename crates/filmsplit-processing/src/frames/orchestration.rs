//! Frame extraction orchestration: download → extract → list → upload.
//!
//! The job is a state machine. Each call to `advance` performs one transition
//! and either yields the next state or fails the job; there is no way back to an
//! earlier state and nothing is retried.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use filmsplit_core::{
    JobContext, JobStage, LogLevel, PipelineConfig, PipelineError, PipelineResult, TriggerEvent,
};
use filmsplit_storage::Storage;

use super::extractor::FrameExtractor;
use super::naming::{output_pattern, FRAME_CONTENT_TYPE};
use super::staging::StagingArea;

/// Summary of a successful job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: Uuid,
    pub source_bucket: String,
    pub source_key: String,
    pub slug: String,
    pub destination_bucket: String,
    /// Destination keys, in frame order.
    pub uploaded: Vec<String>,
}

enum JobState {
    Start(TriggerEvent),
    Downloaded {
        ctx: JobContext,
        input_path: PathBuf,
    },
    Extracted {
        ctx: JobContext,
    },
    Listed {
        ctx: JobContext,
        frames: Vec<String>,
    },
    Uploaded {
        ctx: JobContext,
        uploaded: Vec<String>,
    },
}

impl JobState {
    fn stage(&self) -> JobStage {
        match self {
            JobState::Start(_) => JobStage::Start,
            JobState::Downloaded { .. } => JobStage::Downloaded,
            JobState::Extracted { .. } => JobStage::Extracted,
            JobState::Listed { .. } => JobStage::Listed,
            JobState::Uploaded { .. } => JobStage::Uploaded,
        }
    }
}

/// Runs one job per trigger event against a storage backend and a frame extractor.
pub struct FrameOrchestrator {
    storage: Arc<dyn Storage>,
    extractor: Arc<dyn FrameExtractor>,
    staging: StagingArea,
    config: PipelineConfig,
}

impl FrameOrchestrator {
    pub fn new(
        storage: Arc<dyn Storage>,
        extractor: Arc<dyn FrameExtractor>,
        config: PipelineConfig,
    ) -> Self {
        let staging = StagingArea::new(config.staging_dir.clone(), config.staging_layout);
        Self {
            storage,
            extractor,
            staging,
            config,
        }
    }

    /// Run the full pipeline for one trigger and return once every stage resolved.
    #[tracing::instrument(skip(self, trigger), fields(bucket = %trigger.bucket(), key = %trigger.key()))]
    pub async fn run(&self, trigger: TriggerEvent) -> PipelineResult<JobReport> {
        tracing::info!("Starting frame extraction job");

        let mut state = JobState::Start(trigger);
        loop {
            let from = state.stage();
            state = match self.advance(state).await {
                Ok(ControlFlow::Continue(next)) => next,
                Ok(ControlFlow::Break(report)) => {
                    tracing::info!(
                        job_id = %report.job_id,
                        frame_count = report.uploaded.len(),
                        destination_bucket = %report.destination_bucket,
                        "Frame extraction job completed"
                    );
                    return Ok(report);
                }
                Err(e) => {
                    log_failure(from, &e);
                    return Err(e);
                }
            };
            tracing::debug!(from = %from, to = %state.stage(), "Job state advanced");
        }
    }

    /// One transition. `Break` carries the report of a finished job.
    async fn advance(&self, state: JobState) -> PipelineResult<ControlFlow<JobReport, JobState>> {
        let next = match state {
            JobState::Start(trigger) => self.download(trigger).await?,
            JobState::Downloaded { ctx, input_path } => {
                let pattern = ctx.staging_dir().join(output_pattern(&ctx.file_stem));
                tracing::info!(slug = %ctx.slug, input = %input_path.display(), "Extracting frames");
                self.extractor.extract(&input_path, &pattern).await?;
                JobState::Extracted { ctx }
            }
            JobState::Extracted { ctx } => {
                let frames = self.staging.list_outputs(&ctx).await?;
                if frames.is_empty() {
                    tracing::warn!(slug = %ctx.slug, "Extractor produced no frames for this job");
                }
                JobState::Listed { ctx, frames }
            }
            JobState::Listed { ctx, frames } => {
                let uploaded = self.upload_frames(&ctx, frames).await?;
                JobState::Uploaded { ctx, uploaded }
            }
            JobState::Uploaded { ctx, uploaded } => {
                return Ok(ControlFlow::Break(JobReport {
                    job_id: ctx.job_id,
                    source_bucket: ctx.bucket,
                    source_key: ctx.key,
                    slug: ctx.slug,
                    destination_bucket: self.config.destination_bucket.clone(),
                    uploaded,
                }))
            }
        };
        Ok(ControlFlow::Continue(next))
    }

    /// Start → Downloaded. Nothing touches the staging area until the fetch succeeded.
    async fn download(&self, trigger: TriggerEvent) -> PipelineResult<JobState> {
        let job_id = Uuid::new_v4();
        let ctx = JobContext::new(job_id, &trigger, self.staging.job_dir(job_id));

        tracing::info!(job_id = %job_id, slug = %ctx.slug, "Downloading source video");
        let data = self
            .storage
            .get(&ctx.bucket, &ctx.key)
            .await
            .map_err(|e| PipelineError::Fetch {
                bucket: ctx.bucket.clone(),
                key: ctx.key.clone(),
                not_found: e.is_not_found(),
                reason: e.to_string(),
            })?;

        let input_path = self.staging.write_input(&ctx, &data).await?;
        tracing::info!(
            path = %input_path.display(),
            size_bytes = data.len(),
            "Source video staged"
        );

        Ok(JobState::Downloaded { ctx, input_path })
    }

    /// Listed → Uploaded. All uploads are started together and the stage waits
    /// for every one of them; the first failure to arrive becomes the job's error.
    async fn upload_frames(&self, ctx: &JobContext, frames: Vec<String>) -> PipelineResult<Vec<String>> {
        let mut first_error: Option<PipelineError> = None;
        {
            let mut pending: FuturesUnordered<_> = frames
                .iter()
                .map(|name| self.upload_frame(ctx, name))
                .collect();

            while let Some(result) = pending.next().await {
                if let Err(e) = result {
                    match first_error {
                        None => first_error = Some(e),
                        Some(_) => tracing::debug!(error = %e, "Discarding later upload failure"),
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(frames),
        }
    }

    async fn upload_frame(&self, ctx: &JobContext, name: &str) -> PipelineResult<()> {
        let path = ctx.staging_dir().join(name);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| PipelineError::read(&path, e))?;

        let bucket = &self.config.destination_bucket;
        self.storage
            .put(bucket, name, data, FRAME_CONTENT_TYPE)
            .await
            .map_err(|e| PipelineError::Upload {
                bucket: bucket.clone(),
                key: name.to_string(),
                reason: e.to_string(),
            })
    }
}

fn log_failure(stage: JobStage, error: &PipelineError) {
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(stage = %stage, code = error.error_code(), error = %error, "Frame extraction job failed")
        }
        LogLevel::Warn => {
            tracing::warn!(stage = %stage, code = error.error_code(), error = %error, "Frame extraction job failed")
        }
        LogLevel::Error => {
            tracing::error!(stage = %stage, code = error.error_code(), error = %error, "Frame extraction job failed")
        }
    }
}
