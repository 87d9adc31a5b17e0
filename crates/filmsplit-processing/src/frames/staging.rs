//! Local staging area shared by the download, extraction and upload stages.
//!
//! With [`StagingLayout::Shared`] every job works directly in the staging root,
//! so two concurrent jobs for the same source key race on the same input path.
//! [`StagingLayout::PerJob`] gives each job its own subdirectory. In both layouts
//! staged files are left in place after the job.

use std::path::PathBuf;

use filmsplit_core::{JobContext, PipelineError, PipelineResult, StagingLayout};
use uuid::Uuid;

use super::naming::frame_index;

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
    layout: StagingLayout,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>, layout: StagingLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    /// Directory a job with `job_id` stages its files in. Pure; nothing is created.
    pub fn job_dir(&self, job_id: Uuid) -> PathBuf {
        match self.layout {
            StagingLayout::Shared => self.root.clone(),
            StagingLayout::PerJob => self.root.join(job_id.to_string()),
        }
    }

    /// Write the downloaded source video to the job's input path.
    pub async fn write_input(&self, ctx: &JobContext, data: &[u8]) -> PipelineResult<PathBuf> {
        tokio::fs::create_dir_all(ctx.staging_dir())
            .await
            .map_err(|e| PipelineError::write(ctx.staging_dir(), e))?;

        let input_path = ctx.input_path();
        tokio::fs::write(&input_path, data)
            .await
            .map_err(|e| PipelineError::write(&input_path, e))?;

        Ok(input_path)
    }

    /// Names of the frames this job produced, in frame order.
    ///
    /// Only the immediate entries of the job's staging directory are considered,
    /// and only names matching the job's frame pattern are kept.
    pub async fn list_outputs(&self, ctx: &JobContext) -> PipelineResult<Vec<String>> {
        let dir = ctx.staging_dir();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| PipelineError::list(dir, e))?;

        let mut frames: Vec<(u64, String)> = Vec::new();
        let mut skipped = 0usize;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::list(dir, e))?
        {
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                skipped += 1;
                continue;
            };
            match frame_index(&name, &ctx.file_stem) {
                Some(index) => frames.push((index, name)),
                None => skipped += 1,
            }
        }

        frames.sort();

        tracing::debug!(
            staging_dir = %dir.display(),
            frame_count = frames.len(),
            skipped,
            "Staging directory listed"
        );

        Ok(frames.into_iter().map(|(_, name)| name).collect())
    }
}
