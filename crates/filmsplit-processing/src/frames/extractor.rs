//! Frame extractor: runs ffmpeg to sample one frame per second of video.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use filmsplit_core::{PipelineError, PipelineResult};
use tokio::process::Command;

/// Turns a staged video into numbered frame images.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Write frames for `input` using `output_pattern` (a path containing `%d`).
    ///
    /// Resolves only once the extraction has finished; a failure carries the
    /// tool's diagnostic output.
    async fn extract(&self, input: &Path, output_pattern: &Path) -> PipelineResult<()>;
}

/// Arguments for one-frame-per-second extraction.
///
/// `-y` lets a re-run for the same key overwrite frames from an earlier run
/// instead of stopping at ffmpeg's overwrite prompt.
pub fn frame_extraction_args(input: &Path, output_pattern: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        "fps=1".to_string(),
        output_pattern.to_string_lossy().to_string(),
    ]
}

#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    ffmpeg_path: String,
}

impl FfmpegExtractor {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    #[tracing::instrument(skip(self), fields(ffmpeg = %self.ffmpeg_path))]
    async fn extract(&self, input: &Path, output_pattern: &Path) -> PipelineResult<()> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffmpeg_path)
            .args(frame_extraction_args(input, output_pattern))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PipelineError::extraction_spawn(&self.ffmpeg_path, &e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(PipelineError::extraction_exit(output.status.code(), stderr));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Frame extraction finished"
        );
        Ok(())
    }
}
