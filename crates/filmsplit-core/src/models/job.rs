//! Job context: everything one invocation derives from its trigger event.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use super::event::TriggerEvent;

/// Pipeline states, in order. `Failed` is not a state here: a failed transition
/// ends the job with a `PipelineError` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Start,
    Downloaded,
    Extracted,
    Listed,
    Uploaded,
    Done,
}

impl Display for JobStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            JobStage::Start => "start",
            JobStage::Downloaded => "downloaded",
            JobStage::Extracted => "extracted",
            JobStage::Listed => "listed",
            JobStage::Uploaded => "uploaded",
            JobStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Strip the trailing file extension from the last segment of `key`.
///
/// `clip.mp4` -> `clip`, `videos/a.b.mov` -> `videos/a.b`, `noext` -> `noext`.
/// A leading dot (`.hidden`) is not treated as an extension.
pub fn derive_slug(key: &str) -> String {
    let segment_start = key.rfind('/').map(|i| i + 1).unwrap_or(0);
    let segment = &key[segment_start..];
    match segment.rfind('.') {
        Some(dot) if dot > 0 => key[..segment_start + dot].to_string(),
        _ => key.to_string(),
    }
}

/// Flatten a key or slug into a single path component.
///
/// `%` becomes `%25` and `/` becomes `%2F`, so distinct inputs always give
/// distinct names (`videos/clip` and `videos_clip` stay apart).
pub fn flatten_key(value: &str) -> String {
    value.replace('%', "%25").replace('/', "%2F")
}

/// Per-invocation context. Never persisted, never shared between jobs.
#[derive(Debug, Clone, Serialize)]
pub struct JobContext {
    pub job_id: Uuid,
    pub bucket: String,
    pub key: String,
    pub slug: String,
    /// Slug flattened to one path component; prefix of every staged file.
    pub file_stem: String,
    pub staging_dir: PathBuf,
}

impl JobContext {
    pub fn new(job_id: Uuid, trigger: &TriggerEvent, staging_dir: impl Into<PathBuf>) -> Self {
        let slug = derive_slug(trigger.key());
        let file_stem = flatten_key(&slug);
        Self {
            job_id,
            bucket: trigger.bucket().to_string(),
            key: trigger.key().to_string(),
            slug,
            file_stem,
            staging_dir: staging_dir.into(),
        }
    }

    /// File name of the staged input video.
    pub fn input_file_name(&self) -> String {
        flatten_key(&self.key)
    }

    pub fn input_path(&self) -> PathBuf {
        self.staging_dir.join(self.input_file_name())
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }
}
