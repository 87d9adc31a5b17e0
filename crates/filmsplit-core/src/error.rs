//! Error types module
//!
//! Every pipeline stage fails with one variant of [`PipelineError`]. Stage errors
//! are never recovered locally: the orchestrator propagates them unchanged to the
//! job outcome, and the invocation harness reports the first one it receives.
//!
//! I/O sources are held behind `Arc` so the error stays `Clone`; the harness hands
//! one copy to the completion callback and returns another to its caller.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::JobStage;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like malformed trigger payloads
    Debug,
    /// Warning level - for failures caused by the input (missing object, bad video)
    Warn,
    /// Error level - for infrastructure failures
    Error,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(String),

    #[error("Failed to fetch {key} from bucket {bucket}: {reason}")]
    Fetch {
        bucket: String,
        key: String,
        not_found: bool,
        reason: String,
    },

    #[error("Failed to write staged input {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Frame extraction failed ({exit}): {diagnostics}")]
    Extraction {
        exit: String,
        code: Option<i32>,
        diagnostics: String,
    },

    #[error("Failed to list staging directory {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Failed to read staged frame {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Failed to upload {key} to bucket {bucket}: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Write {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn list(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::List {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Extraction failure for a process that ran and exited with `code`
    /// (`None` when it was killed by a signal).
    pub fn extraction_exit(code: Option<i32>, diagnostics: impl Into<String>) -> Self {
        let exit = match code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        PipelineError::Extraction {
            exit,
            code,
            diagnostics: diagnostics.into(),
        }
    }

    /// Extraction failure for a process that could not be started at all.
    pub fn extraction_spawn(binary: &str, source: &io::Error) -> Self {
        PipelineError::Extraction {
            exit: format!("failed to spawn {}", binary),
            code: None,
            diagnostics: source.to_string(),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::InvalidEvent(_) => "INVALID_EVENT",
            PipelineError::Fetch { .. } => "FETCH_ERROR",
            PipelineError::Write { .. } => "WRITE_ERROR",
            PipelineError::Extraction { .. } => "EXTRACTION_ERROR",
            PipelineError::List { .. } => "LIST_ERROR",
            PipelineError::Read { .. } => "READ_ERROR",
            PipelineError::Upload { .. } => "UPLOAD_ERROR",
        }
    }

    /// The state the job was in when the failing transition started.
    pub fn stage(&self) -> JobStage {
        match self {
            PipelineError::InvalidEvent(_)
            | PipelineError::Fetch { .. }
            | PipelineError::Write { .. } => JobStage::Start,
            PipelineError::Extraction { .. } => JobStage::Downloaded,
            PipelineError::List { .. } => JobStage::Extracted,
            PipelineError::Read { .. } | PipelineError::Upload { .. } => JobStage::Listed,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            PipelineError::InvalidEvent(_) => LogLevel::Debug,
            PipelineError::Fetch { not_found: true, .. } | PipelineError::Extraction { .. } => {
                LogLevel::Warn
            }
            _ => LogLevel::Error,
        }
    }

    /// True when the source object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::Fetch { not_found: true, .. })
    }
}
