//! filmsplit core library
//!
//! This crate provides the configuration, error taxonomy and domain models
//! (trigger events, job context) shared by every filmsplit component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    Config, EnvironmentMode, LogFormat, PipelineConfig, StagingLayout, StorageConfig,
    TelemetryConfig,
};
pub use error::{LogLevel, PipelineError, PipelineResult};
pub use models::{JobContext, JobStage, S3Event, TriggerEvent};
pub use storage_types::StorageBackend;
