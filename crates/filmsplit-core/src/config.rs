//! Configuration module
//!
//! The environment mode (`FILMSPLIT_MODE=local|deployed`) picks a set of defaults;
//! individual variables override them. Only [`Config`] reads the process
//! environment. The orchestrator is handed a [`PipelineConfig`] value and never
//! looks at environment state itself.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::storage_types::StorageBackend;

const DEFAULT_DESTINATION_BUCKET: &str = "lambda-film-talk-output";
const DEFAULT_LOG_FILTER: &str = "filmsplit=info";
const SERVICE_NAME: &str = "filmsplit";

/// Where the process runs; selects the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    Local,
    Deployed,
}

impl FromStr for EnvironmentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "development" | "dev" => Ok(EnvironmentMode::Local),
            "deployed" | "production" | "prod" | "lambda" => Ok(EnvironmentMode::Deployed),
            _ => Err(anyhow::anyhow!("Invalid environment mode: {}", s)),
        }
    }
}

impl Display for EnvironmentMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EnvironmentMode::Local => write!(f, "local"),
            EnvironmentMode::Deployed => write!(f, "deployed"),
        }
    }
}

/// How invocations share the staging directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StagingLayout {
    /// All jobs stage directly in the staging directory; filenames embed the slug.
    #[default]
    Shared,
    /// Each job stages in its own `<staging_dir>/<job_id>/` subdirectory.
    PerJob,
}

impl FromStr for StagingLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shared" => Ok(StagingLayout::Shared),
            "per-job" | "per_job" | "perjob" => Ok(StagingLayout::PerJob),
            _ => Err(anyhow::anyhow!("Invalid staging layout: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// The values the orchestrator is constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub staging_dir: PathBuf,
    pub destination_bucket: String,
    pub extractor_binary: String,
    pub staging_layout: StagingLayout,
}

impl PipelineConfig {
    pub fn new(
        staging_dir: impl Into<PathBuf>,
        destination_bucket: impl Into<String>,
        extractor_binary: impl Into<String>,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            destination_bucket: destination_bucket.into(),
            extractor_binary: extractor_binary.into(),
            staging_layout: StagingLayout::Shared,
        }
    }

    pub fn with_staging_layout(mut self, staging_layout: StagingLayout) -> Self {
        self.staging_layout = staging_layout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, LocalStack, ...)
    pub s3_endpoint: Option<String>,
    /// Root directory of the local backend; each bucket is a subdirectory.
    pub local_storage_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_format: LogFormat,
    /// Used when `RUST_LOG` is not set.
    pub default_filter: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub mode: EnvironmentMode,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

struct ModeDefaults {
    staging_dir: &'static str,
    extractor_binary: &'static str,
    storage_backend: StorageBackend,
    local_storage_path: &'static str,
    log_format: LogFormat,
}

impl EnvironmentMode {
    fn defaults(self) -> ModeDefaults {
        match self {
            EnvironmentMode::Local => ModeDefaults {
                staging_dir: "./assets",
                extractor_binary: "ffmpeg",
                storage_backend: StorageBackend::Local,
                local_storage_path: "./buckets",
                log_format: LogFormat::Pretty,
            },
            EnvironmentMode::Deployed => ModeDefaults {
                staging_dir: "/tmp",
                extractor_binary: "/opt/bin/ffmpeg",
                storage_backend: StorageBackend::S3,
                local_storage_path: "/tmp/buckets",
                log_format: LogFormat::Json,
            },
        }
    }
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mode = match var("FILMSPLIT_MODE") {
            Some(value) => value.parse()?,
            None => EnvironmentMode::Local,
        };
        let defaults = mode.defaults();

        let staging_layout = match var("STAGING_LAYOUT") {
            Some(value) => value.parse()?,
            None => StagingLayout::default(),
        };

        let pipeline = PipelineConfig {
            staging_dir: var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(defaults.staging_dir)),
            destination_bucket: var("DESTINATION_BUCKET")
                .unwrap_or_else(|| DEFAULT_DESTINATION_BUCKET.to_string()),
            extractor_binary: var("EXTRACTOR_BINARY")
                .unwrap_or_else(|| defaults.extractor_binary.to_string()),
            staging_layout,
        };

        let backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.storage_backend,
        };

        let storage = StorageConfig {
            backend,
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            local_storage_path: var("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(defaults.local_storage_path)),
        };

        let log_format = match var("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => defaults.log_format,
        };

        let telemetry = TelemetryConfig {
            service_name: var("SERVICE_NAME").unwrap_or_else(|| SERVICE_NAME.to_string()),
            log_format,
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        };

        Ok(Config {
            mode,
            pipeline,
            storage,
            telemetry,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.pipeline.destination_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("DESTINATION_BUCKET must not be empty"));
        }
        if self.pipeline.extractor_binary.trim().is_empty() {
            return Err(anyhow::anyhow!("EXTRACTOR_BINARY must not be empty"));
        }
        if self.pipeline.staging_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("STAGING_DIR must not be empty"));
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.s3_region.is_none() {
            return Err(anyhow::anyhow!(
                "S3_REGION or AWS_REGION must be set for the s3 storage backend"
            ));
        }
        Ok(())
    }

    pub fn is_deployed(&self) -> bool {
        self.mode == EnvironmentMode::Deployed
    }
}
