//! Helpers for the `filmsplit` binary.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use filmsplit_core::S3Event;

/// Where `invoke` takes its trigger payload from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    /// Build a single-record notification for this object.
    Object { bucket: String, key: String },
    /// Read a notification JSON document from a file, or stdin for `-`.
    File(String),
}

impl EventSource {
    pub fn from_args(
        bucket: Option<String>,
        key: Option<String>,
        event: Option<String>,
    ) -> anyhow::Result<Self> {
        match (bucket, key, event) {
            (_, _, Some(path)) => Ok(EventSource::File(path)),
            (Some(bucket), Some(key), None) => Ok(EventSource::Object { bucket, key }),
            _ => anyhow::bail!("Either --event or both --bucket and --key are required"),
        }
    }

    pub fn load(&self) -> anyhow::Result<serde_json::Value> {
        match self {
            EventSource::Object { bucket, key } => {
                serde_json::to_value(S3Event::for_object(bucket.clone(), key))
                    .context("Serialize trigger event")
            }
            EventSource::File(path) if path == "-" => {
                let mut raw = String::new();
                std::io::stdin()
                    .read_to_string(&mut raw)
                    .context("Read event from stdin")?;
                parse_event(&raw)
            }
            EventSource::File(path) => {
                let raw = std::fs::read_to_string(Path::new(path))
                    .with_context(|| format!("Read event file {}", path))?;
                parse_event(&raw)
            }
        }
    }
}

fn parse_event(raw: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(raw).context("Event is not valid JSON")
}
