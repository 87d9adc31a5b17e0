//! Trigger event payloads.
//!
//! The invocation harness delivers S3 object notifications shaped like
//! `{"Records": [{"s3": {"bucket": {"name": ..}, "object": {"key": ..}}}]}`.
//! Object keys arrive form-encoded: `+` stands for a space and everything else
//! is percent-encoded.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl S3Event {
    /// Build a single-record notification for `bucket`/`key`, encoding the key
    /// the way S3 does in event payloads.
    pub fn for_object(bucket: impl Into<String>, key: &str) -> Self {
        let encoded = urlencoding::encode(key).replace("%20", "+");
        S3Event {
            records: vec![S3EventRecord {
                s3: S3Entity {
                    bucket: S3Bucket {
                        name: bucket.into(),
                    },
                    object: S3Object {
                        key: encoded,
                        size: None,
                    },
                },
                event_name: Some("ObjectCreated:Put".to_string()),
            }],
        }
    }
}

/// Decode an object key from a notification: `+` becomes a space first, then
/// percent-escapes are resolved.
pub fn decode_object_key(raw: &str) -> Result<String, PipelineError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| PipelineError::InvalidEvent(format!("object key {:?} is not valid UTF-8 after decoding: {}", raw, e)))
}

/// The identifying fields of one invocation: source bucket and decoded key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    bucket: String,
    key: String,
}

impl TriggerEvent {
    /// Create a trigger from an already-decoded key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Take the first record of a notification. Additional records are ignored.
    pub fn from_s3_event(event: &S3Event) -> Result<Self, PipelineError> {
        let record = event
            .records
            .first()
            .ok_or_else(|| PipelineError::InvalidEvent("event contains no records".to_string()))?;

        if event.records.len() > 1 {
            tracing::warn!(
                record_count = event.records.len(),
                "Trigger event has multiple records; only the first is processed"
            );
        }

        let bucket = record.s3.bucket.name.trim();
        if bucket.is_empty() {
            return Err(PipelineError::InvalidEvent(
                "bucket name is empty".to_string(),
            ));
        }

        let key = decode_object_key(&record.s3.object.key)?;
        if key.is_empty() {
            return Err(PipelineError::InvalidEvent("object key is empty".to_string()));
        }

        Ok(Self::new(bucket, key))
    }

    /// Parse a raw harness payload.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self, PipelineError> {
        let event: S3Event = serde_json::from_value(payload)
            .map_err(|e| PipelineError::InvalidEvent(format!("malformed payload: {}", e)))?;
        Self::from_s3_event(&event)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
