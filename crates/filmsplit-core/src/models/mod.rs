pub mod event;
pub mod job;

pub use event::{decode_object_key, S3Bucket, S3Entity, S3Event, S3EventRecord, S3Object, TriggerEvent};
pub use job::{derive_slug, flatten_key, JobContext, JobStage};
