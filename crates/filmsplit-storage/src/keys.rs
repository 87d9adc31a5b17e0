//! Shared bucket and key validation for storage backends.
//!
//! Object keys are opaque to S3; only the local backend maps them onto
//! filesystem paths and needs to check for traversal.

use std::path::{Component, Path};

use crate::traits::{StorageError, StorageResult};

/// Reject empty keys.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    Ok(())
}

/// Reject keys that would leave a bucket directory once used as a relative path.
///
/// Checked per path segment, so `clip..v2.mp4` is fine while `../clip.mp4` is not.
pub fn validate_path_key(key: &str) -> StorageResult<()> {
    validate_key(key)?;
    let escapes = Path::new(key).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(StorageError::InvalidKey(format!(
            "Storage key {:?} escapes the bucket directory",
            key
        )));
    }
    Ok(())
}

/// Bucket names are a single path component.
pub fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {:?}",
            bucket
        )));
    }
    Ok(())
}
