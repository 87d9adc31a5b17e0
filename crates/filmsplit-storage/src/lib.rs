//! filmsplit storage library
//!
//! This crate provides the blob-store capability the pipeline consumes
//! (`get(bucket, key)` / `put(bucket, key, bytes)`) and its implementations for
//! S3 and the local filesystem.
//!
//! # Keys
//!
//! Keys are used exactly as given by the caller; no prefix or namespacing is
//! added. Keys must not be empty, contain `..` or start with `/`. Validation is
//! centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filmsplit_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
