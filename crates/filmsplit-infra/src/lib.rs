//! filmsplit Infrastructure Library
//!
//! Shared infrastructure used by the filmsplit binaries:
//! - Telemetry initialization (structured logging)

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "observability-basic")]
pub use telemetry::{build_filter, init_telemetry, shutdown_telemetry};
