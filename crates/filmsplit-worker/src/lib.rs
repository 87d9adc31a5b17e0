//! filmsplit invocation harness
//!
//! Adapts a raw trigger payload to one pipeline run and reports the outcome
//! through a [`Completion`] exactly once.

pub mod completion;
pub mod handler;

pub use completion::{ChannelCompletion, Completion, LoggingCompletion, Outcome};
pub use handler::InvocationHandler;
