//! Completion callbacks
//!
//! A completion is consumed when it reports, so an invocation can report
//! success or failure at most once. The handler always reports before
//! returning, which makes it exactly once.

use filmsplit_core::PipelineError;
use tokio::sync::oneshot;

/// Receives the single outcome of an invocation.
pub trait Completion: Send {
    fn succeed(self: Box<Self>);

    fn fail(self: Box<Self>, error: PipelineError);
}

/// Reports to the log, the way a manual invocation does.
#[derive(Debug, Default)]
pub struct LoggingCompletion;

impl Completion for LoggingCompletion {
    fn succeed(self: Box<Self>) {
        tracing::info!("success!");
    }

    fn fail(self: Box<Self>, error: PipelineError) {
        tracing::error!(code = error.error_code(), error = %error, "Invocation failed");
    }
}

/// What a [`ChannelCompletion`] delivers.
pub type Outcome = Result<(), PipelineError>;

/// Forwards the outcome over a oneshot channel.
pub struct ChannelCompletion {
    tx: oneshot::Sender<Outcome>,
}

impl ChannelCompletion {
    pub fn new() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    fn send(self, outcome: Outcome) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!("Completion receiver dropped before the outcome was delivered");
        }
    }
}

impl Completion for ChannelCompletion {
    fn succeed(self: Box<Self>) {
        self.send(Ok(()));
    }

    fn fail(self: Box<Self>, error: PipelineError) {
        self.send(Err(error));
    }
}
