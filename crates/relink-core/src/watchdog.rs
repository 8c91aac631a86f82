use crate::error::ServiceError;
use crate::service::{DocumentService, NORMAL_STATUS};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// How the watchdog stopped.
#[derive(Debug)]
pub enum WatchVerdict {
    /// A discussion on the watched document reached "normal": the run is over.
    Satisfied,
    /// A poll failed. Polls are never retried, so this also ends the run.
    Failed(ServiceError),
    /// The token was cancelled by someone else, usually because the job finished.
    Stopped,
}

/// Polls the discussion status of one document and cancels the run when the
/// discussion is back to normal or when it can no longer tell.
pub struct Watchdog<S: ?Sized> {
    service: Arc<S>,
    document: String,
    interval: Duration,
}

impl<S> Watchdog<S>
where
    S: DocumentService + ?Sized + 'static,
{
    pub fn new(service: Arc<S>, document: &str, interval: Duration) -> Self {
        Self {
            service,
            document: document.to_string(),
            interval,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<WatchVerdict> {
        tokio::spawn(self.run(cancel))
    }

    /// Poll immediately, then every `interval`, until a terminal state is
    /// reached or `cancel` fires. Both terminal states cancel `cancel`.
    pub async fn run(self, cancel: CancellationToken) -> WatchVerdict {
        tracing::info!(
            "Watching discussions on '{}' every {:?}",
            self.document,
            self.interval
        );
        loop {
            let poll = tokio::select! {
                biased;
                _ = cancel.cancelled() => return WatchVerdict::Stopped,
                poll = self.service.discussions(&self.document) => poll,
            };

            match poll {
                Ok(threads) => {
                    if let Some(thread) = threads.iter().find(|t| t.status == NORMAL_STATUS) {
                        tracing::info!(
                            "Discussion '{}' on '{}' is normal. Stopping bot.",
                            thread.slug,
                            self.document
                        );
                        cancel.cancel();
                        return WatchVerdict::Satisfied;
                    }
                    tracing::debug!(
                        "{} discussion(s) on '{}', none normal",
                        threads.len(),
                        self.document
                    );
                }
                Err(e) => {
                    tracing::error!("Error checking discussion on '{}': {}", self.document, e);
                    cancel.cancel();
                    return WatchVerdict::Failed(e);
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return WatchVerdict::Stopped,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
