//! Detection of document changes during an in-flight classification request.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::document::DocumentVersion;

/// How a settle wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleResult {
    /// A full interval passed without a change
    Settled,
    /// The document was closed while waiting
    Closed,
    /// The request was cancelled while waiting
    Cancelled,
}

/// Version stamp captured before a request is dispatched.
///
/// Response offsets are only meaningful against the text they were computed
/// from, so a response is usable only while the stamp is unchanged.
#[derive(Debug)]
pub struct StalenessGuard {
    captured: DocumentVersion,
    version_rx: watch::Receiver<DocumentVersion>,
}

impl StalenessGuard {
    /// Sample the current version of the document behind `version_rx`.
    pub fn capture(mut version_rx: watch::Receiver<DocumentVersion>) -> Self {
        let captured = *version_rx.borrow_and_update();
        Self {
            captured,
            version_rx,
        }
    }

    pub fn captured(&self) -> DocumentVersion {
        self.captured
    }

    /// Whether the document changed (or went away) since capture.
    pub fn is_stale(&self) -> bool {
        match self.version_rx.has_changed() {
            // Closed: the snapshot no longer corresponds to an open document
            Err(_) => true,
            Ok(_) => *self.version_rx.borrow() != self.captured,
        }
    }

    /// Wait until the document stops changing.
    ///
    /// Resolves once `interval` elapses with no version change, when the
    /// document is closed, or when `cancel` fires.
    pub async fn wait_for_settle(
        &mut self,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> SettleResult {
        loop {
            self.version_rx.borrow_and_update();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return SettleResult::Cancelled,
                changed = tokio::time::timeout(interval, self.version_rx.changed()) => {
                    match changed {
                        Err(_elapsed) => return SettleResult::Settled,
                        Ok(Err(_closed)) => return SettleResult::Closed,
                        Ok(Ok(())) => {
                            log::trace!(
                                target: "ts_semantic_ls::staleness",
                                "Document changed during settle wait, restarting interval"
                            );
                        }
                    }
                }
            }
        }
    }
}
