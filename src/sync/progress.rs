//! Sync run state machine and progress signal
//!
//! Single-writer, multi-reader observable value over a `tokio::sync::watch`
//! channel. Intermediate updates are lossy by design; only the final value
//! after completion is contractually delivered.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Why a sync run failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncFailure {
    /// No stored credentials; the run never contacted the network
    #[error("not authenticated")]
    NotAuthenticated,
    /// An error escaped the run as a whole
    #[error("sync failed: {0}")]
    Internal(String),
}

/// State of a sync run
///
/// `Idle → Running → Success | Failed`. The terminal states imply a
/// completed progress fraction of 1.0, so observers never see a run stuck
/// below completion.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    Idle,
    Running { fraction: f32 },
    Success,
    Failed(SyncFailure),
}

impl SyncStatus {
    /// Progress fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f32 {
        match self {
            SyncStatus::Idle => 0.0,
            SyncStatus::Running { fraction } => *fraction,
            SyncStatus::Success | SyncStatus::Failed(_) => 1.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Success | SyncStatus::Failed(_))
    }
}

/// Shared progress handle for one engine
#[derive(Clone)]
pub struct SyncProgress {
    tx: Arc<watch::Sender<SyncStatus>>,
}

impl SyncProgress {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncStatus::Idle);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SyncStatus {
        self.tx.borrow().clone()
    }

    /// Enter `Running` at fraction 0.0
    pub(crate) fn begin(&self) {
        self.tx.send_replace(SyncStatus::Running { fraction: 0.0 });
    }

    /// Advance the running fraction; regressions are ignored
    pub(crate) fn advance(&self, fraction: f32) {
        self.tx.send_modify(|status| {
            let current = match status {
                SyncStatus::Running { fraction } => *fraction,
                _ => 0.0,
            };
            *status = SyncStatus::Running {
                fraction: fraction.max(current).min(1.0),
            };
        });
    }

    /// Drive the fraction to 1.0 and publish the terminal state
    pub(crate) fn finish(&self, outcome: SyncStatus) {
        debug_assert!(outcome.is_terminal());
        self.tx.send_replace(SyncStatus::Running { fraction: 1.0 });
        self.tx.send_replace(outcome);
    }
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_monotonic_within_a_run() {
        let progress = SyncProgress::new();
        progress.begin();
        progress.advance(0.4);
        progress.advance(0.2);
        assert_eq!(progress.current().fraction(), 0.4);
        progress.advance(0.9);
        assert_eq!(progress.current().fraction(), 0.9);
    }

    #[test]
    fn terminal_states_report_complete() {
        let progress = SyncProgress::new();
        progress.begin();
        progress.advance(0.3);
        progress.finish(SyncStatus::Failed(SyncFailure::NotAuthenticated));

        let status = progress.current();
        assert!(status.is_terminal());
        assert_eq!(status.fraction(), 1.0);
    }

    #[tokio::test]
    async fn subscribers_receive_the_final_value() {
        let progress = SyncProgress::new();
        let mut rx = progress.subscribe();
        assert_eq!(*rx.borrow(), SyncStatus::Idle);

        progress.begin();
        progress.advance(0.5);
        progress.finish(SyncStatus::Success);

        // Intermediate updates may be coalesced; the terminal value is not.
        while rx.changed().await.is_ok() {
            if rx.borrow().is_terminal() {
                break;
            }
        }
        assert_eq!(*rx.borrow(), SyncStatus::Success);
    }
}
