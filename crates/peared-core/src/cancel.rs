//! Cooperative cancellation.
//!
//! A [`Cancellation`] is shared by cloning. Firing it is sticky: once a
//! reason has been recorded every clone observes the same reason and later
//! calls to [`Cancellation::cancel_with`] are ignored.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

/// Why a [`Cancellation`] fired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancelReason {
    /// Cancelled without a more specific cause.
    #[error("operation cancelled")]
    Cancelled,

    /// A deadline set with [`Cancellation::cancel_after`] passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Cancelled with a caller supplied cause.
    #[error("{0}")]
    Other(String),
}

impl CancelReason {
    /// Returns true for the generic reason recorded by [`Cancellation::cancel`].
    #[must_use]
    pub const fn is_generic(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A cloneable cancellation signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    state: Arc<watch::Sender<Option<CancelReason>>>,
}

impl Cancellation {
    /// Create a token that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Fire the token without recording a specific cause.
    pub fn cancel(&self) {
        self.cancel_with(CancelReason::Cancelled);
    }

    /// Fire the token with `reason`. The first reason wins.
    pub fn cancel_with(&self, reason: CancelReason) {
        self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        });
    }

    /// Fire the token with [`CancelReason::DeadlineExceeded`] once `timeout`
    /// elapses, unless it fires for another reason first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn cancel_after(&self, timeout: Duration) {
        let cancel = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    cancel.cancel_with(CancelReason::DeadlineExceeded);
                }
            }
        });
    }

    /// Returns true once the token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// The recorded reason, if the token has fired.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.state.borrow().clone()
    }

    /// Poll the token, returning the recorded reason as an error if it fired.
    ///
    /// # Errors
    ///
    /// Returns the [`CancelReason`] once the token has fired.
    pub fn check(&self) -> Result<(), CancelReason> {
        self.reason().map_or(Ok(()), Err)
    }

    /// Wait until the token fires and return the recorded reason.
    pub async fn cancelled(&self) -> CancelReason {
        let mut rx = self.state.subscribe();
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|state| state.clone())
            .unwrap_or(CancelReason::Cancelled)
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Fire `cancel` when the process receives SIGINT or SIGTERM.
///
/// Must be called from within a tokio runtime.
pub fn cancel_on_shutdown_signal(cancel: &Cancellation) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::debug!("Shutdown signal received");
        cancel.cancel();
    });
}

async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let cancel = Cancellation::new();
        assert!(!cancel.is_cancelled());
        assert_eq!(cancel.reason(), None);
        assert!(cancel.check().is_ok());
    }

    #[test]
    fn first_reason_wins() {
        let cancel = Cancellation::new();
        let clone = cancel.clone();

        clone.cancel_with(CancelReason::Other("shutdown".into()));
        cancel.cancel();

        assert_eq!(
            cancel.reason(),
            Some(CancelReason::Other("shutdown".into()))
        );
        assert_eq!(
            cancel.check(),
            Err(CancelReason::Other("shutdown".into()))
        );
    }

    #[tokio::test]
    async fn cancelled_resolves_after_fire() {
        let cancel = Cancellation::new();
        let waiter = cancel.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let reason = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter did not observe cancellation")
            .unwrap();
        assert_eq!(reason, CancelReason::Cancelled);
        assert!(reason.is_generic());
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_fired() {
        let cancel = Cancellation::new();
        cancel.cancel_with(CancelReason::Other("boom".into()));

        let reason = cancel.cancelled().await;
        assert_eq!(reason, CancelReason::Other("boom".into()));
        assert!(!reason.is_generic());
    }

    #[tokio::test]
    async fn deadline_records_its_own_reason() {
        let cancel = Cancellation::new();
        cancel.cancel_after(Duration::from_millis(10));

        let reason = tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .expect("deadline never fired");
        assert_eq!(reason, CancelReason::DeadlineExceeded);
        assert!(!reason.is_generic());
        assert_eq!(reason.to_string(), "deadline exceeded");
    }

    #[tokio::test]
    async fn earlier_cancel_beats_deadline() {
        let cancel = Cancellation::new();
        cancel.cancel_after(Duration::from_millis(20));
        cancel.cancel();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cancel.reason(), Some(CancelReason::Cancelled));
    }
}
