//! One-shot completion signal for background work a turn depends on, such as document
//! text extraction.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use bchat::readiness;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (signal, handle) = readiness("report.pdf");
//! signal.mark_ready();
//! handle.wait(Duration::from_secs(1)).await.expect("document is ready");
//! # }
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use bcommon::armable;
use futures_timer::Delay;
use futures_util::future::{Either, select};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    Failed { label: String, reason: String },
    TimedOut { label: String, after: Duration },
    /// The signal was dropped without being marked.
    Abandoned { label: String },
}

impl Display for ReadinessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { label, reason } => write!(f, "'{label}' failed: {reason}"),
            Self::TimedOut { label, after } => {
                write!(f, "'{label}' not ready after {} ms", after.as_millis())
            }
            Self::Abandoned { label } => write!(f, "'{label}' was abandoned before completing"),
        }
    }
}

impl Error for ReadinessError {}

/// Producer half. Consumed when marked so a signal completes at most once.
#[derive(Debug)]
pub struct ReadinessSignal {
    sender: watch::Sender<Readiness>,
}

impl ReadinessSignal {
    pub fn mark_ready(self) {
        self.sender.send_replace(Readiness::Ready);
    }

    pub fn mark_failed(self, reason: impl Into<String>) {
        self.sender.send_replace(Readiness::Failed(reason.into()));
    }
}

/// Consumer half, awaited once before the first round is built.
#[derive(Debug, Clone)]
pub struct ReadinessHandle {
    label: String,
    receiver: watch::Receiver<Readiness>,
}

pub fn readiness(label: impl Into<String>) -> (ReadinessSignal, ReadinessHandle) {
    let (sender, receiver) = watch::channel(Readiness::Pending);
    (
        ReadinessSignal { sender },
        ReadinessHandle {
            label: label.into(),
            receiver,
        },
    )
}

impl ReadinessHandle {
    /// A handle that is already complete.
    pub fn ready(label: impl Into<String>) -> Self {
        let (signal, handle) = readiness(label);
        signal.mark_ready();
        handle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn current(&self) -> Readiness {
        self.receiver.borrow().clone()
    }

    /// Waits up to `timeout`; a timeout too large to schedule waits without a bound.
    pub async fn wait(self, timeout: Duration) -> Result<(), ReadinessError> {
        let Some(timeout) = armable(timeout) else {
            return self.wait_unbounded().await;
        };

        let label = self.label.clone();
        let waiting = Box::pin(self.wait_unbounded());

        match select(waiting, Delay::new(timeout)).await {
            Either::Left((outcome, _)) => outcome,
            Either::Right(_) => Err(ReadinessError::TimedOut {
                label,
                after: timeout,
            }),
        }
    }

    async fn wait_unbounded(mut self) -> Result<(), ReadinessError> {
        loop {
            let state = self.receiver.borrow_and_update().clone();
            match state {
                Readiness::Ready => return Ok(()),
                Readiness::Failed(reason) => {
                    return Err(ReadinessError::Failed {
                        label: self.label,
                        reason,
                    });
                }
                Readiness::Pending => {}
            }

            if self.receiver.changed().await.is_err() {
                let last = self.receiver.borrow().clone();
                return match last {
                    Readiness::Ready => Ok(()),
                    Readiness::Failed(reason) => Err(ReadinessError::Failed {
                        label: self.label,
                        reason,
                    }),
                    Readiness::Pending => Err(ReadinessError::Abandoned { label: self.label }),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn waiter_wakes_when_signal_completes_later() {
        let (signal, handle) = readiness("notes.txt");
        let waiter = tokio::spawn(handle.wait(Duration::from_secs(5)));

        Delay::new(Duration::from_millis(10)).await;
        signal.mark_ready();

        waiter
            .await
            .expect("task joins")
            .expect("document becomes ready");
    }

    #[tokio::test]
    async fn failures_and_abandonment_are_distinguished() {
        let (signal, handle) = readiness("a.pdf");
        signal.mark_failed("unsupported encoding");
        assert_eq!(
            handle.wait(Duration::from_secs(1)).await,
            Err(ReadinessError::Failed {
                label: "a.pdf".to_string(),
                reason: "unsupported encoding".to_string()
            })
        );

        let (signal, handle) = readiness("b.pdf");
        drop(signal);
        assert_eq!(
            handle.wait(Duration::from_secs(1)).await,
            Err(ReadinessError::Abandoned {
                label: "b.pdf".to_string()
            })
        );
    }

    #[tokio::test]
    async fn pending_signal_times_out() {
        let (_signal, handle) = readiness("slow.docx");
        let error = handle
            .wait(Duration::from_millis(10))
            .await
            .expect_err("should time out");
        assert!(matches!(error, ReadinessError::TimedOut { .. }));
        assert!(ReadinessHandle::ready("done").current() == Readiness::Ready);
    }

    #[tokio::test]
    async fn unbounded_wait_still_completes() {
        let handle = ReadinessHandle::ready("index.md");
        assert_eq!(handle.wait(Duration::from_secs(u64::MAX)).await, Ok(()));
    }
}
