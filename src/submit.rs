//! Allows one submission at a time.
//!
//! A submission moves the guard `Idle -> Submitting -> Succeeded | Failed -> Idle`. Starting a
//! submission while the guard is not `Idle` fails without running it.

use crate::error::{ErrorType, IntoResult};
use crate::Result;
use anyhow::anyhow;
use serde::Serialize;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

serde_plain::derive_display_from_serialize!(SubmitState);

#[derive(Debug, Default)]
struct Inner {
    state: SubmitState,
    /// The outcome of the most recent submission, `Succeeded` or `Failed`.
    last: Option<SubmitState>,
}

#[derive(Debug, Default)]
pub struct SingleFlight {
    inner: Mutex<Inner>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmitState {
        self.lock().state
    }

    /// How the most recent submission ended, if there has been one.
    pub fn last_outcome(&self) -> Option<SubmitState> {
        self.lock().last
    }

    /// Runs `submission` unless another one is in flight.
    ///
    /// # Errors
    /// - An `ErrorType::Busy` error when a submission is already in flight. `submission` is dropped
    ///   without being polled.
    /// - Whatever `submission` returns.
    pub async fn run<T, F>(&self, submission: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let flight = self.begin()?;
        let result = submission.await;
        flight.finish(result.is_ok());
        result
    }

    fn begin(&self) -> Result<Flight<'_>> {
        let mut inner = self.lock();
        if inner.state != SubmitState::Idle {
            return Err(anyhow!(
                "A submission is already in progress ({})",
                inner.state
            ))
            .pub_result(ErrorType::Busy);
        }
        inner.state = SubmitState::Submitting;
        Ok(Flight {
            guard: self,
            finished: false,
        })
    }

    /// Records the outcome and returns to `Idle`.
    fn record(&self, outcome: SubmitState) {
        let mut inner = self.lock();
        inner.state = outcome;
        debug!("Submission {outcome}");
        inner.last = Some(outcome);
        inner.state = SubmitState::Idle;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The state is two enums and is never left half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A submission in flight. Dropping it before `finish` records a failure so the guard cannot stay
/// stuck in `Submitting`.
struct Flight<'a> {
    guard: &'a SingleFlight,
    finished: bool,
}

impl Flight<'_> {
    fn finish(mut self, ok: bool) {
        self.finished = true;
        self.guard.record(if ok {
            SubmitState::Succeeded
        } else {
            SubmitState::Failed
        });
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("A submission was abandoned before it completed");
            self.guard.record(SubmitState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    #[tokio::test]
    async fn test_success_returns_to_idle() {
        let flight = SingleFlight::new();
        let value = flight.run(async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);
        assert_eq!(flight.state(), SubmitState::Idle);
        assert_eq!(flight.last_outcome(), Some(SubmitState::Succeeded));
    }

    #[tokio::test]
    async fn test_failure_returns_to_idle() {
        let flight = SingleFlight::new();
        let result: Result<()> = flight.run(async { bail!("nope") }).await;
        assert!(result.is_err());
        assert_eq!(flight.state(), SubmitState::Idle);
        assert_eq!(flight.last_outcome(), Some(SubmitState::Failed));
    }

    #[tokio::test]
    async fn test_second_submission_is_rejected() {
        let flight = SingleFlight::new();
        let gate = Arc::new(Semaphore::new(0));
        let ran_second = Arc::new(Mutex::new(false));

        let first = {
            let gate = gate.clone();
            flight.run(async move {
                let _permit = gate.acquire().await?;
                Ok("first")
            })
        };
        let second = async {
            let ran = ran_second.clone();
            let result = flight
                .run(async move {
                    *ran.lock().unwrap() = true;
                    Ok("second")
                })
                .await;
            gate.add_permits(1);
            result
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap(), "first");
        let e = second.unwrap_err();
        assert_eq!(e.to_string(), "busy");
        assert!(!*ran_second.lock().unwrap());
        assert_eq!(flight.state(), SubmitState::Idle);
        assert_eq!(flight.last_outcome(), Some(SubmitState::Succeeded));
    }

    #[tokio::test]
    async fn test_abandoned_submission_releases_guard() {
        let flight = SingleFlight::new();
        {
            let pending = flight.run(std::future::pending::<Result<()>>());
            tokio::pin!(pending);
            let poll = futures_poll_once(pending.as_mut()).await;
            assert!(poll.is_none());
            assert_eq!(flight.state(), SubmitState::Submitting);
        }
        assert_eq!(flight.state(), SubmitState::Idle);
        assert_eq!(flight.last_outcome(), Some(SubmitState::Failed));
    }

    /// Polls `fut` once, returning its output if it was ready.
    async fn futures_poll_once<F: Future + Unpin>(mut fut: F) -> Option<F::Output> {
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(match std::pin::Pin::new(&mut fut).poll(cx) {
                std::task::Poll::Ready(v) => Some(v),
                std::task::Poll::Pending => None,
            })
        })
        .await
    }
}
