use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Where a [`Pending`] is in its lifecycle.
#[derive(Debug, Clone)]
pub enum PendingState<T> {
    Pending,
    Resolved(T),
    Rejected(Error),
}

impl<T> PendingState<T> {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Single-assignment completion handle shared between a producer and any
/// number of waiters.
///
/// Clones observe the same outcome. The first [`resolve`](Pending::resolve)
/// or [`reject`](Pending::reject) wins; later calls are ignored.
pub struct Pending<T> {
    state: Arc<watch::Sender<PendingState<T>>>,
}

impl<T> Clone for Pending<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            PendingState::Pending => "pending",
            PendingState::Resolved(_) => "resolved",
            PendingState::Rejected(_) => "rejected",
        };
        f.debug_struct("Pending").field("state", &state).finish()
    }
}

impl<T> Pending<T> {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(PendingState::Pending);
        Self {
            state: Arc::new(state),
        }
    }

    /// Settle with `value`. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(PendingState::Resolved(value))
    }

    /// Settle with `error`. Returns `false` if already settled.
    pub fn reject(&self, error: Error) -> bool {
        self.settle(PendingState::Rejected(error))
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.state.borrow().is_pending()
    }

    /// Wait until settled, without reading the outcome.
    pub async fn settled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| !s.is_pending()).await;
    }

    fn settle(&self, outcome: PendingState<T>) -> bool {
        self.state.send_if_modified(move |state| {
            if state.is_pending() {
                *state = outcome;
                true
            } else {
                false
            }
        })
    }
}

impl<T: Clone> Pending<T> {
    /// A pending that is already rejected.
    #[must_use]
    pub fn rejected(error: Error) -> Self {
        let pending = Self::new();
        pending.reject(error);
        pending
    }

    #[must_use]
    pub fn state(&self) -> PendingState<T> {
        self.state.borrow().clone()
    }

    /// Wait for the outcome.
    ///
    /// Always yields to the scheduler once before looking, so a caller that
    /// registers and settles a request in the same call stack still suspends.
    pub async fn wait(&self) -> Result<T> {
        let mut rx = self.state.subscribe();
        tokio::task::yield_now().await;
        loop {
            let outcome = match &*rx.borrow_and_update() {
                PendingState::Resolved(value) => Some(Ok(value.clone())),
                PendingState::Rejected(error) => Some(Err(error.clone())),
                PendingState::Pending => None,
            };
            if let Some(outcome) = outcome {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return Err(Error::Network("pending request dropped".into()));
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Pending<T> {
    /// A pending that settles like whichever of `requests` settles first.
    ///
    /// Losers keep their own state and may settle later without effect.
    /// Racing nothing rejects immediately. Must be called from a tokio
    /// runtime.
    pub fn race<I>(requests: I) -> Self
    where
        I: IntoIterator<Item = Pending<T>>,
    {
        let winner = Self::new();
        let requests: Vec<_> = requests.into_iter().collect();
        if requests.is_empty() {
            winner.reject(Error::InvalidArgument("race over no requests".into()));
            return winner;
        }

        for request in requests {
            let winner = winner.clone();
            tokio::spawn(async move {
                tokio::select! {
                    outcome = request.wait() => match outcome {
                        Ok(value) => winner.resolve(value),
                        Err(error) => winner.reject(error),
                    },
                    () = winner.settled() => false,
                };
            });
        }
        winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::task::Poll;
    use tokio_test::{assert_pending, task};

    #[test]
    fn test_settles_once() {
        let pending = Pending::new();
        assert!(!pending.is_settled());
        assert!(pending.resolve(1));
        assert!(!pending.resolve(2));
        assert!(!pending.reject(Error::ClosedByUser));
        assert!(matches!(pending.state(), PendingState::Resolved(1)));
    }

    #[test]
    fn test_wait_yields_before_observing() {
        let pending = Pending::new();
        pending.resolve("done");

        let mut wait = task::spawn(pending.wait());
        assert_pending!(wait.poll());
        assert!(wait.is_woken());
        match wait.poll() {
            Poll::Ready(Ok(value)) => assert_eq!(value, "done"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_wait_wakes_on_settle() {
        let pending: Pending<u32> = Pending::new();
        let mut wait = task::spawn(pending.wait());
        assert_pending!(wait.poll());
        assert_pending!(wait.poll());

        pending.reject(Error::Timeout("pong".into()));
        assert!(wait.is_woken());
        match wait.poll() {
            Poll::Ready(Err(Error::Timeout(reason))) => assert_eq!(reason, "pong"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clones_share_outcome() {
        let pending: Pending<u32> = Pending::new();
        let other = pending.clone();
        pending.reject(Error::ClosedByUser);
        assert!(matches!(other.wait().await, Err(Error::ClosedByUser)));
        assert!(matches!(pending.wait().await, Err(Error::ClosedByUser)));
    }

    #[tokio::test]
    async fn test_race_takes_first_settled() {
        let a: Pending<u32> = Pending::new();
        let b = Pending::new();
        let race = Pending::race([a.clone(), b.clone()]);

        b.resolve(2);
        assert_eq!(race.wait().await.unwrap(), 2);

        assert!(a.resolve(1));
        assert_eq!(race.wait().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_race_propagates_rejection() {
        let a: Pending<u32> = Pending::new();
        let race = Pending::race([a.clone(), Pending::new()]);
        a.reject(Error::Exchange("bad symbol".into()));
        assert!(matches!(race.wait().await, Err(Error::Exchange(_))));
    }

    #[tokio::test]
    async fn test_race_over_nothing_rejects() {
        let race: Pending<u32> = Pending::race(Vec::new());
        assert!(race.is_settled());
        assert!(matches!(race.wait().await, Err(Error::InvalidArgument(_))));
    }
}
