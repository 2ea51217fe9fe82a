//! Memoizing step cells.
//!
//! A [`SharedStep`] wraps one unit of side-effecting async work so the work
//! runs at most once per pipeline run no matter how many consumers await
//! it, and every consumer — including ones arriving after completion —
//! observes the same terminal result. This is what lets downstream steps
//! and external observers share a run without double-submitting
//! transactions.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{FactoryError, FactoryResult};

type StepFuture<T> = Pin<Box<dyn Future<Output = FactoryResult<T>> + Send>>;

enum State<T> {
    /// Not yet executed; the slot is emptied by the first awaiter.
    Pending(Option<StepFuture<T>>),
    /// Terminal result, success or failure, replayed to every awaiter.
    Done(FactoryResult<T>),
}

struct Inner<T> {
    name: &'static str,
    state: Mutex<State<T>>,
}

/// An at-most-once async step shared between consumers.
pub struct SharedStep<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SharedStep<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Clone + Send + 'static> SharedStep<T> {
    /// Wraps `future` as the step named `name`. Nothing runs until the
    /// first `get`.
    pub fn new<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = FactoryResult<T>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name,
                state: Mutex::new(State::Pending(Some(Box::pin(future)))),
            }),
        }
    }

    /// Starts the step eagerly on the runtime without waiting for it.
    pub fn spawn(&self) {
        let step = self.clone();
        tokio::spawn(async move {
            let _ = step.get().await;
        });
    }

    /// Awaits the step's terminal result, executing the work if this is the
    /// first observation. Failures are wrapped as [`FactoryError::Step`]
    /// with this step's name and memoized like successes.
    pub async fn get(&self) -> FactoryResult<T> {
        let mut state = self.inner.state.lock().await;
        match &mut *state {
            State::Done(result) => result.clone(),
            State::Pending(slot) => {
                let future = slot.take().expect("pending step always holds its future");
                // The lock is held across the await: that is the
                // at-most-once guarantee. Later awaiters queue here and
                // wake into the Done arm.
                let result =
                    future.await.map_err(|e| FactoryError::step(self.inner.name, e));
                *state = State::Done(result.clone());
                result
            }
        }
    }

    /// The step's name.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }
}
