//! Bounded token pool for in-flight requests

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity pool of admission tokens
///
/// Cloning yields another handle to the same pool. A pool is never resized
/// in place; reconfiguration installs a fresh pool and abandons this one,
/// with outstanding guards still releasing into it.
#[derive(Clone)]
pub struct TokenPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl TokenPool {
    /// Create a pool with the given capacity
    ///
    /// A capacity of 0 is legal: every acquisition waits until its deadline.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);

        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// The pool's fixed capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens not currently held
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Tokens currently held by running requests
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Take a token without waiting
    ///
    /// Returns `None` if the pool is exhausted.
    pub fn try_acquire(&self) -> Option<TokenGuard> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| TokenGuard { _permit: permit })
    }

    /// Take a token, waiting for one to be released if necessary
    ///
    /// # Panics
    ///
    /// Panics if the semaphore is closed (the pool never closes it)
    pub async fn acquire(&self) -> TokenGuard {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("token pool semaphore never closes");

        TokenGuard { _permit: permit }
    }

    /// Take a token, waiting at most `deadline`
    ///
    /// Returns `None` if no token became available in time.
    pub async fn acquire_timeout(&self, deadline: Duration) -> Option<TokenGuard> {
        tokio::time::timeout(deadline, self.acquire()).await.ok()
    }
}

impl std::fmt::Debug for TokenPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPool")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

/// Guard that returns its token to the pool when dropped
///
/// Release happens on every exit path of the holder, including unwinding.
pub struct TokenGuard {
    _permit: OwnedSemaphorePermit,
}
