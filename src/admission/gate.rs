//! Request-facing admission gate

use std::future::Future;
use std::sync::Arc;

use http_body_util::Full;
use bytes::Bytes;
use hyper::{Request, Response};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::http::{self, ApiErrorCode};
use crate::store::ConfigStore;

/// Outcome of gating one request
///
/// Exactly one outcome occurs per request; a lost race terminates the
/// request without re-queuing it.
pub enum Admission {
    /// A token was acquired and the handler ran to completion
    Admitted(Response<Full<Bytes>>),
    /// The deadline expired before a token became available
    TimedOut(Response<Full<Bytes>>),
    /// The caller went away before a token became available
    Cancelled,
}

impl Admission {
    /// The response to write, if any
    ///
    /// `Cancelled` yields `None`: the caller is no longer listening.
    #[must_use]
    pub fn into_response(self) -> Option<Response<Full<Bytes>>> {
        match self {
            Admission::Admitted(response) | Admission::TimedOut(response) => Some(response),
            Admission::Cancelled => None,
        }
    }

    /// Check if the request was admitted
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }

    /// Check if the request timed out waiting for admission
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Admission::TimedOut(_))
    }

    /// Check if the request was cancelled while waiting
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Admission::Cancelled)
    }
}

/// Middleware that runs handlers only while holding a capacity token
///
/// Reads the current pool and deadline from the [`ConfigStore`] on every
/// request, so reconfiguration takes effect without restarting the gate.
#[derive(Clone)]
pub struct AdmissionGate {
    store: Arc<ConfigStore>,
}

impl AdmissionGate {
    /// Create a gate over the given store
    #[must_use]
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Gate one request through the capacity pool
    ///
    /// With no pool configured the handler runs directly. Otherwise the
    /// first of three outcomes wins: a token is acquired and the handler
    /// runs with the token held for its full duration; the deadline expires
    /// and an "operation maxed out" response is produced; or `cancel` fires
    /// and nothing is produced. Once admitted, the handler is not aborted
    /// by cancellation.
    pub async fn admit<B, F, Fut>(
        &self,
        req: Request<B>,
        cancel: &CancellationToken,
        handler: F,
    ) -> Admission
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Response<Full<Bytes>>>,
    {
        let (pool, deadline) = self.store.requests_pool();

        let Some(pool) = pool else {
            return Admission::Admitted(handler(req).await);
        };

        let is_browser = http::guess_is_browser(&req);

        tokio::select! {
            guard = pool.acquire_timeout(deadline) => match guard {
                Some(guard) => {
                    let response = handler(req).await;
                    drop(guard);
                    Admission::Admitted(response)
                }
                None => {
                    debug!(
                        deadline_ms = deadline.as_millis() as u64,
                        in_flight = pool.in_flight(),
                        "Admission deadline expired"
                    );
                    Admission::TimedOut(http::error_response(
                        ApiErrorCode::OperationMaxedOut,
                        is_browser,
                    ))
                }
            },
            () = cancel.cancelled() => Admission::Cancelled,
        }
    }
}
