//! Process-wide store of API tunables
//!
//! Readers take an immutable snapshot; `init` builds a fresh snapshot and
//! swaps the pointer, so reconfiguration never blocks in-flight requests.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::info;

use crate::admission::TokenPool;
use crate::config::ApiConfig;
use crate::sizing::{self, MemoryProbe};

/// Cluster-call deadline used when none is configured
pub const DEFAULT_CLUSTER_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Default)]
struct Snapshot {
    requests_deadline: Duration,
    requests_pool: Option<TokenPool>,
    cluster_deadline: Duration,
    list_quorum: usize,
    extend_list_life: Duration,
    cors_allow_origins: Vec<String>,
    set_drive_count: usize,
}

/// Holder of the current API tunables
///
/// One instance per process, constructed at startup and handed to the
/// request-handling layer by `Arc`. `init` may be called again on dynamic
/// configuration changes, concurrently with any number of readers.
pub struct ConfigStore {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl ConfigStore {
    /// Create an empty store: unlimited admission, zero tunables
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Install a new configuration
    ///
    /// The capacity pool is replaced only when the desired capacity exceeds
    /// the current one. Existing requests keep their tokens in the old pool;
    /// new requests use the new pool. The brief overlap window is accepted.
    /// All other fields are updated unconditionally. Never fails: a memory
    /// probe failure is absorbed inside the sizing step.
    pub fn init(
        &self,
        cfg: &ApiConfig,
        set_drive_count: usize,
        node_count: usize,
        probe: &dyn MemoryProbe,
    ) {
        let desired = sizing::pool_capacity(cfg.requests_max, node_count, set_drive_count, probe);

        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let current_capacity = guard.requests_pool.as_ref().map_or(0, TokenPool::capacity);
        let requests_pool = if desired > current_capacity {
            info!(
                capacity = desired,
                previous = current_capacity,
                "Installing request admission pool"
            );
            Some(TokenPool::new(desired))
        } else {
            guard.requests_pool.clone()
        };

        *guard = Arc::new(Snapshot {
            requests_deadline: cfg.requests_deadline(),
            requests_pool,
            cluster_deadline: cfg.cluster_deadline(),
            list_quorum: cfg.list_quorum,
            extend_list_life: cfg.extend_list_life(),
            cors_allow_origins: cfg.cors_allow_origin.clone(),
            set_drive_count,
        });
    }

    fn load(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Minimum storage nodes required for list operations
    #[must_use]
    pub fn list_quorum(&self) -> usize {
        self.load().list_quorum
    }

    /// Drives per erasure set on this node
    #[must_use]
    pub fn set_drive_count(&self) -> usize {
        self.load().set_drive_count
    }

    /// Extra lifetime granted to in-progress list results
    #[must_use]
    pub fn extend_list_life(&self) -> Duration {
        self.load().extend_list_life
    }

    /// Origins allowed by the CORS layer
    ///
    /// Returns a fresh copy; mutating it does not affect later reads.
    #[must_use]
    pub fn cors_allow_origins(&self) -> Vec<String> {
        self.load().cors_allow_origins.clone()
    }

    /// Deadline for cluster-internal calls
    ///
    /// A zero configured value means "use the 10 second default", not "no
    /// timeout".
    #[must_use]
    pub fn cluster_deadline(&self) -> Duration {
        let deadline = self.load().cluster_deadline;
        if deadline.is_zero() {
            DEFAULT_CLUSTER_DEADLINE
        } else {
            deadline
        }
    }

    /// Current capacity pool and its paired acquisition deadline
    ///
    /// Both come from one snapshot, so a pool is never observed with a
    /// deadline from a different configuration generation. `None` means
    /// unlimited admission.
    #[must_use]
    pub fn requests_pool(&self) -> (Option<TokenPool>, Duration) {
        let snapshot = self.load();
        (
            snapshot.requests_pool.clone(),
            snapshot.requests_deadline,
        )
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
