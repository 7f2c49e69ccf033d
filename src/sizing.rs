//! Pool sizing from system memory and per-request cost

use std::io;

use tracing::warn;

/// Write buffer size per drive for a single request
pub const WRITE_BLOCK_SIZE: u64 = 4 * 1024 * 1024; // 4 MiB

/// Read buffer size per drive for a single request
pub const READ_BLOCK_SIZE: u64 = 4 * 1024 * 1024; // 4 MiB

/// Default erasure-coding block size of the storage engine
pub const ERASURE_BLOCK_SIZE: u64 = 10 * 1024 * 1024; // 10 MiB

/// Total memory assumed when the host probe fails
pub const FALLBACK_TOTAL_MEMORY: u64 = 16 * 1024 * 1024 * 1024; // 16 GiB

/// Source of the host's total addressable memory
///
/// The actual probe lives outside this crate; callers hand in whatever
/// implementation fits their platform.
pub trait MemoryProbe: Send + Sync {
    /// Total addressable memory in bytes
    ///
    /// # Errors
    ///
    /// Returns error if the host statistics are unavailable
    fn total_memory(&self) -> io::Result<u64>;
}

/// Probe reporting a fixed memory size, for tests and overrides
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn total_memory(&self) -> io::Result<u64> {
        Ok(self.0)
    }
}

/// Estimated memory held by one in-flight request
#[must_use]
pub fn per_request_cost(set_drive_count: usize) -> u64 {
    set_drive_count as u64 * (WRITE_BLOCK_SIZE + READ_BLOCK_SIZE) + 2 * ERASURE_BLOCK_SIZE
}

/// Compute the admission capacity for this node
///
/// An explicit positive `requests_max` wins and is divided evenly across the
/// cluster's nodes. Otherwise capacity is derived from total system memory
/// and the per-request buffer cost; a failed probe falls back to 16 GiB and
/// is logged, never fatal. A result of 0 is legal and means every request
/// waits out its deadline.
#[must_use]
pub fn pool_capacity(
    requests_max: usize,
    node_count: usize,
    set_drive_count: usize,
    probe: &dyn MemoryProbe,
) -> usize {
    if requests_max > 0 {
        let mut capacity = requests_max;
        if node_count > 1 {
            capacity /= node_count;
        }
        return capacity;
    }

    let total_memory = match probe.total_memory() {
        Ok(total) => total,
        Err(e) => {
            warn!("Memory probe failed, assuming 16 GiB: {}", e);
            FALLBACK_TOTAL_MEMORY
        }
    };

    (total_memory / per_request_cost(set_drive_count)) as usize
}
