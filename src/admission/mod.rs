//! Admission control layer
//!
//! Bounded token pool plus the request-facing gate that races admission
//! against the configured deadline and caller cancellation.

mod gate;
mod pool;

pub use gate::{Admission, AdmissionGate};
pub use pool::{TokenGuard, TokenPool};
