//! Valve - Memory-sized admission control for storage API front ends
//!
//! Bounds the number of concurrently-executing requests, sizing the bound
//! from available system memory and per-request cost, and rejecting excess
//! requests after a bounded wait instead of queuing them unboundedly.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod admission;
pub mod config;
pub mod error;
pub mod http;
pub mod sizing;
pub mod store;

pub use admission::{Admission, AdmissionGate, TokenGuard, TokenPool};
pub use error::{Result, ValveError};
pub use store::ConfigStore;
