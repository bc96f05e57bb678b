//! Testing utilities for grpcpool.
//!
//! - [`MockDialer`] / [`MockConnection`]: in-memory transport with teardown
//!   counters and injectable dial failures
//! - [`run_churn`]: concurrent acquire/hold/release load against a pool
//! - [`init_tracing`]: `RUST_LOG`-driven subscriber for test binaries

#![warn(clippy::all)]

pub mod churn;
pub mod mock;
mod tracing_init;

pub use churn::{run_churn, ChurnConfig, ChurnStats};
pub use mock::{MockConnection, MockDialer};
pub use tracing_init::{init_tracing, init_tracing_with_level};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::churn::{run_churn, ChurnConfig, ChurnStats};
    pub use crate::mock::{MockConnection, MockDialer};
    pub use crate::tracing_init::init_tracing;
}
