//! # grpcpool core
//!
//! A client-side connection pool that shares a bounded, dynamically sized set
//! of transport connections to one remote endpoint between many concurrent
//! callers, each connection carrying up to `max_concurrent_streams` logical
//! references.
//!
//! ## Features
//!
//! - **Lock-free fast path**: acquisition under nominal capacity touches only
//!   atomics and one slot read lock
//! - **Doubling growth**: the pool grows towards `max_active` under a single
//!   structural lock with double-checked re-validation
//! - **Shrink on idle**: the pool drops back to `max_idle` once the last
//!   reference is released
//! - **Overcommit or one-time connections** at the ceiling, per `reuse`
//! - **Transport agnostic**: anything implementing [`Connection`] can be pooled
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use grpcpool_core::{Pool, PoolConfig};
//!
//! let config = PoolConfig::new()
//!     .dialer(MyDialer::default())
//!     .max_idle(8)
//!     .max_active(64)
//!     .max_concurrent_streams(64);
//!
//! let pool = Pool::new("127.0.0.1:50051", config).await?;
//!
//! let conn = pool.get().await?;
//! do_rpc(conn.value()).await?;
//! conn.release();
//!
//! pool.close().await;
//! ```

#![warn(clippy::all)]

mod config;
mod conn;
mod error;
mod pool;
mod slot;
mod status;
mod transport;

pub use config::{
    PoolConfig, DEFAULT_MAX_ACTIVE, DEFAULT_MAX_CONCURRENT_STREAMS, DEFAULT_MAX_IDLE,
    MAX_ACTIVE_LIMIT,
};
pub use conn::PooledConn;
pub use error::{PoolError, Result};
pub use pool::Pool;
pub use status::{PoolStatus, StateCounts};
pub use transport::{dial_fn, Connection, ConnectivityState, Dialer, FnDialer};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::config::PoolConfig;
    pub use crate::conn::PooledConn;
    pub use crate::error::{PoolError, Result};
    pub use crate::pool::Pool;
    pub use crate::transport::{Connection, ConnectivityState, Dialer};
}
