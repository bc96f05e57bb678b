//! Transport capabilities consumed by the pool.
//!
//! The pool never dials or frames anything itself. It asks a [`Dialer`] for
//! connections and relies on each [`Connection`] to report its state and to
//! tear itself down.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::Result;

// ============================================================================
// Connectivity State
// ============================================================================

/// Connectivity state reported by a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConnectivityState {
    /// Not connected, will connect on first use.
    Idle = 0,
    /// Connection attempt in progress.
    Connecting = 1,
    /// Connected and usable.
    Ready = 2,
    /// Last attempt failed, will retry.
    TransientFailure = 3,
    /// Torn down.
    Shutdown = 4,
}

impl ConnectivityState {
    /// Decode a state stored in an atomic. Unknown values map to `Shutdown`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Connecting,
            2 => Self::Ready,
            3 => Self::TransientFailure,
            _ => Self::Shutdown,
        }
    }

    /// Get state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Connecting => "CONNECTING",
            Self::Ready => "READY",
            Self::TransientFailure => "TRANSIENT_FAILURE",
            Self::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Connection / Dialer
// ============================================================================

/// A physical transport connection.
pub trait Connection: Send + Sync + 'static {
    /// Current connectivity state.
    fn state(&self) -> ConnectivityState;

    /// Release the underlying resources.
    ///
    /// The pool calls this at most once per connection.
    fn close(&self);
}

/// Connection factory.
///
/// Called concurrently from any task that grows the pool or needs a
/// transient connection. Timeouts are the dialer's business.
#[async_trait]
pub trait Dialer<C: Connection>: Send + Sync {
    /// Open a new connection to `address`.
    async fn dial(&self, address: &str) -> Result<C>;
}

/// Dialer backed by an async closure. See [`dial_fn`].
#[derive(Clone)]
pub struct FnDialer<F> {
    f: F,
}

impl<F> fmt::Debug for FnDialer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDialer").finish_non_exhaustive()
    }
}

#[async_trait]
impl<C, F, Fut> Dialer<C> for FnDialer<F>
where
    C: Connection,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<C>> + Send + 'static,
{
    async fn dial(&self, address: &str) -> Result<C> {
        (self.f)(address.to_string()).await
    }
}

/// Wrap an async closure as a [`Dialer`].
///
/// ```rust,ignore
/// let dialer = dial_fn(|address| async move { MyConn::open(&address).await });
/// ```
pub fn dial_fn<F>(f: F) -> FnDialer<F> {
    FnDialer { f }
}
