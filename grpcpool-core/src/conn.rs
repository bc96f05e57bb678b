//! Pooled connection handles.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::pool::PoolInner;
use crate::transport::{Connection, ConnectivityState};

/// A logical checkout of a pooled connection.
///
/// Several handles may share one physical connection. Releasing the handle,
/// explicitly or by dropping it, gives the logical reference back to the
/// pool; only transient handles tear their connection down.
pub struct PooledConn<C: Connection> {
    conn: Arc<C>,
    pool: Arc<PoolInner<C>>,
    transient: bool,
}

impl<C: Connection> PooledConn<C> {
    pub(crate) fn new(conn: Arc<C>, pool: Arc<PoolInner<C>>, transient: bool) -> Self {
        Self {
            conn,
            pool,
            transient,
        }
    }

    /// Get the underlying connection.
    pub fn value(&self) -> &C {
        &self.conn
    }

    /// Get a shared reference to the underlying connection.
    ///
    /// Holding the `Arc` past release does not keep the connection in the
    /// pool; it may be closed by a shrink or by [`Pool::close`](crate::Pool::close).
    pub fn shared(&self) -> Arc<C> {
        Arc::clone(&self.conn)
    }

    /// Connectivity state of the underlying connection.
    pub fn state(&self) -> ConnectivityState {
        self.conn.state()
    }

    /// Whether this handle owns a one-time connection outside the pool.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Give the handle back to the pool. Equivalent to dropping it.
    pub fn release(self) {}
}

impl<C: Connection> Deref for PooledConn<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<C: Connection> Drop for PooledConn<C> {
    fn drop(&mut self) {
        self.pool.release_ref();
        if self.transient {
            self.conn.close();
        }
    }
}

impl<C: Connection> fmt::Debug for PooledConn<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConn")
            .field("address", &self.pool.address)
            .field("transient", &self.transient)
            .field("state", &self.conn.state())
            .finish()
    }
}
