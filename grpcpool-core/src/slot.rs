//! Connection slots.
//!
//! Each slot is a short-lived read lock around an `Arc`: the fast path clones
//! the `Arc` out and never blocks on the pool's structural lock. Only the
//! structural lock holder stores into or takes from a slot.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::transport::{Connection, ConnectivityState};

/// One position in the pool's fixed-capacity slot array.
pub(crate) struct Slot<C> {
    inner: RwLock<Option<Arc<C>>>,
}

impl<C: Connection> Slot<C> {
    pub(crate) fn empty() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Clone the current occupant out, if any.
    #[inline]
    pub(crate) fn load(&self) -> Option<Arc<C>> {
        self.inner.read().clone()
    }

    #[cfg(test)]
    pub(crate) fn is_populated(&self) -> bool {
        self.inner.read().is_some()
    }

    pub(crate) fn state(&self) -> Option<ConnectivityState> {
        self.inner.read().as_ref().map(|conn| conn.state())
    }

    /// Install a fresh connection, tearing down any stale occupant first.
    pub(crate) fn store(&self, conn: Arc<C>) {
        let stale = std::mem::replace(&mut *self.inner.write(), Some(conn));
        if let Some(stale) = stale {
            stale.close();
        }
    }

    /// Clear the slot and tear down its occupant. Returns whether it held one.
    pub(crate) fn reset(&self) -> bool {
        let taken = self.inner.write().take();
        match taken {
            Some(conn) => {
                conn.close();
                true
            }
            None => false,
        }
    }

    /// Same as [`reset`](Self::reset) without locking, for teardown on drop.
    pub(crate) fn reset_mut(&mut self) -> bool {
        match self.inner.get_mut().take() {
            Some(conn) => {
                conn.close();
                true
            }
            None => false,
        }
    }
}
