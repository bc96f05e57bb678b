//! Stream-aware connection pool.
//!
//! The pool keeps between `max_idle` and `max_active` physical connections to
//! one address and hands out logical references to them. Each connection is
//! nominally shared by up to `max_concurrent_streams` references.
//!
//! Acquisition takes one of four routes:
//!
//! 1. **Fast path**: the outstanding references fit in the current
//!    connections, so a slot is picked round-robin without any lock.
//! 2. **Overcommit**: the pool is at `max_active` and `reuse` is set, so an
//!    existing connection takes more references than its nominal limit.
//! 3. **Transient**: the pool is at `max_active` and `reuse` is off, so a
//!    one-time connection is dialed and closed again on release.
//! 4. **Growth**: the pool doubles (capped at `max_active`) under the
//!    structural lock, then picks a slot.
//!
//! When the last reference is released the pool shrinks back to `max_idle`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::conn::PooledConn;
use crate::slot::Slot;
use crate::status::{PoolStatus, StateCounts};
use crate::transport::{Connection, Dialer};
use crate::{PoolConfig, PoolError, Result};

// ============================================================================
// Pool
// ============================================================================

/// Connection pool for a single remote address.
///
/// Cloning is cheap; clones share the same pool.
pub struct Pool<C: Connection> {
    inner: Arc<PoolInner<C>>,
}

impl<C: Connection> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connection> Pool<C> {
    /// Create a pool and dial `max_idle` connections.
    ///
    /// Construction is all-or-nothing: if any dial fails, the connections
    /// already dialed are closed and the dial error is returned.
    pub async fn new(address: impl Into<String>, config: PoolConfig<C>) -> Result<Self> {
        let address = address.into();
        config.validate(&address)?;

        let dialer = config
            .dialer
            .clone()
            .ok_or_else(|| PoolError::Config("invalid dial settings".into()))?;

        let slots = (0..config.max_active)
            .map(|_| Slot::empty())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let inner = PoolInner {
            index: AtomicU32::new(0),
            current: AtomicUsize::new(config.max_idle),
            refs: AtomicI32::new(0),
            closed: AtomicBool::new(false),
            structural: Mutex::new(()),
            slots,
            dialer,
            address,
            config,
        };

        for i in 0..inner.config.max_idle {
            match inner.dialer.dial(&inner.address).await {
                Ok(conn) => inner.slots[i].store(Arc::new(conn)),
                Err(e) => {
                    warn!(
                        address = %inner.address,
                        dialed = i,
                        error = %e,
                        "Dial is not able to fill the pool"
                    );
                    inner.reset_from(0);
                    return Err(e);
                }
            }
        }

        let pool = Self {
            inner: Arc::new(inner),
        };
        info!(status = %pool.status(), "New pool success");

        Ok(pool)
    }

    /// Acquire a logical connection.
    ///
    /// The returned handle always holds a connection. Release it (or drop
    /// it) exactly when the caller is done with it.
    ///
    /// # Panics
    ///
    /// Panics if the number of outstanding handles reaches `i32::MAX`.
    pub async fn get(&self) -> Result<PooledConn<C>> {
        let inner = &self.inner;
        let reference = RefGuard::acquire(inner);
        let next_ref = reference.next_ref;

        let current = inner.current.load(Ordering::SeqCst);
        if current == 0 {
            reference.forget();
            return Err(PoolError::Closed);
        }

        if inner.within_capacity(next_ref, current) {
            return reference.checkout(current);
        }

        if current == inner.config.max_active {
            if inner.config.reuse {
                return reference.checkout(current);
            }

            let conn = inner.dialer.dial(&inner.address).await?;
            debug!(address = %inner.address, "Dialed transient connection");
            return Ok(reference.into_conn(Arc::new(conn), true));
        }

        self.grow(reference).await
    }

    async fn grow(&self, reference: RefGuard<'_, C>) -> Result<PooledConn<C>> {
        let inner = &self.inner;
        let max_active = inner.config.max_active;

        let lock = inner.structural.lock().await;
        if inner.closed.load(Ordering::Acquire) {
            drop(lock);
            reference.forget();
            return Err(PoolError::Closed);
        }

        let mut current = inner.current.load(Ordering::SeqCst);
        if current < max_active && !inner.within_capacity(reference.next_ref, current) {
            let increment = current.min(max_active - current);
            let mut grown = 0;
            let mut failure = None;

            // `current` is published per slot, so a `get` dropped mid-dial
            // leaves every dialed connection counted.
            for i in current..current + increment {
                match inner.dialer.dial(&inner.address).await {
                    Ok(conn) => {
                        inner.slots[i].store(Arc::new(conn));
                        inner.current.store(i + 1, Ordering::SeqCst);
                        grown += 1;
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            info!(
                address = %inner.address,
                from = current,
                to = current + grown,
                increment,
                max_active,
                "Grow pool"
            );
            current += grown;

            if let Some(e) = failure {
                warn!(
                    address = %inner.address,
                    grown,
                    increment,
                    error = %e,
                    "Pool growth stopped by dial failure"
                );
                drop(lock);
                return Err(e);
            }
        }
        drop(lock);

        reference.checkout(current)
    }

    /// Close the pool and every connection in it.
    ///
    /// Later calls to [`get`](Self::get) fail with [`PoolError::Closed`].
    /// Closing twice is a no-op. Handles still outstanding may be released
    /// afterwards; transient ones still close their own connection.
    pub async fn close(&self) {
        let inner = &self.inner;
        let _lock = inner.structural.lock().await;

        if inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        inner.index.store(0, Ordering::Release);
        inner.current.store(0, Ordering::SeqCst);
        inner.refs.store(0, Ordering::SeqCst);
        let closed = inner.reset_from(0);

        info!(status = %self.status(), connections = closed, "Close pool success");
    }

    /// Snapshot the pool's counters and connection states.
    pub fn status(&self) -> PoolStatus {
        let inner = &self.inner;
        let mut states = StateCounts::default();
        for slot in inner.slots.iter() {
            if let Some(state) = slot.state() {
                states.record(state);
            }
        }

        PoolStatus {
            address: inner.address.clone(),
            closed: inner.closed.load(Ordering::Acquire),
            index: inner.index.load(Ordering::Acquire),
            current: inner.current.load(Ordering::SeqCst),
            refs: inner.refs.load(Ordering::SeqCst),
            max_idle: inner.config.max_idle,
            max_active: inner.config.max_active,
            max_concurrent_streams: inner.config.max_concurrent_streams,
            reuse: inner.config.reuse,
            states,
        }
    }

    /// Target address.
    pub fn address(&self) -> &str {
        &self.inner.address
    }

    /// Configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig<C> {
        &self.inner.config
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl<C: Connection> fmt::Debug for Pool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool").field("status", &self.status()).finish()
    }
}

// ============================================================================
// Shared State
// ============================================================================

pub(crate) struct PoolInner<C: Connection> {
    /// Round-robin counter, wraps at 2^32.
    index: AtomicU32,
    /// Populated slot count. Written only under `structural`.
    current: AtomicUsize,
    /// Outstanding logical references.
    refs: AtomicI32,
    closed: AtomicBool,
    /// Serializes growth, shrink and close.
    structural: Mutex<()>,
    slots: Box<[Slot<C>]>,
    dialer: Arc<dyn Dialer<C>>,
    pub(crate) address: String,
    config: PoolConfig<C>,
}

impl<C: Connection> PoolInner<C> {
    fn within_capacity(&self, next_ref: i32, current: usize) -> bool {
        next_ref as usize <= current.saturating_mul(self.config.max_concurrent_streams)
    }

    /// Pick a slot round-robin over `current` slots.
    ///
    /// A stale `current` may land on a slot a concurrent shrink just cleared.
    /// Shrink and close publish the smaller count before clearing, so
    /// re-reading it and picking again always reaches a populated slot.
    fn pick(&self, mut current: usize) -> Result<Arc<C>> {
        loop {
            let next = self.index.fetch_add(1, Ordering::AcqRel).wrapping_add(1) as usize % current;
            if let Some(conn) = self.slots[next].load() {
                return Ok(conn);
            }

            current = self.current.load(Ordering::SeqCst);
            if current == 0 {
                return Err(PoolError::Closed);
            }
        }
    }

    /// Give back one logical reference.
    ///
    /// # Panics
    ///
    /// Panics if more references are released than were acquired while the
    /// pool is open.
    pub(crate) fn release_ref(&self) {
        let new_ref = self.refs.fetch_sub(1, Ordering::SeqCst).wrapping_sub(1);
        if new_ref < 0 && !self.closed.load(Ordering::Acquire) {
            panic!("negative ref: {}", new_ref);
        }
        if new_ref == 0 {
            self.try_shrink();
        }
    }

    fn shrink_wanted(&self) -> bool {
        self.refs.load(Ordering::SeqCst) == 0
            && !self.closed.load(Ordering::SeqCst)
            && self.current.load(Ordering::SeqCst) > self.config.max_idle
    }

    /// Shrink back to `max_idle` if the pool is idle and oversized.
    ///
    /// Runs from `Drop`, so the structural lock is only tried. Whoever holds
    /// it either owns a reference (growth, so a later release retries), is
    /// closing, or is a shrinker that re-checks once it unlocks.
    fn try_shrink(&self) {
        while self.shrink_wanted() {
            let Ok(lock) = self.structural.try_lock() else {
                return;
            };
            if self.shrink_wanted() {
                self.shrink();
            }
            drop(lock);
        }
    }

    /// Caller holds the structural lock.
    ///
    /// `get` bumps `refs` before reading `current`, and shrink lowers
    /// `current` before re-reading `refs` (all `SeqCst`). Either shrink sees
    /// the new reference and backs off, or that `get` sees the lowered count
    /// and never picks a slot about to be cleared.
    fn shrink(&self) {
        let current = self.current.load(Ordering::SeqCst);
        let max_idle = self.config.max_idle;

        self.current.store(max_idle, Ordering::SeqCst);
        if self.refs.load(Ordering::SeqCst) != 0 {
            self.current.store(current, Ordering::SeqCst);
            return;
        }

        info!(
            address = %self.address,
            from = current,
            to = max_idle,
            decrement = current - max_idle,
            max_active = self.config.max_active,
            "Shrink pool"
        );
        self.reset_from(max_idle);
    }

    /// Close and clear every slot from `start` to the end. Returns how many
    /// connections were closed.
    fn reset_from(&self, start: usize) -> usize {
        self.slots[start..]
            .iter()
            .map(|slot| slot.reset())
            .filter(|&closed| closed)
            .count()
    }
}

impl<C: Connection> Drop for PoolInner<C> {
    fn drop(&mut self) {
        let closed = self
            .slots
            .iter_mut()
            .map(|slot| slot.reset_mut())
            .filter(|&closed| closed)
            .count();
        if closed > 0 {
            debug!(address = %self.address, connections = closed, "Pool dropped");
        }
    }
}

// ============================================================================
// Reference Guard
// ============================================================================

/// One logical reference taken by an in-flight `get`.
///
/// Dropped without being turned into a handle (dial failure, or the `get`
/// future being dropped mid-dial), it gives the reference back.
struct RefGuard<'a, C: Connection> {
    inner: &'a Arc<PoolInner<C>>,
    next_ref: i32,
    armed: bool,
}

impl<'a, C: Connection> RefGuard<'a, C> {
    fn acquire(inner: &'a Arc<PoolInner<C>>) -> Self {
        let next_ref = inner.refs.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        if next_ref == i32::MAX {
            panic!("overflow ref: {}", next_ref);
        }
        Self {
            inner,
            next_ref,
            armed: true,
        }
    }

    /// Keep the increment without a handle. Used when the pool is closed:
    /// close already reset the counters.
    fn forget(mut self) {
        self.armed = false;
    }

    fn into_conn(mut self, conn: Arc<C>, transient: bool) -> PooledConn<C> {
        self.armed = false;
        PooledConn::new(conn, Arc::clone(self.inner), transient)
    }

    fn checkout(self, current: usize) -> Result<PooledConn<C>> {
        match self.inner.pick(current) {
            Ok(conn) => Ok(self.into_conn(conn, false)),
            Err(e) => {
                self.forget();
                Err(e)
            }
        }
    }
}

impl<C: Connection> Drop for RefGuard<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.release_ref();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectivityState;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        dialed: AtomicUsize,
        closed: AtomicUsize,
        /// Dials allowed before failing; `usize::MAX` never fails.
        budget: AtomicUsize,
    }

    struct TestConn {
        closed: AtomicBool,
        counters: Arc<Counters>,
    }

    impl Connection for TestConn {
        fn state(&self) -> ConnectivityState {
            if self.closed.load(Ordering::SeqCst) {
                ConnectivityState::Shutdown
            } else {
                ConnectivityState::Ready
            }
        }

        fn close(&self) {
            assert!(!self.closed.swap(true, Ordering::SeqCst), "closed twice");
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counters(budget: usize) -> Arc<Counters> {
        let counters = Arc::new(Counters::default());
        counters.budget.store(budget, Ordering::SeqCst);
        counters
    }

    fn config(counters: &Arc<Counters>) -> PoolConfig<TestConn> {
        let counters = Arc::clone(counters);
        PoolConfig::new().dial_fn(move |_| {
            let counters = Arc::clone(&counters);
            async move {
                if counters.dialed.load(Ordering::SeqCst) >= counters.budget.load(Ordering::SeqCst) {
                    return Err(PoolError::dial("connection refused"));
                }
                counters.dialed.fetch_add(1, Ordering::SeqCst);
                Ok(TestConn {
                    closed: AtomicBool::new(false),
                    counters,
                })
            }
        })
    }

    async fn new_pool(config: PoolConfig<TestConn>) -> Pool<TestConn> {
        Pool::new("127.0.0.1:40000", config).await.unwrap()
    }

    fn populated(pool: &Pool<TestConn>, index: usize) -> bool {
        pool.inner.slots[index].is_populated()
    }

    #[tokio::test]
    async fn test_new() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters)).await;

        let status = pool.status();
        assert_eq!(status.index, 0);
        assert_eq!(status.refs, 0);
        assert_eq!(status.current, 8);
        assert_eq!(pool.inner.slots.len(), 64);
        assert_eq!(status.states.ready, 8);
        assert_eq!(counters.dialed.load(Ordering::SeqCst), 8);
        assert!(populated(&pool, 7));
        assert!(!populated(&pool, 8));
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_settings() {
        let counters = counters(usize::MAX);

        let err = Pool::new("", config(&counters)).await.unwrap_err();
        assert!(err.is_config());

        let err = Pool::new("127.0.0.1:8080", PoolConfig::<TestConn>::new())
            .await
            .unwrap_err();
        assert_eq!(err, PoolError::Config("invalid dial settings".into()));

        let err = Pool::new("127.0.0.1:8080", config(&counters).max_idle(2).max_active(1))
            .await
            .unwrap_err();
        assert!(err.is_config());

        let err = Pool::new("127.0.0.1:8080", config(&counters).max_concurrent_streams(0))
            .await
            .unwrap_err();
        assert!(err.is_config());

        let err = Pool::new("127.0.0.1:8080", config(&counters).max_active(usize::MAX))
            .await
            .unwrap_err();
        assert_eq!(err, PoolError::Config("invalid maximum settings".into()));

        assert_eq!(counters.dialed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_new_fill_failure_closes_dialed() {
        let counters = counters(3);
        let err = Pool::new("127.0.0.1:40000", config(&counters)).await.unwrap_err();

        assert_eq!(err, PoolError::Dial("connection refused".into()));
        assert_eq!(counters.dialed.load(Ordering::SeqCst), 3);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_basic_get() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters)).await;

        let conn = pool.get().await.unwrap();
        assert_eq!(conn.state(), ConnectivityState::Ready);
        assert!(!conn.is_transient());
        assert_eq!(pool.status().index, 1);
        assert_eq!(pool.status().refs, 1);

        conn.release();
        assert_eq!(pool.status().index, 1);
        assert_eq!(pool.status().refs, 0);
        assert_eq!(pool.status().current, 8);
    }

    #[tokio::test]
    async fn test_get_after_close() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters)).await;
        pool.close().await;

        let err = pool.get().await.unwrap_err();
        assert!(err.is_closed());
        assert_eq!(err.to_string(), "pool is closed");
    }

    #[tokio::test]
    async fn test_close_resets_everything() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters)).await;
        let held = pool.get().await.unwrap();

        pool.close().await;
        let status = pool.status();
        assert!(status.closed);
        assert_eq!(status.index, 0);
        assert_eq!(status.refs, 0);
        assert_eq!(status.current, 0);
        assert!(!populated(&pool, 0));
        assert!(!populated(&pool, 7));
        assert_eq!(counters.closed.load(Ordering::SeqCst), 8);
        assert_eq!(held.state(), ConnectivityState::Shutdown);

        // Releasing after close must not trip the negative-ref check.
        held.release();
        pool.close().await;
        assert_eq!(counters.closed.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_growth_then_overcommit() {
        let counters = counters(usize::MAX);
        let pool = new_pool(
            config(&counters)
                .max_idle(1)
                .max_active(2)
                .max_concurrent_streams(2)
                .reuse(true),
        )
        .await;

        let conn1 = pool.get().await.unwrap();
        let conn2 = pool.get().await.unwrap();
        let status = pool.status();
        assert_eq!((status.index, status.refs, status.current), (2, 2, 1));

        let conn3 = pool.get().await.unwrap();
        let status = pool.status();
        assert_eq!((status.index, status.refs, status.current), (3, 3, 2));

        let conn4 = pool.get().await.unwrap();
        let conn5 = pool.get().await.unwrap();
        assert!(!conn5.is_transient());
        assert_eq!(pool.status().current, 2);
        assert_eq!(counters.dialed.load(Ordering::SeqCst), 2);

        drop((conn1, conn2, conn3, conn4, conn5));
        assert_eq!(pool.status().refs, 0);
        assert_eq!(pool.status().current, 1);
    }

    #[tokio::test]
    async fn test_single_growth_event() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters).max_idle(2).max_active(8).max_concurrent_streams(3)).await;

        let mut held = Vec::new();
        for _ in 0..2 * 3 + 1 {
            held.push(pool.get().await.unwrap());
        }

        assert_eq!(pool.status().current, 4);
        assert_eq!(counters.dialed.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_growth_capped_at_max_active() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters).max_idle(3).max_active(5).max_concurrent_streams(1)).await;

        let mut held = Vec::new();
        for _ in 0..4 {
            held.push(pool.get().await.unwrap());
        }

        assert_eq!(pool.status().current, 5);
        assert!(populated(&pool, 4));
    }

    #[tokio::test]
    async fn test_transient_when_not_reusing() {
        let counters = counters(usize::MAX);
        let pool = new_pool(
            config(&counters)
                .max_idle(1)
                .max_active(1)
                .max_concurrent_streams(1)
                .reuse(false),
        )
        .await;

        let conn1 = pool.get().await.unwrap();
        assert!(!conn1.is_transient());

        let conn2 = pool.get().await.unwrap();
        assert!(conn2.is_transient());
        let transient = conn2.shared();
        assert_eq!(pool.status().current, 1);
        assert_eq!(counters.dialed.load(Ordering::SeqCst), 2);

        conn2.release();
        assert_eq!(transient.state(), ConnectivityState::Shutdown);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
        assert_eq!(pool.status().current, 1);
        assert_eq!(pool.status().refs, 1);

        conn1.release();
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shrink_after_idle() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters).max_idle(2).max_active(8).max_concurrent_streams(1)).await;

        let mut held = Vec::new();
        for _ in 0..8 {
            held.push(pool.get().await.unwrap());
        }
        assert_eq!(pool.status().current, 8);

        held.pop();
        assert_eq!(pool.status().current, 8);

        held.clear();
        let status = pool.status();
        assert_eq!(status.refs, 0);
        assert_eq!(status.current, 2);
        assert_eq!(status.states.total(), 2);
        assert!(populated(&pool, 1));
        assert!(!populated(&pool, 2));
        assert!(!populated(&pool, 7));
        assert_eq!(counters.closed.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_shrink_backs_off_while_referenced() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters).max_idle(1).max_active(2).max_concurrent_streams(1)).await;

        let conn1 = pool.get().await.unwrap();
        let conn2 = pool.get().await.unwrap();
        assert_eq!(pool.status().current, 2);

        {
            let _lock = pool.inner.structural.lock().await;
            pool.inner.shrink();
        }
        assert_eq!(pool.status().current, 2);
        assert!(populated(&pool, 1));
        assert_eq!(counters.closed.load(Ordering::SeqCst), 0);

        drop((conn1, conn2));
        assert_eq!(pool.status().current, 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_growth_failure_keeps_partial_growth() {
        let counters = counters(3);
        let pool = new_pool(config(&counters).max_idle(2).max_active(8).max_concurrent_streams(1)).await;

        let conn1 = pool.get().await.unwrap();
        let conn2 = pool.get().await.unwrap();

        let err = pool.get().await.unwrap_err();
        assert_eq!(err, PoolError::Dial("connection refused".into()));

        let status = pool.status();
        assert_eq!(status.current, 3);
        assert_eq!(status.refs, 2);
        assert!(populated(&pool, 2));

        drop((conn1, conn2));
        assert_eq!(pool.status().current, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_growth_keeps_dialed_connections_counted() {
        let counters = counters(usize::MAX);
        let dials = Arc::clone(&counters);
        let config = PoolConfig::new()
            .dial_fn(move |_| {
                let counters = Arc::clone(&dials);
                async move {
                    // The initial fill is instant, growth dials are slow.
                    if counters.dialed.fetch_add(1, Ordering::SeqCst) >= 2 {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                    Ok(TestConn {
                        closed: AtomicBool::new(false),
                        counters,
                    })
                }
            })
            .max_idle(2)
            .max_active(8)
            .max_concurrent_streams(1);
        let pool = new_pool(config).await;

        let conn1 = pool.get().await.unwrap();
        let conn2 = pool.get().await.unwrap();

        // Growth to 4 is dropped after the first growth dial completes.
        let res = tokio::time::timeout(Duration::from_millis(75), pool.get()).await;
        assert!(res.is_err());

        let status = pool.status();
        assert_eq!(status.current, 3);
        assert_eq!(status.refs, 2);
        assert!(populated(&pool, 2));
        assert!(!populated(&pool, 3));

        drop((conn1, conn2));
        assert_eq!(pool.status().current, 2);
        assert!(!populated(&pool, 2));
        assert_eq!(counters.dialed.load(Ordering::SeqCst), 4);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_dial_failure_gives_reference_back() {
        let counters = counters(1);
        let pool = new_pool(
            config(&counters)
                .max_idle(1)
                .max_active(1)
                .max_concurrent_streams(1)
                .reuse(false),
        )
        .await;

        let conn = pool.get().await.unwrap();
        assert!(pool.get().await.is_err());
        assert_eq!(pool.status().refs, 1);

        conn.release();
        assert_eq!(pool.status().refs, 0);
    }

    #[tokio::test]
    async fn test_index_wraps() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters).max_idle(3).max_active(3)).await;
        pool.inner.index.store(u32::MAX, Ordering::SeqCst);

        let conn = pool.get().await.unwrap();
        assert_eq!(pool.status().index, 0);
        drop(conn);
    }

    #[tokio::test]
    #[should_panic(expected = "overflow ref")]
    async fn test_overflow_ref_panics() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters)).await;
        pool.inner.refs.store(i32::MAX - 1, Ordering::SeqCst);

        let _ = pool.get().await;
    }

    #[tokio::test]
    #[should_panic(expected = "negative ref")]
    async fn test_unbalanced_release_panics() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters)).await;

        let conn = pool.inner.slots[0].load().unwrap();
        drop(PooledConn::new(conn, Arc::clone(&pool.inner), false));
    }

    #[tokio::test]
    async fn test_drop_closes_connections() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters).max_idle(4).max_active(4)).await;
        drop(pool);

        assert_eq!(counters.closed.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_status_string() {
        let counters = counters(usize::MAX);
        let pool = new_pool(config(&counters).max_idle(2).max_active(4)).await;

        let text = pool.status().to_string();
        assert!(text.starts_with("address:127.0.0.1:40000, closed:false, index:0, current:2, ref:0."));
        assert!(text.contains("ready:2"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_get() {
        let counters = counters(usize::MAX);
        let pool = new_pool(
            config(&counters)
                .max_idle(8)
                .max_active(64)
                .max_concurrent_streams(2)
                .reuse(false),
        )
        .await;

        let mut tasks = Vec::with_capacity(500);
        for _ in 0..500 {
            let pool = pool.clone();
            tasks.push(tokio::spawn(async move {
                let conn = pool.get().await.unwrap();
                tokio::task::yield_now().await;
                conn.release();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let status = pool.status();
        assert_eq!(status.refs, 0);
        assert_eq!(status.current, 8);
        assert!(populated(&pool, 0));
        assert!(!populated(&pool, 8));
    }
}
