//! Mock transports for pool tests.

use async_trait::async_trait;
use grpcpool_core::{Connection, ConnectivityState, Dialer, PoolError, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct DialCounters {
    dialed: AtomicUsize,
    failed: AtomicUsize,
    closed: AtomicUsize,
    double_closed: AtomicUsize,
}

/// In-memory connection that records its teardown.
pub struct MockConnection {
    id: usize,
    state: AtomicU8,
    closes: AtomicUsize,
    counters: Arc<DialCounters>,
}

impl MockConnection {
    /// Create a ready connection not tied to any dialer.
    pub fn new(id: usize) -> Self {
        Self::with_counters(id, Arc::default())
    }

    fn with_counters(id: usize, counters: Arc<DialCounters>) -> Self {
        Self {
            id,
            state: AtomicU8::new(ConnectivityState::Ready as u8),
            closes: AtomicUsize::new(0),
            counters,
        }
    }

    /// Dial sequence number of this connection.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Force the reported connectivity state.
    pub fn set_state(&self, state: ConnectivityState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// How many times `close` has been called on this connection.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Acquire)
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

impl Connection for MockConnection {
    fn state(&self) -> ConnectivityState {
        ConnectivityState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn close(&self) {
        self.set_state(ConnectivityState::Shutdown);
        if self.closes.fetch_add(1, Ordering::AcqRel) == 0 {
            self.counters.closed.fetch_add(1, Ordering::AcqRel);
        } else {
            self.counters.double_closed.fetch_add(1, Ordering::AcqRel);
        }
    }
}

impl fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockConnection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("closes", &self.close_count())
            .finish()
    }
}

/// Dialer producing [`MockConnection`]s.
///
/// Clones share counters and failure settings, so a test can hand one clone
/// to the pool and keep another for assertions.
///
/// ```
/// use grpcpool_core::{Pool, PoolConfig};
/// use grpcpool_testing::{MockConnection, MockDialer};
///
/// # tokio_test::block_on(async {
/// let dialer = MockDialer::new();
/// let config = PoolConfig::<MockConnection>::new()
///     .dialer(dialer.clone())
///     .max_idle(2);
/// let pool = Pool::new("mock:1", config).await.unwrap();
///
/// assert_eq!(dialer.dialed(), 2);
/// pool.close().await;
/// assert_eq!(dialer.live(), 0);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockDialer {
    counters: Arc<DialCounters>,
    settings: Arc<DialSettings>,
}

#[derive(Debug)]
struct DialSettings {
    fail_after: AtomicUsize,
    fail_all: AtomicBool,
    latency_micros: AtomicU64,
}

impl Default for DialSettings {
    fn default() -> Self {
        Self {
            fail_after: AtomicUsize::new(usize::MAX),
            fail_all: AtomicBool::new(false),
            latency_micros: AtomicU64::new(0),
        }
    }
}

impl MockDialer {
    /// Create a dialer that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every dial once `successes` dials have succeeded.
    pub fn fail_after(self, successes: usize) -> Self {
        self.set_fail_after(Some(successes));
        self
    }

    /// Sleep for `latency` before every dial.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.settings
            .latency_micros
            .store(latency.as_micros() as u64, Ordering::Release);
        self
    }

    /// Change the success budget; `None` removes it.
    pub fn set_fail_after(&self, successes: Option<usize>) {
        self.settings
            .fail_after
            .store(successes.unwrap_or(usize::MAX), Ordering::Release);
    }

    /// Make every dial fail until switched off.
    pub fn set_fail_all(&self, fail: bool) {
        self.settings.fail_all.store(fail, Ordering::Release);
    }

    /// Successful dials.
    pub fn dialed(&self) -> usize {
        self.counters.dialed.load(Ordering::Acquire)
    }

    /// Failed dials.
    pub fn failed(&self) -> usize {
        self.counters.failed.load(Ordering::Acquire)
    }

    /// Connections closed at least once.
    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::Acquire)
    }

    /// Extra `close` calls on already closed connections.
    pub fn double_closed(&self) -> usize {
        self.counters.double_closed.load(Ordering::Acquire)
    }

    /// Dialed connections not yet closed.
    pub fn live(&self) -> usize {
        self.dialed().saturating_sub(self.closed())
    }

    fn refuse(&self, address: &str) -> PoolError {
        self.counters.failed.fetch_add(1, Ordering::AcqRel);
        PoolError::dial(format!("mock dial refused: {}", address))
    }
}

impl fmt::Debug for MockDialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDialer")
            .field("dialed", &self.dialed())
            .field("failed", &self.failed())
            .field("closed", &self.closed())
            .field("double_closed", &self.double_closed())
            .finish()
    }
}

#[async_trait]
impl Dialer<MockConnection> for MockDialer {
    async fn dial(&self, address: &str) -> Result<MockConnection> {
        let latency = self.settings.latency_micros.load(Ordering::Acquire);
        if latency > 0 {
            tokio::time::sleep(Duration::from_micros(latency)).await;
        }

        if self.settings.fail_all.load(Ordering::Acquire) {
            return Err(self.refuse(address));
        }

        let limit = self.settings.fail_after.load(Ordering::Acquire);
        let admitted = self
            .counters
            .dialed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then_some(n + 1)
            });

        match admitted {
            Ok(id) => Ok(MockConnection::with_counters(id, Arc::clone(&self.counters))),
            Err(_) => Err(self.refuse(address)),
        }
    }
}
