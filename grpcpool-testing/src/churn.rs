//! Concurrent acquire/release load against a pool.

use grpcpool_core::{Connection, Pool};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Churn run configuration
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// Number of concurrent tasks
    pub tasks: usize,

    /// Acquisitions per task
    pub iterations: usize,

    /// How long each handle is held before release
    pub hold: Duration,

    /// Timeout per acquisition
    pub timeout: Duration,
}

impl ChurnConfig {
    /// Create a churn config.
    ///
    /// ```
    /// use grpcpool_testing::ChurnConfig;
    ///
    /// let config = ChurnConfig::new(16, 100);
    /// assert_eq!(config.tasks, 16);
    /// ```
    pub fn new(tasks: usize, iterations: usize) -> Self {
        Self {
            tasks,
            iterations,
            hold: Duration::ZERO,
            timeout: Duration::from_secs(10),
        }
    }

    /// Hold every handle for `hold` before releasing it
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Set timeout per acquisition
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self::new(10, 100)
    }
}

/// Churn run results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChurnStats {
    /// Successful acquisitions
    pub successful: u64,

    /// Failed or timed out acquisitions
    pub failed: u64,

    /// Successful acquisitions that returned a one-time connection
    pub transient: u64,

    /// Wall time of the run
    pub duration: Duration,
}

impl ChurnStats {
    /// All attempted acquisitions.
    pub fn total(&self) -> u64 {
        self.successful + self.failed
    }

    /// Successful acquisitions per second.
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.successful as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for ChurnStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "successful:{} failed:{} transient:{} duration:{:.3}s ops/s:{:.0}",
            self.successful,
            self.failed,
            self.transient,
            self.duration.as_secs_f64(),
            self.ops_per_sec()
        )
    }
}

#[derive(Default)]
struct Tally {
    successful: AtomicU64,
    failed: AtomicU64,
    transient: AtomicU64,
}

/// Spawn `config.tasks` tasks that each acquire, hold and release a handle
/// `config.iterations` times.
///
/// A panic inside a task (a fatal pool contract fault) is resumed on the
/// caller.
pub async fn run_churn<C: Connection>(pool: &Pool<C>, config: &ChurnConfig) -> ChurnStats {
    let start = Instant::now();
    let tally = Arc::new(Tally::default());
    let mut handles = Vec::with_capacity(config.tasks);

    for _ in 0..config.tasks {
        let pool = pool.clone();
        let tally = Arc::clone(&tally);
        let config = config.clone();

        handles.push(tokio::spawn(async move {
            for _ in 0..config.iterations {
                match tokio::time::timeout(config.timeout, pool.get()).await {
                    Ok(Ok(conn)) => {
                        if conn.is_transient() {
                            tally.transient.fetch_add(1, Ordering::Relaxed);
                        }
                        if config.hold.is_zero() {
                            tokio::task::yield_now().await;
                        } else {
                            tokio::time::sleep(config.hold).await;
                        }
                        conn.release();
                        tally.successful.fetch_add(1, Ordering::Relaxed);
                    }
                    _ => {
                        tally.failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }));
    }

    for handle in handles {
        if let Err(err) = handle.await
            && err.is_panic()
        {
            std::panic::resume_unwind(err.into_panic());
        }
    }

    ChurnStats {
        successful: tally.successful.load(Ordering::Relaxed),
        failed: tally.failed.load(Ordering::Relaxed),
        transient: tally.transient.load(Ordering::Relaxed),
        duration: start.elapsed(),
    }
}
