//! Pool status snapshots.

use serde::Serialize;
use std::fmt;

use crate::transport::ConnectivityState;

/// Diagnostic snapshot of a pool.
///
/// Fields are read independently, not under a single lock, so a snapshot
/// taken under load may be slightly inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Target address.
    pub address: String,
    /// Whether the pool has been closed.
    pub closed: bool,
    /// Round-robin counter.
    pub index: u32,
    /// Physical connections held in slots.
    pub current: usize,
    /// Outstanding logical handles.
    pub refs: i32,
    /// Idle floor.
    pub max_idle: usize,
    /// Active ceiling.
    pub max_active: usize,
    /// Per-connection stream limit.
    pub max_concurrent_streams: usize,
    /// Reuse-at-ceiling policy.
    pub reuse: bool,
    /// Connectivity states of the populated slots.
    pub states: StateCounts,
}

impl PoolStatus {
    /// Nominal logical capacity at the current size.
    pub fn capacity(&self) -> usize {
        self.current.saturating_mul(self.max_concurrent_streams)
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "address:{}, closed:{}, index:{}, current:{}, ref:{}. option:{{max_idle:{} max_active:{} max_concurrent_streams:{} reuse:{}}}, states:{}",
            self.address,
            self.closed,
            self.index,
            self.current,
            self.refs,
            self.max_idle,
            self.max_active,
            self.max_concurrent_streams,
            self.reuse,
            self.states,
        )
    }
}

/// Per-state histogram of slot connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub idle: usize,
    pub connecting: usize,
    pub ready: usize,
    pub transient_failure: usize,
    pub shutdown: usize,
}

impl StateCounts {
    /// Count one connection in `state`.
    pub fn record(&mut self, state: ConnectivityState) {
        match state {
            ConnectivityState::Idle => self.idle += 1,
            ConnectivityState::Connecting => self.connecting += 1,
            ConnectivityState::Ready => self.ready += 1,
            ConnectivityState::TransientFailure => self.transient_failure += 1,
            ConnectivityState::Shutdown => self.shutdown += 1,
        }
    }

    /// Total connections counted.
    pub fn total(&self) -> usize {
        self.idle + self.connecting + self.ready + self.transient_failure + self.shutdown
    }
}

impl fmt::Display for StateCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{idle:{} connecting:{} ready:{} transient_failure:{} shutdown:{}}}",
            self.idle, self.connecting, self.ready, self.transient_failure, self.shutdown
        )
    }
}
