//! Pool configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::transport::{dial_fn, Connection, Dialer};
use crate::{PoolError, Result};

/// Default idle floor.
pub const DEFAULT_MAX_IDLE: usize = 8;
/// Default active ceiling.
pub const DEFAULT_MAX_ACTIVE: usize = 64;
/// Default per-connection stream limit.
pub const DEFAULT_MAX_CONCURRENT_STREAMS: usize = 64;
/// Largest accepted `max_active`. Slot storage is allocated up front.
pub const MAX_ACTIVE_LIMIT: usize = 1 << 16;

/// Configuration for a connection pool.
///
/// Consumed once by [`Pool::new`](crate::Pool::new); the pool keeps its own
/// immutable copy.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PoolConfig<C: Connection> {
    /// Connection factory.
    #[serde(skip)]
    pub dialer: Option<Arc<dyn Dialer<C>>>,

    /// Number of connections dialed up front and kept while idle.
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    /// Maximum number of connections held in the pool.
    #[serde(default = "default_max_active")]
    pub max_active: usize,

    /// Logical capacity of a single connection.
    #[serde(default = "default_max_concurrent_streams")]
    pub max_concurrent_streams: usize,

    /// At the ceiling, overcommit existing connections (`true`) or hand out
    /// one-time connections (`false`).
    #[serde(default = "default_reuse")]
    pub reuse: bool,
}

fn default_max_idle() -> usize {
    DEFAULT_MAX_IDLE
}

fn default_max_active() -> usize {
    DEFAULT_MAX_ACTIVE
}

fn default_max_concurrent_streams() -> usize {
    DEFAULT_MAX_CONCURRENT_STREAMS
}

fn default_reuse() -> bool {
    true
}

impl<C: Connection> PoolConfig<C> {
    /// Create a configuration with default limits and no dialer.
    pub fn new() -> Self {
        Self {
            dialer: None,
            max_idle: default_max_idle(),
            max_active: default_max_active(),
            max_concurrent_streams: default_max_concurrent_streams(),
            reuse: default_reuse(),
        }
    }

    /// Set the connection factory.
    pub fn dialer(mut self, dialer: impl Dialer<C> + 'static) -> Self {
        self.dialer = Some(Arc::new(dialer));
        self
    }

    /// Set a shared connection factory.
    pub fn shared_dialer(mut self, dialer: Arc<dyn Dialer<C>>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    /// Use an async closure as the connection factory.
    pub fn dial_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C>> + Send + 'static,
    {
        self.dialer(dial_fn(f))
    }

    /// Set the idle floor.
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Set the active ceiling.
    pub fn max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    /// Set the per-connection stream limit.
    pub fn max_concurrent_streams(mut self, streams: usize) -> Self {
        self.max_concurrent_streams = streams;
        self
    }

    /// Set the reuse-at-ceiling policy.
    pub fn reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    /// Override limits from environment variables.
    ///
    /// Uses the following environment variables:
    /// - `GRPCPOOL_MAX_IDLE`
    /// - `GRPCPOOL_MAX_ACTIVE`
    /// - `GRPCPOOL_MAX_CONCURRENT_STREAMS`
    /// - `GRPCPOOL_REUSE` (`true`/`false`/`1`/`0`)
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with a custom variable lookup.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GRPCPOOL_MAX_IDLE") {
            self.max_idle = parse_limit("GRPCPOOL_MAX_IDLE", &value)?;
        }
        if let Some(value) = lookup("GRPCPOOL_MAX_ACTIVE") {
            self.max_active = parse_limit("GRPCPOOL_MAX_ACTIVE", &value)?;
        }
        if let Some(value) = lookup("GRPCPOOL_MAX_CONCURRENT_STREAMS") {
            self.max_concurrent_streams = parse_limit("GRPCPOOL_MAX_CONCURRENT_STREAMS", &value)?;
        }
        if let Some(value) = lookup("GRPCPOOL_REUSE") {
            self.reuse = match value.trim().to_lowercase().as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => return Err(PoolError::Config("Invalid GRPCPOOL_REUSE".into())),
            };
        }
        Ok(self)
    }

    /// Validate the configuration against a target address.
    ///
    /// Only an empty address is rejected; anything else is left to the
    /// dialer. `max_active` may not exceed [`MAX_ACTIVE_LIMIT`].
    pub fn validate(&self, address: &str) -> Result<()> {
        if address.is_empty() {
            return Err(PoolError::Config("invalid address settings".into()));
        }
        if self.dialer.is_none() {
            return Err(PoolError::Config("invalid dial settings".into()));
        }
        if self.max_idle == 0
            || self.max_active == 0
            || self.max_idle > self.max_active
            || self.max_active > MAX_ACTIVE_LIMIT
        {
            return Err(PoolError::Config("invalid maximum settings".into()));
        }
        if self.max_concurrent_streams == 0 {
            return Err(PoolError::Config(
                "invalid max_concurrent_streams settings".into(),
            ));
        }
        Ok(())
    }
}

fn parse_limit(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| PoolError::Config(format!("Invalid {}", key)))
}

impl<C: Connection> Default for PoolConfig<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> Clone for PoolConfig<C> {
    fn clone(&self) -> Self {
        Self {
            dialer: self.dialer.clone(),
            max_idle: self.max_idle,
            max_active: self.max_active,
            max_concurrent_streams: self.max_concurrent_streams,
            reuse: self.reuse,
        }
    }
}

impl<C: Connection> fmt::Debug for PoolConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("dialer", &self.dialer.as_ref().map(|_| "<dialer>"))
            .field("max_idle", &self.max_idle)
            .field("max_active", &self.max_active)
            .field("max_concurrent_streams", &self.max_concurrent_streams)
            .field("reuse", &self.reuse)
            .finish()
    }
}
