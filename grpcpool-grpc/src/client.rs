//! tonic channel connections and dialer.

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use grpcpool_core::{Connection, ConnectivityState, Dialer, Pool, PoolConfig, PoolError, Result};

use crate::GrpcDialConfig;

/// A pool of tonic channels.
pub type GrpcPool = Pool<GrpcConnection>;

/// One tonic [`Channel`] held by a pool slot.
///
/// The channel multiplexes many concurrent calls; handing out clones is
/// cheap. Closing only marks the connection `Shutdown`. The underlying
/// transport is torn down once the last channel clone is dropped.
pub struct GrpcConnection {
    channel: Channel,
    endpoint: String,
    state: AtomicU8,
}

impl GrpcConnection {
    fn new(channel: Channel, endpoint: String, state: ConnectivityState) -> Self {
        Self {
            channel,
            endpoint,
            state: AtomicU8::new(state as u8),
        }
    }

    /// Get a clone of the channel, ready to wrap in a generated client.
    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    /// Endpoint URI this channel was dialed with.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Connection for GrpcConnection {
    fn state(&self) -> ConnectivityState {
        ConnectivityState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn close(&self) {
        let previous = self
            .state
            .swap(ConnectivityState::Shutdown as u8, Ordering::AcqRel);
        if previous != ConnectivityState::Shutdown as u8 {
            debug!(endpoint = %self.endpoint, "gRPC channel closed");
        }
    }
}

impl fmt::Debug for GrpcConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcConnection")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

/// Dials tonic channels for a pool.
#[derive(Debug, Clone, Default)]
pub struct GrpcDialer {
    config: GrpcDialConfig,
}

impl GrpcDialer {
    /// Create a dialer with the given channel settings.
    pub fn new(config: GrpcDialConfig) -> Self {
        Self { config }
    }

    /// Get the channel settings.
    pub fn config(&self) -> &GrpcDialConfig {
        &self.config
    }

    /// Build the endpoint for `address` without connecting.
    pub fn endpoint(&self, address: &str) -> Result<Endpoint> {
        let config = &self.config;
        let mut endpoint = Endpoint::from_shared(normalize_address(address))
            .map_err(|e| PoolError::Config(e.to_string()))?
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(config.tcp_nodelay)
            .tcp_keepalive(config.tcp_keepalive)
            .keep_alive_while_idle(config.keep_alive_while_idle)
            .initial_connection_window_size(config.initial_connection_window_size)
            .initial_stream_window_size(config.initial_stream_window_size);

        if let Some(timeout) = config.timeout {
            endpoint = endpoint.timeout(timeout);
        }
        if let Some(interval) = config.http2_keepalive_interval {
            endpoint = endpoint.http2_keep_alive_interval(interval);
        }
        if let Some(timeout) = config.http2_keepalive_timeout {
            endpoint = endpoint.keep_alive_timeout(timeout);
        }
        if let Some(limit) = config.concurrency_limit {
            endpoint = endpoint.concurrency_limit(limit);
        }

        Ok(endpoint)
    }
}

#[async_trait]
impl Dialer<GrpcConnection> for GrpcDialer {
    async fn dial(&self, address: &str) -> Result<GrpcConnection> {
        let endpoint = self.endpoint(address)?;
        let uri = endpoint.uri().to_string();

        if self.config.lazy {
            debug!(endpoint = %uri, "Created lazy gRPC channel");
            return Ok(GrpcConnection::new(
                endpoint.connect_lazy(),
                uri,
                ConnectivityState::Idle,
            ));
        }

        let channel = endpoint.connect().await.map_err(PoolError::dial)?;
        debug!(endpoint = %uri, "gRPC channel connected");

        Ok(GrpcConnection::new(channel, uri, ConnectivityState::Ready))
    }
}

/// Prefix a bare `host:port` with `http://`.
pub fn normalize_address(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// Pool settings with the default idle, active and stream limits and a
/// [`GrpcDialer`] using the default channel settings.
pub fn default_config() -> PoolConfig<GrpcConnection> {
    PoolConfig::new().dialer(GrpcDialer::default())
}

/// Open a pool of tonic channels to `address` with [`default_config`].
pub async fn connect(address: impl Into<String>) -> Result<GrpcPool> {
    let address = address.into();
    info!(address = %address, "Connecting gRPC pool");
    Pool::new(address, default_config()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn lazy_dialer() -> GrpcDialer {
        GrpcDialer::new(GrpcDialConfig::builder().lazy(true).build())
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("127.0.0.1:50051"), "http://127.0.0.1:50051");
        assert_eq!(normalize_address("https://api.local:443"), "https://api.local:443");
    }

    #[test]
    fn test_endpoint() {
        let endpoint = GrpcDialer::default().endpoint("localhost:50051").unwrap();
        assert_eq!(endpoint.uri().host(), Some("localhost"));
        assert_eq!(endpoint.uri().port_u16(), Some(50051));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = GrpcDialer::default().endpoint("exa mple:1").unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_lazy_dial() {
        let conn = lazy_dialer().dial("127.0.0.1:50051").await.unwrap();
        assert_eq!(conn.state(), ConnectivityState::Idle);
        assert!(conn.endpoint().starts_with("http://127.0.0.1:50051"));

        conn.close();
        assert_eq!(conn.state(), ConnectivityState::Shutdown);
    }

    #[tokio::test]
    async fn test_eager_dial_refused() {
        let dialer = GrpcDialer::new(
            GrpcDialConfig::builder()
                .connect_timeout(Duration::from_millis(500))
                .build(),
        );
        let err = dialer.dial("127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, PoolError::Dial(_)));
    }

    #[tokio::test]
    async fn test_pool_of_lazy_channels() {
        let config = default_config()
            .dialer(lazy_dialer())
            .max_idle(2)
            .max_active(4)
            .max_concurrent_streams(8);
        let pool: GrpcPool = Pool::new("127.0.0.1:50051", config).await.unwrap();

        let status = pool.status();
        assert_eq!(status.current, 2);
        assert_eq!(status.states.idle, 2);

        let conn = pool.get().await.unwrap();
        let _channel = conn.channel();
        conn.release();

        pool.close().await;
        assert_eq!(pool.status().current, 0);
    }
}
