//! Channel dial configuration.

use std::time::Duration;

/// Timeout for establishing one channel.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle time after which the client pings the server.
pub const KEEP_ALIVE_TIME: Duration = Duration::from_secs(10);

/// Time to wait for a keepalive ping response before closing the channel.
pub const KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(3);

/// HTTP/2 window size (1 GiB) for both connection and stream, for throughput.
pub const INITIAL_WINDOW_SIZE: u32 = 1 << 30;

/// Settings applied to every channel a [`GrpcDialer`](crate::GrpcDialer) opens.
#[derive(Debug, Clone)]
pub struct GrpcDialConfig {
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Request timeout applied to every call on the channel.
    pub timeout: Option<Duration>,
    /// HTTP/2 keepalive ping interval.
    pub http2_keepalive_interval: Option<Duration>,
    /// HTTP/2 keepalive timeout.
    pub http2_keepalive_timeout: Option<Duration>,
    /// Send keepalive pings even without active streams.
    pub keep_alive_while_idle: bool,
    /// TCP keepalive.
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay.
    pub tcp_nodelay: bool,
    /// Initial connection window size.
    pub initial_connection_window_size: Option<u32>,
    /// Initial stream window size.
    pub initial_stream_window_size: Option<u32>,
    /// Concurrency limit applied by the channel itself.
    pub concurrency_limit: Option<usize>,
    /// Connect on first use instead of at dial time.
    pub lazy: bool,
}

impl Default for GrpcDialConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DIAL_TIMEOUT,
            timeout: None,
            http2_keepalive_interval: Some(KEEP_ALIVE_TIME),
            http2_keepalive_timeout: Some(KEEP_ALIVE_TIMEOUT),
            keep_alive_while_idle: true,
            tcp_keepalive: None,
            tcp_nodelay: true,
            initial_connection_window_size: Some(INITIAL_WINDOW_SIZE),
            initial_stream_window_size: Some(INITIAL_WINDOW_SIZE),
            concurrency_limit: None,
            lazy: false,
        }
    }
}

impl GrpcDialConfig {
    /// Create a new builder.
    pub fn builder() -> GrpcDialConfigBuilder {
        GrpcDialConfigBuilder::default()
    }
}

/// Builder for channel dial configuration.
#[derive(Debug, Default)]
pub struct GrpcDialConfigBuilder {
    config: GrpcDialConfig,
}

impl GrpcDialConfigBuilder {
    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set HTTP/2 keepalive.
    pub fn http2_keepalive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.config.http2_keepalive_interval = Some(interval);
        self.config.http2_keepalive_timeout = Some(timeout);
        self
    }

    /// Disable HTTP/2 keepalive.
    pub fn no_http2_keepalive(mut self) -> Self {
        self.config.http2_keepalive_interval = None;
        self.config.http2_keepalive_timeout = None;
        self
    }

    /// Keep pinging while no stream is open.
    pub fn keep_alive_while_idle(mut self, enable: bool) -> Self {
        self.config.keep_alive_while_idle = enable;
        self
    }

    /// Set TCP keepalive.
    pub fn tcp_keepalive(mut self, duration: Duration) -> Self {
        self.config.tcp_keepalive = Some(duration);
        self
    }

    /// Enable TCP nodelay.
    pub fn tcp_nodelay(mut self, enable: bool) -> Self {
        self.config.tcp_nodelay = enable;
        self
    }

    /// Set both HTTP/2 window sizes.
    pub fn window_size(mut self, size: u32) -> Self {
        self.config.initial_connection_window_size = Some(size);
        self.config.initial_stream_window_size = Some(size);
        self
    }

    /// Set the channel's own concurrency limit.
    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.config.concurrency_limit = Some(limit);
        self
    }

    /// Connect lazily on first use.
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.config.lazy = lazy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GrpcDialConfig {
        self.config
    }
}
