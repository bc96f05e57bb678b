// grpcpool - a gRPC client connection pool for Rust
//
// Shares a bounded, self-sizing set of channels to one endpoint between many
// concurrent callers, multiplexing up to `max_concurrent_streams` logical
// checkouts on each channel.

// Re-export core functionality
pub use grpcpool_core::*;

// Re-export optional crates
#[cfg(feature = "grpc")]
pub use grpcpool_grpc;

#[cfg(feature = "grpc")]
pub use grpcpool_grpc::{
    GrpcConnection, GrpcDialConfig, GrpcDialer, GrpcPool, connect, default_config,
};

#[cfg(feature = "testing")]
pub use grpcpool_testing;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Connection,
        ConnectivityState,
        Dialer,
        Pool,
        PoolConfig,
        PoolError,
        PoolStatus,
        PooledConn,
        Result,
    };

    #[cfg(feature = "grpc")]
    pub use crate::{GrpcConnection, GrpcDialer, GrpcPool};
}
