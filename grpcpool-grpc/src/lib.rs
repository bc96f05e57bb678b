//! tonic transport for grpcpool.
//!
//! Provides [`GrpcDialer`], which opens tonic [`Channel`](tonic::transport::Channel)s
//! with keepalive and large HTTP/2 windows, and [`GrpcConnection`], the pooled
//! channel wrapper.
//!
//! ```rust,ignore
//! use grpcpool_grpc::connect;
//!
//! let pool = grpcpool_grpc::connect("127.0.0.1:50051").await?;
//! let conn = pool.get().await?;
//! let mut client = GreeterClient::new(conn.channel());
//! ```

#![warn(clippy::all)]

mod client;
mod config;

pub use client::{
    connect, default_config, normalize_address, GrpcConnection, GrpcDialer, GrpcPool,
};
pub use config::{
    GrpcDialConfig, GrpcDialConfigBuilder, DIAL_TIMEOUT, INITIAL_WINDOW_SIZE, KEEP_ALIVE_TIME,
    KEEP_ALIVE_TIMEOUT,
};
