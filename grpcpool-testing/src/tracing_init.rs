//! Test subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber writing through the test harness.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Safe to call from
/// every test; only the first call installs a subscriber.
pub fn init_tracing() {
    init_tracing_with_level("warn");
}

/// Like [`init_tracing`], with a fallback level used when `RUST_LOG` is unset.
pub fn init_tracing_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init_tracing();
        init_tracing_with_level("debug");
        tracing::info!(component = "grpcpool-testing", "subscriber installed");
    }
}
