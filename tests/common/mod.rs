//! Shared test setup.

/// Initialize tracing from `RUST_LOG`.
///
/// `try_init()` is idempotent: the first call in the process succeeds,
/// subsequent calls are silently ignored.
pub fn setup_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
