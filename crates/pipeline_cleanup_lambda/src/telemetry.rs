use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber for the Lambda process.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Output carries no ANSI
/// colours or timestamps because CloudWatch stamps each line itself.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .try_init();
}
