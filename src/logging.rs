use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter from `RUST_LOG` when set, else from `log_level`.
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stderr subscriber so stdout stays free for command output.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(log_level: &str) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(stderr_layer)
        .try_init();
}
