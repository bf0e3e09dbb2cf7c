use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` when set, otherwise defaults to `info` for this crate.
/// Safe to call once per process; embedders that install their own
/// subscriber should skip this.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,medley_service=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
