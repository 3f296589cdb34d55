use tracing_subscriber::{fmt, EnvFilter};

/// Initializes tracing/logging based on environment variables.
/// `SQLEVAL_LOG_JSON=1` switches to line-delimited JSON output.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sqleval=info,warn"));

    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false);

    if std::env::var("SQLEVAL_LOG_JSON").is_ok_and(|v| v == "1") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
