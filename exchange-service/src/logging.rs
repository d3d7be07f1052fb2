use tracing::{info, Level};

pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Console logging at the configured level. Safe to call more than once.
pub fn setup_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_max_level(parse_level(level))
        .try_init();

    info!("Logging initialized with level: {}", level);
}
