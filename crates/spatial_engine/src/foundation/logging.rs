//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

use log::LevelFilter;

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    // A second init (tests, embedding hosts) is not an error for us.
    let _ = env_logger::builder().try_init();
}

/// Initialize logging with an explicit default level such as `"info"`.
///
/// `RUST_LOG` still wins when it is set. Unknown level names fall back to
/// `info`.
pub fn init_with_level(level: &str) {
    let filter = parse_level(level);
    let _ = env_logger::builder()
        .filter_level(filter)
        .parse_default_env()
        .try_init();
}

/// Parse a log level name, defaulting to `Info`
pub fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}
