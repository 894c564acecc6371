use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Level for a `-v` count: none is errors only, each flag adds one level up
/// to debug.
pub const fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    }
}

/// Filter directive applied when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> String {
    format!("historykeeper={}", level_for(verbosity))
}

/// Install the global subscriber, writing to stderr. `RUST_LOG` overrides
/// the verbosity flag.
///
/// Call once, at startup: panics if a global subscriber is already set.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(verbosity).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
