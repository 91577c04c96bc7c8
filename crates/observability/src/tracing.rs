//! Tracing/logging initialization.
//!
//! JSON lines by default; `BANKD_LOG_FORMAT=pretty` switches to the
//! human-readable formatter for interactive runs.

use tracing_subscriber::EnvFilter;

/// Output format of the log subscriber.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Read `BANKD_LOG_FORMAT`; anything other than `pretty` means JSON.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("BANKD_LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(LogFormat::from_env());
}

pub fn init_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    // Levels/filters come from RUST_LOG.
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    ::tracing::debug!(?format, "tracing initialized");
}
