//! Tracing setup for the command-line tool
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! selects what is logged and `LOG_FORMAT=json` switches to JSON lines.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or does not parse
pub const DEFAULT_LOG_FILTER: &str = "annomarket=info";

/// Shape of each log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text
    Plain,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Format named by a `LOG_FORMAT` value, case-insensitively
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Plain,
        }
    }
}

/// Build the log filter from a `RUST_LOG` value
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber from `RUST_LOG` and `LOG_FORMAT`
pub fn init_tracing() {
    let format = LogFormat::from_setting(std::env::var("LOG_FORMAT").ok().as_deref());
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Plain => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}
