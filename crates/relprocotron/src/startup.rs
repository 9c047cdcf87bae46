//! Process-wide initialisation: logging and build metadata.
//!
//! Called once from `main`; nothing in the core threads these through.

use tracing_subscriber::EnvFilter;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `name version`, as shown in the startup log line.
pub fn version_string() -> String {
    format!("{NAME} {VERSION}")
}

/// Filter directive: explicit level first, then `RUST_LOG`, then `info`.
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    }
}

/// Install the global tracing subscriber. Logs go to stderr so stdout
/// carries only previews and generated documents.
pub fn init_tracing(level: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_has_name_and_version() {
        assert_eq!(version_string(), format!("relprocotron {VERSION}"));
    }

    #[test]
    fn explicit_level_wins() {
        assert!(env_filter(Some("debug")).to_string().contains("debug"));
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing(Some("warn"));
        init_tracing(Some("warn"));
    }
}
