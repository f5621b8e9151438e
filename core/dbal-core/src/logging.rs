//! 로깅 - tracing subscriber 설치
//!
//! Library code only emits `tracing` events; installing a subscriber is left to the
//! application. Compiler and cache events use their own targets so they can be
//! filtered separately (`RUST_LOG=dbal::cache=debug`).

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt};

/// Target for rendered-SQL traces from the query compiler.
pub const COMPILE_TARGET: &str = "dbal::compile";

/// Target for cache freshness, materialization and sort-index events.
pub const CACHE_TARGET: &str = "dbal::cache";

/// Filter directive enabling this crate's events at `level`, everything else at `warn`.
pub fn directive(level: &str) -> String {
    format!("warn,dbal_core={level},{COMPILE_TARGET}={level},{CACHE_TARGET}={level}")
}

/// Install a subscriber at `info`, or whatever `RUST_LOG` says.
///
/// ```rust
/// dbal_core::logging::init();
/// ```
#[cfg(feature = "logging")]
pub fn init() {
    init_with_level("info")
}

/// Install a subscriber for this crate's events at `level` (`RUST_LOG` wins when set).
#[cfg(feature = "logging")]
pub fn init_with_level(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

/// Subscriber for `cargo test`: debug level, captured per test, no timestamps.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(directive("debug")))
        .with_test_writer()
        .without_time()
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init() {}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(_level: &str) {}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_covers_crate_targets() {
        let d = directive("trace");
        assert!(d.starts_with("warn,"));
        assert!(d.contains("dbal::compile=trace"));
        assert!(d.contains("dbal::cache=trace"));
    }

    #[test]
    fn test_init_test_is_repeatable() {
        init_test();
        init_test();
    }
}
