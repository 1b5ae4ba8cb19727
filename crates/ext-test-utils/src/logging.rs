//! Tracing subscriber installation for test binaries.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a tracing subscriber for the current test process.
///
/// Uses the `RUST_LOG` environment variable for filtering, defaulting to
/// "info" when unset. Output goes through the test writer so it is captured
/// per test. Only the first call in a process has any effect.
pub fn init() {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(true).with_test_writer().compact();

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
