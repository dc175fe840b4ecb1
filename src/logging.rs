//! Diagnostics logging setup for the command-line binary

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes diagnostics logging on stderr.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at info, or debug
/// when `verbose` is set. The report itself stays on stdout. Call once at
/// startup; a second global subscriber panics.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "segmentforge=debug"
    } else {
        "segmentforge=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
