//! Log subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the CLI verbosity flags.
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install a stderr subscriber. `RUST_LOG` wins over the flags.
///
/// Calling twice is harmless; the second install is ignored.
pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tonetwist={}", level_for(verbose, quiet))));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 0)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Log subscriber already installed");
    }
}
