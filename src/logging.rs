//! Tracing subscriber setup for the CLI.
//!
//! Logs go to stderr so stdout stays clean for results and JSON.
//! `RUST_LOG` wins over the verbosity flag when set.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for a `-v` count.
pub fn filter_for(verbose: u8, debug: bool) -> &'static str {
    match (verbose, debug) {
        (0, false) => "labelseek=warn",
        (0, true) => "labelseek=info",
        (1, _) => "labelseek=debug",
        _ => "labelseek=trace,ort=info",
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: u8, debug: bool) {
    let filter = filter_for(verbose, debug);

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose >= 1)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
