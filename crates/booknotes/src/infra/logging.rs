//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber; call once at startup. `RUST_LOG` wins over the verbosity flag.
///
/// Output goes to stderr so rendered Markdown on stdout stays pipeable.
pub fn init(verbose: bool) {
    let fallback = if verbose { "booknotes=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
