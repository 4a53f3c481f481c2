use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Initialize tracing to stderr.
///
/// Honors `RUST_LOG`; defaults to `info` for the crate and `warn` for
/// everything else so reqwest internals stay quiet.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,patent_cli=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .init();
}
