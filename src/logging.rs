use tracing_subscriber::EnvFilter;

/// Default directive used when the environment variable is unset or invalid.
const DEFAULT_DIRECTIVE: &str = "info";

/// Initializes `tracing` logging with options from the environment variable
/// given in the `env` parameter, e.g. `CSRGEN_LOG=debug`.
pub fn initialize_logging(env: &str) {
    let filter =
        EnvFilter::try_from_env(env).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
