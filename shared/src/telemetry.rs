use tracing_subscriber::EnvFilter;

/// Console logging on stderr, so stdout stays clean for document output.
/// `RUST_LOG` wins over the level the CLI passed in.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
