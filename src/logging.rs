use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `GCONTRIB_LOG` overrides the level.
pub fn init(verbose: bool) {
    let default = if verbose { "gcontrib=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GCONTRIB_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}
