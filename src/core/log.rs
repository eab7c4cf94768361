use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. `verbose` turns on debug output for this
/// crate and keeps other crates at warn; otherwise `RUST_LOG` alone decides.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "off" };
    let app_filter = verbose.then(|| {
        Targets::new()
            .with_target("wealthtree", LevelFilter::DEBUG)
            .with_default(LevelFilter::WARN)
    });
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_filter)
        .with(env_filter)
        .init();
}
