use tracing::level_filters::LevelFilter;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

pub fn init_tracing(level: Level) -> Result<(), SetGlobalDefaultError> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::ACTIVE)
        .pretty();
    let subscriber = Registry::default()
        .with(stdout_log)
        .with(LevelFilter::from_level(level));

    tracing::subscriber::set_global_default(subscriber)
}
