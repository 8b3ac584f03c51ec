//! Subscriber setup for embedding applications

use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    fmt::{self, format::FmtSpan},
    prelude::*,
};

use crate::infrastructure::{InfraError, InfraResult};

/// Installs a stderr fmt subscriber filtered at `level`.
///
/// Returns an error if `level` does not parse or a global subscriber is
/// already installed.
pub fn init_logging(level: &str) -> InfraResult<()> {
    let filter: LevelFilter = level.parse().map_err(|_| InfraError::Config {
        message: format!("invalid log level '{level}'"),
    })?;

    // Noisy dependency targets
    let noisy_modules = ["config::"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry()
        .with(filtered_layer)
        .try_init()
        .map_err(|e| InfraError::Config {
            message: format!("install subscriber: {e}"),
        })?;

    match filter {
        LevelFilter::INFO => tracing::info!("log level: info"),
        LevelFilter::DEBUG => tracing::debug!("log level: debug"),
        LevelFilter::TRACE => tracing::debug!("log level: trace"),
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_unknown_level_when_init_then_config_error() {
        let err = init_logging("chatty").unwrap_err();
        assert!(matches!(err, InfraError::Config { .. }));
    }
}
