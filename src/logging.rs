//! Tracing setup for embedders and tests

use crate::config::MonitoringConfig;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber. `RUST_LOG` wins over the configured level.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(config: &MonitoringConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("guess_game={}", config.log_level.as_str())));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = MonitoringConfig::default();
        init_tracing(&config);
        init_tracing(&config);
        tracing::info!("tracing initialised twice without panicking");
    }
}
