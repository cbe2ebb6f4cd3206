//! Tracing subscriber setup for applications embedding the client.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the application, which may call [`init_tracing`] once at
//! startup.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Install a global subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`, which defaults to `info`.
/// Directives such as `docrepo_client=debug,info` are accepted. Fails if a
/// global subscriber is already installed.
pub fn init_tracing(log_level: Option<&str>, json_output: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))?;

    let subscriber = Registry::default().with(env_filter);

    if json_output {
        let json_layer = fmt::layer().json().with_current_span(true).with_span_list(true);
        tracing::subscriber::set_global_default(subscriber.with(json_layer))?;
    } else {
        let fmt_layer = fmt::layer().with_target(true).with_level(true);
        tracing::subscriber::set_global_default(subscriber.with(fmt_layer))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_initialization_fails() {
        let _ = init_tracing(Some("debug"), false);
        tracing::debug!("tracing initialized");
        assert!(init_tracing(Some("debug"), true).is_err());
    }
}
