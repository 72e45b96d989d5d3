//! Tracing subscriber bootstrap for applications embedding the client

use qcportal_domain::{PortalError, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,qcportal_infra=info,qcportal_core=info";

/// Install a global fmt subscriber writing to stderr
///
/// `filter` takes `RUST_LOG` syntax. Without one, `RUST_LOG` is read and
/// the client crates log at `info` when it is unset.
///
/// # Errors
/// `PortalError::Config` when the filter does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| PortalError::Config(format!("invalid log filter '{directives}': {e}")))?,
        None => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
    };

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true).compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| PortalError::Config(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_rejected() {
        assert!(matches!(init_tracing(Some("qcportal_infra=loud")), Err(PortalError::Config(_))));
    }

    #[test]
    fn second_install_is_an_error_not_a_panic() {
        // The first call may lose to another test; the second always finds one installed.
        let _ = init_tracing(Some("debug"));
        assert!(matches!(init_tracing(Some("debug")), Err(PortalError::Config(_))));
    }
}
