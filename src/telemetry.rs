use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the `GYM_LOG` environment variable.
///
/// Defaults to "info" level if `GYM_LOG` is not set. Fails if a global subscriber is
/// already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn test_init_tracing_once() {
        assert_that!(init_tracing()).is_ok();
        // A second subscriber cannot be installed
        assert_that!(init_tracing()).is_err();
    }
}
