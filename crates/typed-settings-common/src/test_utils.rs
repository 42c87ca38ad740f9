//! Test utilities and shared test helpers for the typed-settings workspace.
//!
//! Logging setup, assertion helpers and proptest strategies used by the unit
//! and integration tests of every crate in the workspace.

use crate::error::{Result, SettingsError};
use std::sync::Once;

#[cfg(feature = "tracing-subscriber")]
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
#[cfg(feature = "tracing-subscriber")]
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// No-op version when tracing-subscriber is not available
#[cfg(not(feature = "tracing-subscriber"))]
pub fn init_test_logging() {
    INIT.call_once(|| {});
}

/// Assert that a read failed because `key` is not configured.
#[track_caller]
pub fn assert_not_configured<T: std::fmt::Debug>(result: Result<T>, key: &str) {
    match result {
        Err(SettingsError::ImproperlyConfigured(message)) => assert!(
            message.contains(key),
            "error message `{message}` does not name `{key}`"
        ),
        other => panic!("expected `{key}` to be improperly configured, got {other:?}"),
    }
}

/// Assert that a write was rejected for `key`.
#[track_caller]
pub fn assert_write_rejected<T: std::fmt::Debug>(result: Result<T>, key: &str) {
    match result {
        Err(SettingsError::WriteRejected { attribute }) => assert_eq!(attribute, key),
        other => panic!("expected write to `{key}` to be rejected, got {other:?}"),
    }
}

/// Proptest strategies for schema member names.
#[cfg(feature = "proptest")]
pub mod strategies {
    use proptest::prelude::*;

    /// Names that qualify as configuration keys.
    pub fn config_key() -> impl Strategy<Value = String> {
        "[A-Z][A-Z0-9_]{0,15}[A-Z0-9]".prop_map(String::from)
    }

    /// Names containing at least one lowercase letter.
    pub fn plain_member() -> impl Strategy<Value = String> {
        "[A-Za-z_]{0,8}[a-z][A-Za-z0-9_]{0,8}".prop_map(String::from)
    }
}
