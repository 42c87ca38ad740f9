//! Override providers: where a setting's externally supplied value comes from.

use crate::namespace::NamespaceHandle;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};
use typed_settings_common::{prefixed_name, Result, SettingsError, Value, PREFIX_SEPARATOR};

/// The provider has no override for the requested key.
///
/// Only exchanged between a provider and the resolution engine; a missing
/// override makes the engine fall back to the declared default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("setting not found")]
pub struct SettingNotFound;

/// Looks up the override for one configuration key.
#[cfg_attr(test, mockall::automock)]
pub trait OverrideProvider: Send + Sync {
    /// Returns the override for `key`, or [`SettingNotFound`].
    ///
    /// A returned [`Value::Null`] is a legitimate override, not "not found".
    ///
    /// # Errors
    ///
    /// Returns [`SettingNotFound`] when no override is defined.
    fn try_get_override(&self, key: &str) -> std::result::Result<Value, SettingNotFound>;
}

/// Looks up `{PREFIX}_{KEY}` as a top-level name in the namespace.
///
/// The namespace is read at lookup time, so overrides installed after
/// decoration are still seen by settings that have not resolved yet.
#[derive(Debug, Clone)]
pub struct PrefixProvider {
    namespace: NamespaceHandle,
    prefix: String,
}

impl PrefixProvider {
    /// Creates a prefix provider.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ImproperlyConfigured`] if `prefix` is empty
    /// or ends with the `_` separator.
    pub fn new(namespace: NamespaceHandle, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(SettingsError::improperly_configured(
                "'prefix' must not be empty",
            ));
        }
        if prefix.ends_with(PREFIX_SEPARATOR) {
            return Err(SettingsError::improperly_configured(format!(
                "'prefix' must not end with '{PREFIX_SEPARATOR}' (got '{prefix}')"
            )));
        }
        Ok(Self { namespace, prefix })
    }

    /// The configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl OverrideProvider for PrefixProvider {
    fn try_get_override(&self, key: &str) -> std::result::Result<Value, SettingNotFound> {
        let name = prefixed_name(&self.prefix, key);
        self.namespace.load().get(&name).cloned().ok_or(SettingNotFound)
    }
}

/// Looks up `KEY` inside one named mapping of the namespace.
///
/// The mapping is fetched once, when the provider is created. A missing
/// mapping behaves like an empty one.
#[derive(Debug, Clone)]
pub struct DictProvider {
    settings_attr: String,
    mapping: Option<BTreeMap<String, Value>>,
}

impl DictProvider {
    /// Creates a provider over the mapping named `settings_attr`.
    pub fn new(namespace: &NamespaceHandle, settings_attr: impl Into<String>) -> Self {
        let settings_attr = settings_attr.into();
        let mapping = match namespace.load().get(&settings_attr) {
            Some(Value::Map(map)) => Some(map.clone()),
            Some(other) => {
                warn!(
                    settings_attr = %settings_attr,
                    kind = other.kind(),
                    "settings attribute is not a mapping, ignoring it"
                );
                None
            }
            None => {
                debug!(settings_attr = %settings_attr, "settings attribute absent");
                None
            }
        };
        Self {
            settings_attr,
            mapping,
        }
    }

    /// Name of the mapping in the namespace.
    #[must_use]
    pub fn settings_attr(&self) -> &str {
        &self.settings_attr
    }
}

impl OverrideProvider for DictProvider {
    fn try_get_override(&self, key: &str) -> std::result::Result<Value, SettingNotFound> {
        self.mapping
            .as_ref()
            .and_then(|map| map.get(key))
            .cloned()
            .ok_or(SettingNotFound)
    }
}
