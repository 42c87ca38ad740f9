//! Decoration entry points binding a schema to an override provider.

use crate::importer::{global_importer, Importer};
use crate::namespace::{global_namespace, NamespaceHandle};
use crate::provider::{DictProvider, OverrideProvider, PrefixProvider};
use crate::schema::SchemaBuilder;
use crate::settings::TypedSettings;
use std::fmt;
use std::sync::Arc;
use typed_settings_common::Result;

/// Turns a [`SchemaBuilder`] into [`TypedSettings`] bound to one provider.
#[derive(Clone)]
pub struct Decorator {
    provider: Arc<dyn OverrideProvider>,
    importer: Arc<dyn Importer>,
}

impl Decorator {
    /// Creates a decorator over any provider, importing through the
    /// process-wide importer.
    pub fn new(provider: impl OverrideProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
            importer: Arc::new(global_importer()),
        }
    }

    /// Uses `importer` for module and class coercion instead of the global one.
    #[must_use]
    pub fn with_importer(mut self, importer: impl Importer + 'static) -> Self {
        self.importer = Arc::new(importer);
        self
    }

    /// Decorates a schema.
    #[must_use]
    pub fn decorate(&self, schema: SchemaBuilder) -> TypedSettings {
        TypedSettings::decorate(schema, Arc::clone(&self.provider), Arc::clone(&self.importer))
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator").finish_non_exhaustive()
    }
}

/// Settings overridden by `{PREFIX}_{KEY}` names in the global namespace.
///
/// # Errors
///
/// Fails immediately with [`SettingsError::ImproperlyConfigured`] if
/// `prefix` is empty or ends with `_`.
///
/// [`SettingsError::ImproperlyConfigured`]: typed_settings_common::SettingsError::ImproperlyConfigured
pub fn with_prefix(prefix: &str) -> Result<Decorator> {
    with_prefix_in(&global_namespace(), prefix)
}

/// Like [`with_prefix`], reading from an explicit namespace.
///
/// # Errors
///
/// See [`with_prefix`].
pub fn with_prefix_in(namespace: &NamespaceHandle, prefix: &str) -> Result<Decorator> {
    Ok(Decorator::new(PrefixProvider::new(namespace.clone(), prefix)?))
}

/// Settings overridden by keys of the mapping named `settings_attr` in the
/// global namespace. The mapping is fetched now; its absence is tolerated.
#[must_use]
pub fn with_namespace_key(settings_attr: &str) -> Decorator {
    with_namespace_key_in(&global_namespace(), settings_attr)
}

/// Like [`with_namespace_key`], reading from an explicit namespace.
#[must_use]
pub fn with_namespace_key_in(namespace: &NamespaceHandle, settings_attr: &str) -> Decorator {
    Decorator::new(DictProvider::new(namespace, settings_attr))
}
