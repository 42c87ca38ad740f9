//! Decorated schemas and their lazily-resolved instances.

use crate::importer::Importer;
use crate::provider::{OverrideProvider, SettingNotFound};
use crate::schema::{SchemaBuilder, TypeHint};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use typed_settings_common::{
    is_config_key, ClassRef, FromValue, ModuleRef, Result, SettingsError, Value,
};

/// One configuration key of a decorated schema.
#[derive(Debug)]
struct KeySpec {
    name: String,
    default: Value,
    hint: Option<TypeHint>,
}

/// Schema metadata shared read-only by every instance.
struct SchemaInner {
    name: String,
    keys: Vec<KeySpec>,
    index: HashMap<String, usize>,
    plain: BTreeMap<String, Value>,
    provider: Arc<dyn OverrideProvider>,
    importer: Arc<dyn Importer>,
}

impl SchemaInner {
    fn resolve(&self, spec: &KeySpec) -> Result<Value> {
        let candidate = match self.provider.try_get_override(&spec.name) {
            Ok(value) => {
                debug!(schema = %self.name, key = %spec.name, "using override");
                value
            }
            Err(SettingNotFound) => spec.default.clone(),
        };

        if candidate.is_undefined() {
            return Err(SettingsError::improperly_configured(format!(
                "'{}' needs to be configured in your settings module",
                spec.name
            )));
        }

        let value = match (&spec.hint, candidate) {
            (Some(hint), Value::Str(path)) if hint.is_module() => {
                Value::Module(self.importer.import_module(&path)?)
            }
            (Some(hint), Value::Str(path)) if hint.is_class() => {
                Value::Class(self.importer.import_class(&path)?)
            }
            (_, value) => value,
        };

        debug!(schema = %self.name, key = %spec.name, kind = value.kind(), "resolved setting");
        Ok(value)
    }
}

/// A decorated schema: configuration keys bound to an override provider.
///
/// Cheap to clone; clones share the schema. Create per-use settings objects
/// with [`TypedSettings::instance`].
#[derive(Clone)]
pub struct TypedSettings {
    inner: Arc<SchemaInner>,
}

impl TypedSettings {
    pub(crate) fn decorate(
        schema: SchemaBuilder,
        provider: Arc<dyn OverrideProvider>,
        importer: Arc<dyn Importer>,
    ) -> Self {
        let (name, members, hints) = schema.into_parts();

        let mut keys = Vec::new();
        let mut index = HashMap::new();
        let mut plain = BTreeMap::new();
        for member in members {
            let member_name = member.name().to_string();
            let default = member.default_value().clone();
            if is_config_key(&member_name) {
                index.insert(member_name.clone(), keys.len());
                keys.push(KeySpec {
                    hint: hints.get(&member_name).cloned(),
                    name: member_name,
                    default,
                });
            } else {
                plain.insert(member_name, default);
            }
        }

        debug!(schema = %name, keys = keys.len(), plain = plain.len(), "decorated settings schema");
        Self {
            inner: Arc::new(SchemaInner {
                name,
                keys,
                index,
                plain,
                provider,
                importer,
            }),
        }
    }

    /// Creates an instance with every key unresolved.
    #[must_use]
    pub fn instance(&self) -> Settings {
        Settings {
            schema: Arc::clone(&self.inner),
            resolved: self.inner.keys.iter().map(|_| OnceCell::new()).collect(),
        }
    }

    /// Schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Configuration keys, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys.iter().map(|spec| spec.name.as_str())
    }

    /// Whether `name` is a configuration key of this schema.
    #[must_use]
    pub fn has_key(&self, name: &str) -> bool {
        self.inner.index.contains_key(name)
    }

    /// The type hint declared for `key`, if any.
    #[must_use]
    pub fn type_hint(&self, key: &str) -> Option<&TypeHint> {
        let &idx = self.inner.index.get(key)?;
        self.inner.keys[idx].hint.as_ref()
    }
}

impl fmt::Debug for TypedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSettings")
            .field("name", &self.inner.name)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// An instance of a decorated schema.
///
/// Each key resolves at most once, on first read, and the result is cached
/// for the lifetime of the instance. Nothing can be assigned.
pub struct Settings {
    schema: Arc<SchemaInner>,
    resolved: Box<[OnceCell<Value>]>,
}

impl Settings {
    /// Reads a configuration key, resolving it on first access.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::UnknownAttribute`] if `key` is not a configuration key;
    /// - [`SettingsError::ImproperlyConfigured`] if the key defaults to the
    ///   undefined marker and has no override;
    /// - [`SettingsError::Import`] if module or class coercion fails.
    pub fn get(&self, key: &str) -> Result<Value> {
        let idx = *self
            .schema
            .index
            .get(key)
            .ok_or_else(|| SettingsError::UnknownAttribute {
                attribute: key.to_string(),
            })?;

        let slot = &self.resolved[idx];
        if let Some(value) = slot.get() {
            trace!(schema = %self.schema.name, key, "cache hit");
            return Ok(value.clone());
        }

        let spec = &self.schema.keys[idx];
        slot.get_or_try_init(|| self.schema.resolve(spec)).cloned()
    }

    /// Reads any member: configuration keys resolve as in [`Settings::get`],
    /// plain members return their declared value unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::get`].
    pub fn attr(&self, name: &str) -> Result<Value> {
        match self.schema.plain.get(name) {
            Some(value) => Ok(value.clone()),
            None => self.get(name),
        }
    }

    /// Reads a key and converts it to `T`.
    ///
    /// # Errors
    ///
    /// Any error of [`Settings::get`], or [`SettingsError::TypeMismatch`]
    /// if the resolved value is not a `T`.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<T> {
        T::from_value(self.get(key)?).map_err(|value| SettingsError::TypeMismatch {
            attribute: key.to_string(),
            expected: T::EXPECTED,
            found: value.kind(),
        })
    }

    /// Reads a string key.
    ///
    /// # Errors
    ///
    /// See [`Settings::get_as`].
    pub fn get_str(&self, key: &str) -> Result<String> {
        self.get_as(key)
    }

    /// Reads a boolean key.
    ///
    /// # Errors
    ///
    /// See [`Settings::get_as`].
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get_as(key)
    }

    /// Reads an integer key.
    ///
    /// # Errors
    ///
    /// See [`Settings::get_as`].
    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.get_as(key)
    }

    /// Reads a float key; integers are widened.
    ///
    /// # Errors
    ///
    /// See [`Settings::get_as`].
    pub fn get_float(&self, key: &str) -> Result<f64> {
        self.get_as(key)
    }

    /// Reads a module key.
    ///
    /// # Errors
    ///
    /// See [`Settings::get_as`].
    pub fn get_module(&self, key: &str) -> Result<ModuleRef> {
        self.get_as(key)
    }

    /// Reads a class key.
    ///
    /// # Errors
    ///
    /// See [`Settings::get_as`].
    pub fn get_class(&self, key: &str) -> Result<ClassRef> {
        self.get_as(key)
    }

    /// Attribute assignment. Settings are read-only, so this always fails.
    ///
    /// # Errors
    ///
    /// Always returns [`SettingsError::WriteRejected`] naming `name`.
    pub fn set(&self, name: &str, _value: impl Into<Value>) -> Result<()> {
        Err(SettingsError::WriteRejected {
            attribute: name.to_string(),
        })
    }

    /// Whether `key` has already been resolved on this instance.
    #[must_use]
    pub fn is_resolved(&self, key: &str) -> bool {
        self.schema
            .index
            .get(key)
            .is_some_and(|&idx| self.resolved[idx].get().is_some())
    }

    /// Schema name.
    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.schema.name
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (spec, slot) in self.schema.keys.iter().zip(self.resolved.iter()) {
            match slot.get() {
                Some(value) => {
                    map.entry(&spec.name, value);
                }
                None => {
                    map.entry(&spec.name, &format_args!("<unresolved>"));
                }
            }
        }
        map.finish()
    }
}
