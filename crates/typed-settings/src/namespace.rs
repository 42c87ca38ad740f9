//! The external settings namespace overrides are read from.
//!
//! A [`SettingsNamespace`] is a flat `name -> value` store. The host
//! application installs one into a [`NamespaceHandle`] (or the process-wide
//! [`global_namespace`]); override providers only ever read from it.

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use typed_settings_common::Value;

/// Environment variable naming the settings file loaded by [`SettingsNamespace::load`].
pub const SETTINGS_FILE_ENV: &str = "TYPED_SETTINGS_FILE";

/// Settings namespace loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O error when reading a settings file
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension does not name a supported format
    #[error("Unsupported settings file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// A flat, read-only view of externally supplied settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsNamespace {
    entries: BTreeMap<String, Value>,
}

impl SettingsNamespace {
    /// Creates an empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a top-level name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Looks up a top-level name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Whether a top-level name is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of top-level names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the namespace defines nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Overlays `other` on top of `self`; names in `other` win.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Parses a JSON document whose top level is an object.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] if the document is not a JSON object.
    pub fn from_json_str(content: &str) -> Result<Self, LoadError> {
        Ok(Self {
            entries: serde_json::from_str(content)?,
        })
    }

    /// Parses a YAML document whose top level is a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Yaml`] if the document is not a YAML mapping.
    pub fn from_yaml_str(content: &str) -> Result<Self, LoadError> {
        Ok(Self {
            entries: serde_yaml::from_str(content)?,
        })
    }

    /// Parses a TOML document. Datetimes become strings in their TOML form.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Toml`] if the document is not valid TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, LoadError> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(Self {
            entries: table
                .into_iter()
                .map(|(name, value)| (name, from_toml_value(value)))
                .collect(),
        })
    }

    /// Loads a settings file, picking the format from its extension
    /// (`json`, `yaml`/`yml`, `toml`).
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the file cannot be read, has an unknown
    /// extension, or fails to parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> Result<Self, LoadError> = match extension.as_deref() {
            Some("json") => Self::from_json_str,
            Some("yaml" | "yml") => Self::from_yaml_str,
            Some("toml") => Self::from_toml_str,
            _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        };

        let content = std::fs::read_to_string(path)?;
        let namespace = parse(&content)?;
        debug!(path = %path.display(), names = namespace.len(), "loaded settings file");
        Ok(namespace)
    }

    /// Captures every environment variable whose name starts with `prefix`
    /// as a string value.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        let entries: BTreeMap<String, Value> = env::vars()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, value)| (name, Value::Str(value)))
            .collect();
        debug!(prefix, names = entries.len(), "captured settings from environment");
        Self { entries }
    }

    /// Loads the file named by [`SETTINGS_FILE_ENV`], or returns an empty
    /// namespace when the variable is unset.
    ///
    /// # Errors
    ///
    /// Propagates [`SettingsNamespace::from_file`] errors.
    pub fn load() -> Result<Self, LoadError> {
        match env::var(SETTINGS_FILE_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }
}

fn from_toml_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::Str(s),
        toml::Value::Integer(i) => Value::Int(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(from_toml_value).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(key, item)| (key, from_toml_value(item)))
                .collect(),
        ),
    }
}

impl FromIterator<(String, Value)> for SettingsNamespace {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Shared, swappable reference to the current namespace.
///
/// Reads are lock-free snapshots; installing a new namespace does not affect
/// snapshots already taken.
#[derive(Clone)]
pub struct NamespaceHandle {
    current: Arc<ArcSwap<SettingsNamespace>>,
}

impl NamespaceHandle {
    /// Creates a handle holding `namespace`.
    #[must_use]
    pub fn new(namespace: SettingsNamespace) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(namespace)),
        }
    }

    /// Gets the current namespace.
    #[must_use]
    pub fn load(&self) -> Arc<SettingsNamespace> {
        self.current.load_full()
    }

    /// Replaces the namespace atomically.
    pub fn install(&self, namespace: SettingsNamespace) {
        info!(names = namespace.len(), "installing settings namespace");
        self.current.store(Arc::new(namespace));
    }
}

impl Default for NamespaceHandle {
    fn default() -> Self {
        Self::new(SettingsNamespace::default())
    }
}

impl fmt::Debug for NamespaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceHandle")
            .field("names", &self.current.load().len())
            .finish()
    }
}

static GLOBAL_NAMESPACE: Lazy<NamespaceHandle> = Lazy::new(NamespaceHandle::default);

/// The process-wide settings namespace.
#[must_use]
pub fn global_namespace() -> NamespaceHandle {
    GLOBAL_NAMESPACE.clone()
}
