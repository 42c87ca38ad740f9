//! Error taxonomy shared by the settings engine and its collaborators.

/// Common result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors surfaced to code reading typed settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// A mandatory setting was left unset, a sentinel was misused, or a
    /// decorator was given malformed arguments.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// An attempt was made to assign a settings attribute.
    #[error("Can't set attribute '{attribute}'")]
    WriteRejected {
        /// Name of the attribute the caller tried to assign.
        attribute: String,
    },

    /// The schema has no member with this name.
    #[error("Settings have no attribute '{attribute}'")]
    UnknownAttribute {
        /// Name that was looked up.
        attribute: String,
    },

    /// A typed accessor found a value of a different kind.
    #[error("Setting '{attribute}' holds a {found} value, expected {expected}")]
    TypeMismatch {
        /// Setting that was read.
        attribute: String,
        /// Kind the accessor asked for.
        expected: &'static str,
        /// Kind the setting resolved to.
        found: &'static str,
    },

    /// Import failure, propagated unchanged from the import mechanism.
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl SettingsError {
    /// Creates an [`SettingsError::ImproperlyConfigured`] error.
    pub fn improperly_configured(message: impl Into<String>) -> Self {
        Self::ImproperlyConfigured(message.into())
    }

    /// Returns true for [`SettingsError::ImproperlyConfigured`].
    #[must_use]
    pub const fn is_improperly_configured(&self) -> bool {
        matches!(self, Self::ImproperlyConfigured(_))
    }
}

/// Failures of the dotted-path import mechanism.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The dotted path had no module component.
    #[error("Empty module name")]
    EmptyModulePath,

    /// No module is registered under this path.
    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    /// The module exists but has no such attribute.
    #[error("module '{module}' has no attribute '{attribute}'")]
    MissingAttribute {
        /// Module that was imported.
        module: String,
        /// Attribute that was missing.
        attribute: String,
    },
}
