//! Dotted-path import mechanism used by module and class coercion.

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use typed_settings_common::{ClassRef, ImportError, Module, ModuleRef, Value};

/// Resolves dotted paths into live modules and classes.
pub trait Importer: Send + Sync {
    /// Imports the module registered under `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError`] if no such module exists.
    fn import_module(&self, path: &str) -> Result<ModuleRef, ImportError>;

    /// Imports a class from a `module.path.ClassName` path: the module part
    /// is imported, then the class attribute fetched from it.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError`] if the module cannot be imported or has no
    /// such attribute.
    fn import_class(&self, path: &str) -> Result<ClassRef, ImportError> {
        let (module_path, class_name) = path.rsplit_once('.').unwrap_or(("", path));
        let module = self.import_module(module_path)?;
        module
            .class(class_name)
            .cloned()
            .ok_or_else(|| ImportError::MissingAttribute {
                module: module_path.to_string(),
                attribute: class_name.to_string(),
            })
    }
}

/// An importer backed by a fixed table of registered modules.
///
/// Every import of the same path yields the same [`ModuleRef`], so resolved
/// modules and classes compare equal by identity.
#[derive(Debug, Clone, Default)]
pub struct ImportRegistry {
    modules: BTreeMap<String, ModuleRef>,
}

impl ImportRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with a small set of standard modules: `os`,
    /// `os.path`, `pathlib`, `collections` and `builtins`.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new()
            .with_module(Module::new("os").with_class::<PathBuf>("PathLike"))
            .with_module(Module::new("os.path"))
            .with_module(Module::new("pathlib").with_class::<PathBuf>("Path"))
            .with_module(
                Module::new("collections")
                    .with_class::<VecDeque<Value>>("deque")
                    .with_class::<BTreeMap<String, Value>>("OrderedDict"),
            )
            .with_module(
                Module::new("builtins")
                    .with_class::<i64>("int")
                    .with_class::<f64>("float")
                    .with_class::<bool>("bool")
                    .with_class::<String>("str")
                    .with_class::<Vec<Value>>("list")
                    .with_class::<BTreeMap<String, Value>>("dict"),
            )
    }

    /// Registers (or replaces) a module under its own path.
    #[must_use]
    pub fn with_module(mut self, module: Module) -> Self {
        self.register(module);
        self
    }

    /// Registers (or replaces) a module under its own path and returns its handle.
    pub fn register(&mut self, module: Module) -> ModuleRef {
        let module = ModuleRef::from(module);
        debug!(module = module.path(), "registered module");
        self.modules.insert(module.path().to_string(), module.clone());
        module
    }

    /// Registered module paths, sorted.
    pub fn module_paths(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

impl Importer for ImportRegistry {
    fn import_module(&self, path: &str) -> Result<ModuleRef, ImportError> {
        if path.is_empty() {
            return Err(ImportError::EmptyModulePath);
        }
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| ImportError::ModuleNotFound(path.to_string()))
    }
}

static GLOBAL_IMPORTER: Lazy<ArcSwap<ImportRegistry>> =
    Lazy::new(|| ArcSwap::from_pointee(ImportRegistry::with_builtins()));

/// Replaces the process-wide import registry.
pub fn install_importer(registry: ImportRegistry) {
    info!(modules = registry.modules.len(), "installing import registry");
    GLOBAL_IMPORTER.store(Arc::new(registry));
}

/// Importer delegating to the process-wide registry current at import time.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalImporter;

/// The process-wide importer.
#[must_use]
pub const fn global_importer() -> GlobalImporter {
    GlobalImporter
}

impl Importer for GlobalImporter {
    fn import_module(&self, path: &str) -> Result<ModuleRef, ImportError> {
        GLOBAL_IMPORTER.load().import_module(path)
    }
}
