//! # Typed Settings
//!
//! Typed, lazily-resolved application settings layered over an external
//! settings namespace.
//!
//! A schema declares settings with defaults and optional type hints. A
//! decorator binds the schema to an override provider; every instance then
//! resolves each setting once, on first read, preferring the override,
//! coercing dotted paths into modules or classes where the hint asks for it,
//! and refusing to hand out the [`undefined`] marker.
//!
//! ```
//! use typed_settings::{
//!     undefined, with_prefix_in, NamespaceHandle, SchemaBuilder, SettingsNamespace, TypeHint,
//! };
//!
//! let namespace = NamespaceHandle::new(
//!     SettingsNamespace::new().with("MYAPP_SOME_STRING", "some string override"),
//! );
//!
//! let settings = with_prefix_in(&namespace, "MYAPP")?
//!     .decorate(
//!         SchemaBuilder::new("MyAppSettings")
//!             .typed("SOME_STRING", TypeHint::named("str"), "some string")
//!             .typed("API_KEY", TypeHint::named("str"), undefined()),
//!     )
//!     .instance();
//!
//! assert_eq!(settings.get_str("SOME_STRING")?, "some string override");
//! assert!(settings.get("API_KEY").is_err());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod decorator;
pub mod importer;
pub mod namespace;
pub mod provider;
pub mod schema;
pub mod settings;

pub use decorator::*;
pub use importer::*;
pub use namespace::*;
pub use provider::*;
pub use schema::*;
pub use settings::*;

pub use typed_settings_common::{
    undefined, Class, ClassRef, FromValue, ImportError, Module, ModuleRef, Result, SettingsError,
    Undefined, Value,
};
