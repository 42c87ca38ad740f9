//! Schema definitions: declared members, their defaults and type hints.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use typed_settings_common::Value;

/// Declared type of a setting.
///
/// Only the module and class forms change resolution; every other hint is
/// carried for introspection and passes values through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    /// `types.ModuleType`: a string value is imported as a module.
    Module,
    /// Bare built-in `type` or `type[...]`: a string value is imported as a class.
    Type(Option<String>),
    /// Generic `typing.Type[...]`: a string value is imported as a class.
    GenericType(Option<String>),
    /// Any other annotation.
    Named(String),
}

impl TypeHint {
    /// A hint that triggers no coercion.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Whether string values should be imported as modules.
    #[must_use]
    pub const fn is_module(&self) -> bool {
        matches!(self, Self::Module)
    }

    /// Whether string values should be imported as classes.
    #[must_use]
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Type(_) | Self::GenericType(_))
    }
}

fn generic_argument<'a>(spelling: &'a str, origin: &str) -> Option<&'a str> {
    spelling
        .strip_prefix(origin)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .map(str::trim)
}

impl FromStr for TypeHint {
    type Err = Infallible;

    /// Parses an annotation spelling such as `types.ModuleType`, `type[Base]`
    /// or `Type[Sequence[Any]]`.
    fn from_str(spelling: &str) -> Result<Self, Self::Err> {
        let spelling = spelling.trim();
        Ok(match spelling {
            "types.ModuleType" | "ModuleType" => Self::Module,
            "type" => Self::Type(None),
            "Type" | "typing.Type" => Self::GenericType(None),
            _ => {
                if let Some(arg) = generic_argument(spelling, "type") {
                    Self::Type(Some(arg.to_string()))
                } else if let Some(arg) = generic_argument(spelling, "typing.Type")
                    .or_else(|| generic_argument(spelling, "Type"))
                {
                    Self::GenericType(Some(arg.to_string()))
                } else {
                    Self::Named(spelling.to_string())
                }
            }
        })
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module => f.write_str("types.ModuleType"),
            Self::Type(None) => f.write_str("type"),
            Self::Type(Some(arg)) => write!(f, "type[{arg}]"),
            Self::GenericType(None) => f.write_str("typing.Type"),
            Self::GenericType(Some(arg)) => write!(f, "typing.Type[{arg}]"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// A declared schema member and its default.
#[derive(Debug, Clone)]
pub struct Member {
    name: String,
    default: Value,
}

impl Member {
    /// Member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared default.
    #[must_use]
    pub const fn default_value(&self) -> &Value {
        &self.default
    }
}

/// Describes a settings schema before it is decorated.
///
/// Members keep declaration order; redeclaring a name replaces its default
/// in place. Type hints are tracked separately and belong to this schema
/// only: [`SchemaBuilder::extend`] inherits members but not hints.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    members: Vec<Member>,
    hints: BTreeMap<String, TypeHint>,
}

impl SchemaBuilder {
    /// Starts an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            hints: BTreeMap::new(),
        }
    }

    /// Declares a member without a type hint.
    #[must_use]
    pub fn member(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.declare(name, default.into());
        self
    }

    /// Declares a member with a type hint.
    #[must_use]
    pub fn typed(mut self, name: &str, hint: TypeHint, default: impl Into<Value>) -> Self {
        self.declare(name, default.into());
        self.hints.insert(name.to_string(), hint);
        self
    }

    /// Records a type hint without declaring a member.
    ///
    /// A hint alone does not create a setting; it applies if a member of that
    /// name is declared or inherited.
    #[must_use]
    pub fn annotate(mut self, name: &str, hint: TypeHint) -> Self {
        self.hints.insert(name.to_string(), hint);
        self
    }

    /// Inherits every member of `parent` this schema does not declare itself.
    #[must_use]
    pub fn extend(mut self, parent: &Self) -> Self {
        for member in &parent.members {
            if self.position(&member.name).is_none() {
                self.members.push(member.clone());
            }
        }
        self
    }

    /// Schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared and inherited members, in order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// This schema's own type hint for `name`.
    #[must_use]
    pub fn hint(&self, name: &str) -> Option<&TypeHint> {
        self.hints.get(name)
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Member>, BTreeMap<String, TypeHint>) {
        (self.name, self.members, self.hints)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|member| member.name == name)
    }

    fn declare(&mut self, name: &str, mut default: Value) {
        if let Value::Undefined(marker) = &mut default {
            marker.bind(name);
        }
        let member = Member {
            name: name.to_string(),
            default,
        };
        match self.position(name) {
            Some(index) => self.members[index] = member,
            None => self.members.push(member),
        }
    }
}
