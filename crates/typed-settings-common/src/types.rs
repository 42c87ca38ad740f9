//! Dynamic setting values, the undefined sentinel, and import handles.

use crate::error::{Result, SettingsError};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Marker default meaning "no usable default exists; an override is mandatory".
///
/// The marker learns the name of the setting it is declared for when the
/// member is added to a schema. It is never a usable value: asking for its
/// truthiness, its string form or comparing it yields
/// [`SettingsError::ImproperlyConfigured`].
#[derive(Clone, Default)]
pub struct Undefined {
    name: Option<Arc<str>>,
}

impl Undefined {
    /// Creates an unbound marker.
    #[must_use]
    pub const fn new() -> Self {
        Self { name: None }
    }

    /// Binds the marker to the setting it is the default of.
    pub fn bind(&mut self, name: &str) {
        self.name = Some(Arc::from(name));
    }

    /// Name of the owning setting, if bound.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The error raised whenever the marker is used as data.
    #[must_use]
    pub fn misuse(&self) -> SettingsError {
        SettingsError::improperly_configured(format!(
            "The attribute {} is not configured",
            self.name().unwrap_or("<unbound>")
        ))
    }
}

impl fmt::Debug for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<Undefined: {name}>"),
            None => f.write_str("<Undefined>"),
        }
    }
}

/// Creates a fresh "must be configured" marker to use as a setting default.
#[must_use]
pub const fn undefined() -> Value {
    Value::Undefined(Undefined::new())
}

/// A class (type) object that can be resolved from a dotted path.
#[derive(Debug)]
pub struct Class {
    module: String,
    name: String,
    type_id: TypeId,
    type_name: &'static str,
}

/// Shared handle to a [`Class`]. Equality is identity.
#[derive(Clone)]
pub struct ClassRef(Arc<Class>);

impl ClassRef {
    /// Creates a class handle for the Rust type `T`, exposed as `module.name`.
    pub fn of<T: 'static>(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self(Arc::new(Class {
            module: module.into(),
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }))
    }

    /// Module path the class lives in.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.0.module
    }

    /// Class name inside its module.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Full dotted path, `module.name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.0.module, self.0.name)
    }

    /// Name of the backing Rust type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name
    }

    /// Whether this class is backed by the Rust type `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.0.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ClassRef {}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class '{}'>", self.qualified_name())
    }
}

/// A module: a dotted path plus the classes it exposes as attributes.
#[derive(Debug)]
pub struct Module {
    path: String,
    classes: BTreeMap<String, ClassRef>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            classes: BTreeMap::new(),
        }
    }

    /// Adds a class attribute backed by the Rust type `T`.
    #[must_use]
    pub fn with_class<T: 'static>(mut self, name: &str) -> Self {
        let class = ClassRef::of::<T>(self.path.clone(), name);
        self.classes.insert(name.to_string(), class);
        self
    }

    /// Dotted path of the module.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Looks up a class attribute.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassRef> {
        self.classes.get(name)
    }

    /// Names of all class attributes, sorted.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

/// Shared handle to a [`Module`]. Equality is identity.
#[derive(Clone)]
pub struct ModuleRef(Arc<Module>);

impl From<Module> for ModuleRef {
    fn from(module: Module) -> Self {
        Self(Arc::new(module))
    }
}

impl Deref for ModuleRef {
    type Target = Module;

    fn deref(&self) -> &Module {
        &self.0
    }
}

impl PartialEq for ModuleRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ModuleRef {}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<module '{}'>", self.0.path)
    }
}

/// A setting value: a default declared in code, an override from the
/// settings namespace, or the result of coercing either.
///
/// `Value` deliberately has no `PartialEq`: comparing against an
/// [`Undefined`] marker must fail loudly, so comparison goes through
/// [`Value::try_eq`].
#[derive(Clone, Debug)]
pub enum Value {
    /// Explicit null / none.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(String),
    /// Ordered list.
    List(Vec<Value>),
    /// String-keyed mapping.
    Map(BTreeMap<String, Value>),
    /// A live module.
    Module(ModuleRef),
    /// A live class object.
    Class(ClassRef),
    /// The "must be configured" marker.
    Undefined(Undefined),
}

impl Value {
    /// Short name of the value's kind, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Module(_) => "module",
            Self::Class(_) => "class",
            Self::Undefined(_) => "undefined",
        }
    }

    /// Whether this is the undefined marker.
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined(_))
    }

    /// The string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The mapping payload, if this is a mapping.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Truthiness of the value in a boolean context.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ImproperlyConfigured`] for the undefined marker.
    pub fn truthy(&self) -> Result<bool> {
        Ok(match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Module(_) | Self::Class(_) => true,
            Self::Undefined(marker) => return Err(marker.misuse()),
        })
    }

    /// String form of the value.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ImproperlyConfigured`] if the value is, or
    /// contains, the undefined marker.
    pub fn to_display_string(&self) -> Result<String> {
        let mut out = String::new();
        self.write_display(&mut out)?;
        Ok(out)
    }

    fn write_display(&self, out: &mut String) -> Result<()> {
        use std::fmt::Write as _;

        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Self::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Self::Float(f) => {
                let _ = write!(out, "{f}");
            }
            Self::Str(s) => out.push_str(s),
            Self::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_display(out)?;
                }
                out.push(']');
            }
            Self::Map(map) => {
                out.push('{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    item.write_display(out)?;
                }
                out.push('}');
            }
            Self::Module(module) => {
                let _ = write!(out, "{module:?}");
            }
            Self::Class(class) => {
                let _ = write!(out, "{class:?}");
            }
            Self::Undefined(marker) => return Err(marker.misuse()),
        }
        Ok(())
    }

    /// Structural equality. Modules and classes compare by identity.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ImproperlyConfigured`] if either side is, or
    /// contains, the undefined marker.
    #[allow(clippy::float_cmp)]
    pub fn try_eq(&self, other: &Self) -> Result<bool> {
        Ok(match (self, other) {
            (Self::Undefined(marker), _) | (_, Self::Undefined(marker)) => {
                return Err(marker.misuse())
            }
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => int_float_eq(*a, *b),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.try_eq(y)? {
                        return Ok(false);
                    }
                }
                true
            }
            (Self::Map(a), Self::Map(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (key, x) in a {
                    match b.get(key) {
                        Some(y) if x.try_eq(y)? => {}
                        _ => return Ok(false),
                    }
                }
                true
            }
            (Self::Module(a), Self::Module(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => a == b,
            _ => false,
        })
    }
}

/// Exact comparison of an integer with a float; no rounding through `f64`.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn int_float_eq(int: i64, float: f64) -> bool {
    // i64::MIN is exactly representable; i64::MAX + 1 is the first value out of range.
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    float.fract() == 0.0 && (LOWER..UPPER).contains(&float) && float as i64 == int
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

impl From<ModuleRef> for Value {
    fn from(value: ModuleRef) -> Self {
        Self::Module(value)
    }
}

impl From<ClassRef> for Value {
    fn from(value: ClassRef) -> Self {
        Self::Class(value)
    }
}

impl From<Undefined> for Value {
    fn from(value: Undefined) -> Self {
        Self::Undefined(value)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a settings value")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {v} does not fit in i64")))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::Str(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_unit<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

/// Conversion out of a resolved [`Value`] for typed accessors.
pub trait FromValue: Sized {
    /// Kind name reported when the conversion does not apply.
    const EXPECTED: &'static str;

    /// Converts the value, handing it back unchanged on mismatch.
    ///
    /// # Errors
    ///
    /// Returns the original value when it is of another kind.
    fn from_value(value: Value) -> std::result::Result<Self, Value>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        Ok(value)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "str";

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(other),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(other),
        }
    }
}

impl FromValue for Vec<Value> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(other),
        }
    }
}

impl FromValue for BTreeMap<String, Value> {
    const EXPECTED: &'static str = "map";

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(other),
        }
    }
}

impl FromValue for ModuleRef {
    const EXPECTED: &'static str = "module";

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Module(module) => Ok(module),
            other => Err(other),
        }
    }
}

impl FromValue for ClassRef {
    const EXPECTED: &'static str = "class";

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Class(class) => Ok(class),
            other => Err(other),
        }
    }
}
