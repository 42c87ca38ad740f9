//! Name classification for schema members.

/// Separator placed between a prefix and a setting name.
pub const PREFIX_SEPARATOR: char = '_';

/// Whether the name has at least one cased character and no lowercase ones.
///
/// `"STR_SETTING_1"` is upper, `"_1"` is not (nothing cased).
#[must_use]
pub fn is_upper(name: &str) -> bool {
    let mut has_cased = false;
    for c in name.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Whether the name is a dunder (`__name__`).
#[must_use]
pub fn is_dunder(name: &str) -> bool {
    name.starts_with("__") && name.ends_with("__")
}

/// Whether a schema member with this name is a configuration key.
#[must_use]
pub fn is_config_key(name: &str) -> bool {
    !is_dunder(name) && is_upper(name)
}

/// Joins a prefix and a setting name into the flat namespace name.
#[must_use]
pub fn prefixed_name(prefix: &str, key: &str) -> String {
    format!("{prefix}{PREFIX_SEPARATOR}{key}")
}
