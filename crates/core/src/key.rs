//! Conversion of local destination paths into object-storage keys.

pub const KEY_SEPARATOR: char = '/';

/// Strip one trailing `/` or `\` from a configured root.
pub fn trim_root(root: &str) -> &str {
    root.strip_suffix(['/', '\\']).unwrap_or(root)
}

/// Replace every backslash with the key separator.
pub fn to_key_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Join a root prefix and a destination into a single object key.
///
/// `..` segments are passed through untouched; keeping keys inside the root
/// is the caller's responsibility.
pub fn object_key(root: &str, destination: &str) -> String {
    format!(
        "{}{KEY_SEPARATOR}{}",
        trim_root(root),
        to_key_separators(destination)
    )
}

/// Final non-empty segment of a key, or `None` for directory markers like `a/b/`.
pub fn base_name(key: &str) -> Option<&str> {
    key.rsplit(KEY_SEPARATOR).next().filter(|name| !name.is_empty())
}
