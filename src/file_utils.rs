use std::path::{Component, Path, PathBuf};

use crate::errors::RuntimeError;

/// Characters that must never appear in a configuration name
const FORBIDDEN_CHARS: [char; 3] = ['/', '\\', '\0'];

/// Checks that `name` denotes a single plain file directly inside the base directory.
///
/// Only names made of exactly one normal path component are accepted, so
/// separators, `.`/`..` references and drive prefixes are all rejected before any
/// path gets built from caller input.
pub fn validate_name(name: &str) -> Result<(), RuntimeError> {
    let invalid = |reason: &str| RuntimeError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains(FORBIDDEN_CHARS) {
        return Err(invalid("name must not contain path separators or NUL bytes"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("name must not contain control characters"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name must not reference the current or parent directory"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(invalid("name must be a plain file name")),
    }
}

/// Joins a validated name onto `base`.
pub fn resolve_name(base: &Path, name: &str) -> Result<PathBuf, RuntimeError> {
    validate_name(name)?;
    Ok(base.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["peer1.conf", "wg0.conf", "no-extension", ".hidden.conf", "a..b.conf"] {
            assert!(validate_name(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_rejects_traversal_and_separators() {
        for name in [
            "",
            ".",
            "..",
            "../secret.conf",
            "sub/peer.conf",
            "/etc/passwd",
            "..\\boot.ini",
            "nul\0byte.conf",
            "a\nb.conf",
            "tab\tname.conf",
            "bell\u{7}.conf",
        ] {
            match validate_name(name) {
                Err(RuntimeError::InvalidName { name: rejected, .. }) => {
                    assert_eq!(rejected, name)
                }
                other => panic!("expected InvalidName for {name:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_resolve_stays_inside_base() {
        let base = Path::new("/srv/configs");
        let path = resolve_name(base, "peer1.conf").unwrap();
        assert_eq!(path, base.join("peer1.conf"));
        assert_eq!(path.parent(), Some(base));
        assert!(resolve_name(base, "../peer1.conf").is_err());
    }
}
