//! Filesystem-backed registry of configuration files
//!
//! Every operation works directly against the base directory; nothing is kept
//! in memory between calls, so the directory is always the source of truth.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::{errors::RuntimeError, file_utils::resolve_name};

/// Handle on the managed directory
#[derive(Debug, Clone)]
pub struct ConfigStore {
    base_dir: PathBuf,
    suffix: String,
}

impl ConfigStore {
    pub fn new(base_dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            suffix: suffix.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Names of the regular files carrying the configured suffix.
    ///
    /// Dotfiles are left out, like a shell glob would. Order is whatever the
    /// directory enumeration yields.
    pub fn list(&self) -> Result<Vec<String>, RuntimeError> {
        let list_err = |e| {
            RuntimeError::io(
                "Error listing configurations",
                self.base_dir.display().to_string(),
                e,
            )
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;

            let Ok(name) = entry.file_name().into_string() else {
                debug!("Skipping non UTF-8 entry {:?}", entry.path());
                continue;
            };
            if name.starts_with('.') || !name.ends_with(&self.suffix) {
                continue;
            }
            // Follows symlinks, so dangling links are skipped too
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => names.push(name),
                _ => continue,
            }
        }
        Ok(names)
    }

    /// Path of an existing configuration file.
    pub fn locate(&self, name: &str) -> Result<PathBuf, RuntimeError> {
        let path = resolve_name(&self.base_dir, name)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(RuntimeError::NotFound(name.to_string()))
        }
    }

    /// Full content of a configuration file
    pub fn read(&self, name: &str) -> Result<Vec<u8>, RuntimeError> {
        let path = self.locate(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RuntimeError::NotFound(name.to_string()),
            _ => RuntimeError::io("Error reading configuration", path.display().to_string(), e),
        })
    }

    /// Writes a new configuration file, refusing to replace an existing one.
    pub fn create(&self, name: &str, content: &[u8]) -> Result<(), RuntimeError> {
        if name.is_empty() || content.is_empty() {
            return Err(RuntimeError::BadRequest(
                "Name and content are required".to_string(),
            ));
        }
        let path = resolve_name(&self.base_dir, name)?;
        let create_err =
            |e| RuntimeError::io("Error creating configuration", path.display().to_string(), e);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(RuntimeError::Conflict(name.to_string()));
            }
            Err(e) => return Err(create_err(e)),
        };

        if let Err(e) = file.write_all(content).and_then(|_| file.sync_all()) {
            drop(file);
            if let Err(rm_err) = fs::remove_file(&path) {
                warn!("Could not remove partially written {}: {rm_err}", path.display());
            }
            return Err(create_err(e));
        }

        info!("Created configuration {name} ({} bytes)", content.len());
        Ok(())
    }

    /// Removes a configuration file
    pub fn delete(&self, name: &str) -> Result<(), RuntimeError> {
        let path = self.locate(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted configuration {name}");
                Ok(())
            }
            // Lost a race against another delete
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(RuntimeError::NotFound(name.to_string()))
            }
            Err(e) => Err(RuntimeError::io(
                "Error deleting configuration",
                path.display().to_string(),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc, thread};
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path(), ".conf");
        (dir, store)
    }

    #[test]
    fn test_create_then_read_returns_content() {
        let (_dir, store) = store();
        store.create("peer1.conf", b"[Interface]\nkey=abc").unwrap();
        assert_eq!(store.read("peer1.conf").unwrap(), b"[Interface]\nkey=abc");
    }

    #[test]
    fn test_create_existing_name_is_conflict_and_keeps_content() {
        let (_dir, store) = store();
        store.create("peer1.conf", b"original").unwrap();

        let result = store.create("peer1.conf", b"replacement");
        assert!(matches!(result, Err(RuntimeError::Conflict(name)) if name == "peer1.conf"));
        assert_eq!(store.read("peer1.conf").unwrap(), b"original");
    }

    #[test]
    fn test_create_with_empty_fields_is_bad_request() {
        let (dir, store) = store();
        assert!(matches!(
            store.create("", b"content"),
            Err(RuntimeError::BadRequest(_))
        ));
        assert!(matches!(
            store.create("empty.conf", b""),
            Err(RuntimeError::BadRequest(_))
        ));
        assert!(!dir.path().join("empty.conf").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_rejects_traversal() {
        let outer = TempDir::new().unwrap();
        let base = outer.path().join("base");
        fs::create_dir(&base).unwrap();
        let store = ConfigStore::new(&base, ".conf");

        let result = store.create("../escape.conf", b"x");
        assert!(matches!(result, Err(RuntimeError::InvalidName { .. })));
        assert!(!outer.path().join("escape.conf").exists());
    }

    #[test]
    fn test_delete_then_everything_is_not_found() {
        let (_dir, store) = store();
        store.create("peer1.conf", b"x").unwrap();
        store.delete("peer1.conf").unwrap();

        assert!(matches!(store.read("peer1.conf"), Err(RuntimeError::NotFound(_))));
        assert!(matches!(store.locate("peer1.conf"), Err(RuntimeError::NotFound(_))));
        assert!(matches!(store.delete("peer1.conf"), Err(RuntimeError::NotFound(_))));
    }

    #[test]
    fn test_read_directory_is_not_found() {
        let (dir, store) = store();
        fs::create_dir(dir.path().join("nested.conf")).unwrap();
        assert!(matches!(store.read("nested.conf"), Err(RuntimeError::NotFound(_))));
        assert!(matches!(store.delete("nested.conf"), Err(RuntimeError::NotFound(_))));
    }

    #[test]
    fn test_list_filters_by_suffix_and_skips_directories() {
        let (dir, store) = store();
        store.create("a.conf", b"a").unwrap();
        store.create("b.conf", b"b").unwrap();
        store.create("notes.txt", b"n").unwrap();
        fs::create_dir(dir.path().join("dir.conf")).unwrap();

        let listed: HashSet<_> = store.list().unwrap().into_iter().collect();
        let expected: HashSet<_> = ["a.conf", "b.conf"].map(String::from).into();
        assert_eq!(listed, expected);
    }

    #[test]
    fn test_list_tracks_interleaved_creates_and_deletes() {
        let (_dir, store) = store();
        let mut alive = HashSet::new();
        for i in 0..10 {
            let name = format!("peer{i}.conf");
            store.create(&name, b"k").unwrap();
            alive.insert(name);
            if i % 3 == 0 {
                let victim = format!("peer{}.conf", i / 2);
                if alive.remove(&victim) {
                    store.delete(&victim).unwrap();
                }
            }
        }
        let listed: HashSet<_> = store.list().unwrap().into_iter().collect();
        assert_eq!(listed, alive);
    }

    #[test]
    fn test_list_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("missing"), ".conf");
        match store.list() {
            Err(RuntimeError::IoError { message, .. }) => {
                assert_eq!(message, "Error listing configurations")
            }
            other => panic!("expected IoError, got {other:?}"),
        }
    }

    #[test]
    fn test_concurrent_creates_have_one_winner() {
        let (_dir, store) = store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.create("race.conf", format!("writer {i}").as_bytes()))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(RuntimeError::Conflict(name)) if name == "race.conf"))
                .count(),
            15
        );
        let content = String::from_utf8(store.read("race.conf").unwrap()).unwrap();
        assert!(content.starts_with("writer "));
    }

    #[test]
    fn test_list_skips_dotfiles() {
        let (_dir, store) = store();
        store.create(".hidden.conf", b"h").unwrap();
        store.create("wg0.conf", b"w").unwrap();
        assert_eq!(store.list().unwrap(), vec!["wg0.conf".to_string()]);
        assert_eq!(store.read(".hidden.conf").unwrap(), b"h");
    }

    #[test]
    fn test_custom_suffix() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path(), ".wg");
        store.create("home.wg", b"x").unwrap();
        store.create("home.conf", b"x").unwrap();
        assert_eq!(store.list().unwrap(), vec!["home.wg".to_string()]);
    }
}
