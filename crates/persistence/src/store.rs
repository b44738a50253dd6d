//! Key-value backends for save data.
//!
//! Keys are slash-separated paths such as `save/auto`. They may only contain
//! ASCII letters, digits, `-`, `_` and `/`.

use crate::PersistError;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const FILE_EXTENSION: &str = "sav";

/// Byte store addressed by string keys.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), PersistError>;
    /// Returns whether the key existed.
    fn delete(&mut self, key: &str) -> Result<bool, PersistError>;
    /// Keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, PersistError>;
}

pub fn validate_key(key: &str) -> Result<(), PersistError> {
    let ok = !key.is_empty()
        && !key.starts_with('/')
        && !key.ends_with('/')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'));
    if ok {
        Ok(())
    } else {
        Err(PersistError::InvalidKey(key.to_string()))
    }
}

/// Volatile store, mostly for tests and headless runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        validate_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), PersistError> {
        validate_key(key)?;
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, PersistError> {
        validate_key(key)?;
        Ok(self.entries.remove(key).is_some())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, PersistError> {
        Ok(self
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// One file per key in a flat directory. `save/auto` is stored as `save.auto.sav`.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        validate_key(key)?;
        Ok(self
            .root
            .join(format!("{}.{FILE_EXTENSION}", key.replace('/', "."))))
    }
}

/// Write to `{path}.tmp`, flush to disk, then rename over `path`.
///
/// A crash before the rename leaves any previous file at `path` intact.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        atomic_write(&path, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, PersistError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, PersistError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let suffix = format!(".{FILE_EXTENSION}");
        let mut keys = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(stem) = name.strip_suffix(&suffix) else {
                continue;
            };
            let key = stem.replace('.', "/");
            if key.starts_with(prefix) && validate_key(&key).is_ok() {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("solar_logistics_store_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn keys_are_checked() {
        assert!(validate_key("save/manual-1").is_ok());
        for bad in ["", "/save", "save/", "save/../x", "a.b", "slot 1"] {
            assert!(
                matches!(validate_key(bad), Err(PersistError::InvalidKey(_))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn memory_store_lists_by_prefix() {
        let mut store = MemoryStore::new();
        store.set("save/auto", b"a").unwrap();
        store.set("meta/auto", b"m").unwrap();
        store.set("save/manual-2", b"b").unwrap();
        assert_eq!(store.list("save/").unwrap(), vec!["save/auto", "save/manual-2"]);
        assert_eq!(store.get("save/auto").unwrap().as_deref(), Some(&b"a"[..]));
        assert!(store.delete("save/auto").unwrap());
        assert!(!store.delete("save/auto").unwrap());
        assert_eq!(store.get("save/auto").unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = test_dir("roundtrip");
        let mut store = FileStore::new(&dir);
        assert!(store.list("").unwrap().is_empty());
        assert_eq!(store.get("save/auto").unwrap(), None);

        store.set("save/auto", b"version 1").unwrap();
        store.set("save/auto", b"version 2").unwrap();
        store.set("meta/auto", b"meta").unwrap();
        assert_eq!(
            store.get("save/auto").unwrap().as_deref(),
            Some(&b"version 2"[..])
        );
        assert_eq!(store.list("save/").unwrap(), vec!["save/auto"]);
        assert!(!dir.join("save.auto.sav.tmp").exists());

        assert!(store.delete("save/auto").unwrap());
        assert!(!store.delete("save/auto").unwrap());
        assert_eq!(store.list("").unwrap(), vec!["meta/auto"]);
        let _ = fs::remove_dir_all(&dir);
    }
}
