//! Filesystem key-value storage
//!
//! One file per key under a root directory. Writes go to a temp file in the
//! same directory and are renamed into place, so a crash never leaves a
//! half-written document. A lock file serializes access across processes
//! (CLI invocations running side by side).

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStorage;

const LOCK_FILE: &str = ".lock";
const VALUE_EXTENSION: &str = "json";

/// Key-value storage backed by a directory
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", encode_key(key), VALUE_EXTENSION))
    }

    /// Take the directory lock. Released when the returned file is dropped.
    fn lock(&self, exclusive: bool) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.root.join(LOCK_FILE))?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(file)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock(false)?;
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock(true)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key))
            .map_err(|e| Error::storage(format!("Failed to persist key {}: {}", key, e.error)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock(true)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let _guard = self.lock(false)?;
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(key) = decode_key(stem) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Escape a key into a portable file name: `[A-Za-z0-9._-]` pass through,
/// every other byte becomes `%XX`
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_encoding_round_trip() {
        let key = "budget-analyzer:csv-upload:1f0c/è";
        let encoded = encode_key(key);
        assert!(!encoded.contains(':'));
        assert!(!encoded.contains('/'));
        assert_eq!(decode_key(&encoded).as_deref(), Some(key));
    }

    #[test]
    fn test_set_get_remove() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        assert_eq!(storage.get("budget-analyzer.state.v1").unwrap(), None);
        storage.set("budget-analyzer.state.v1", "{\"version\":1}").unwrap();
        assert_eq!(
            storage.get("budget-analyzer.state.v1").unwrap().as_deref(),
            Some("{\"version\":1}")
        );

        storage.set("budget-analyzer.state.v1", "{}").unwrap();
        assert_eq!(storage.get("budget-analyzer.state.v1").unwrap().as_deref(), Some("{}"));

        storage.remove("budget-analyzer.state.v1").unwrap();
        assert_eq!(storage.get("budget-analyzer.state.v1").unwrap(), None);
        // Removing twice is fine
        storage.remove("budget-analyzer.state.v1").unwrap();
    }

    #[test]
    fn test_keys_by_prefix() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        storage.set("upload:b", "2").unwrap();
        storage.set("upload:a", "1").unwrap();
        storage.set("state", "{}").unwrap();

        assert_eq!(storage.keys("upload:").unwrap(), vec!["upload:a", "upload:b"]);
        assert_eq!(storage.keys("").unwrap().len(), 3);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        FileStorage::new(dir.path()).unwrap().set("k", "v").unwrap();
        let reopened = FileStorage::new(dir.path()).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }
}
