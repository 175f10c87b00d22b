//! Filesystem-backed session storage.
//!
//! Each key is a file inside a capability-scoped directory. Writes go to a
//! hidden temporary file first and are renamed over the target, so a crash
//! mid-write leaves either the old value or the new one.

use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use cap_std::{
    ambient_authority,
    fs::{Dir, OpenOptions},
};

use crate::domain::ports::{SessionStorage, SessionStorageError, StorageKey};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Session storage rooted at a directory.
#[derive(Debug)]
pub struct FileSessionStorage {
    dir: Dir,
}

impl FileSessionStorage {
    /// Open (creating if needed) the storage directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be created or opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { dir })
    }

    /// Wrap an already opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir }
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>, SessionStorageError> {
        match self.dir.read_to_string(key.as_str()) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SessionStorageError::read(key.as_str(), err.to_string())),
        }
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), SessionStorageError> {
        write_atomic(&self.dir, key.as_str(), value)
            .map_err(|err| SessionStorageError::write(key.as_str(), err.to_string()))
    }

    fn remove(&self, key: StorageKey) -> Result<(), SessionStorageError> {
        match self.dir.remove_file(key.as_str()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionStorageError::remove(key.as_str(), err.to_string())),
        }
    }
}

fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> io::Result<()> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{file_name}.tmp.{}.{counter}", std::process::id());

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let written = dir.open_with(&tmp_name, &options).and_then(|mut file| {
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    });
    if let Err(err) = written {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }

    if let Err(err) = replace(dir, &tmp_name, file_name) {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }
    Ok(())
}

#[cfg(windows)]
fn replace(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn replace(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}
