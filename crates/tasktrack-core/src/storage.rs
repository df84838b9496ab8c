use std::cell::{Cell, RefCell};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

use crate::document::{decode_document, encode_document, Decoded};
use crate::task::Task;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Task storage unavailable at {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn unavailable(path: &Path, source: io::Error) -> Self {
        StorageError::Unavailable {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Held for the duration of a read-modify-write cycle. Dropping it releases
/// the lock.
#[derive(Debug, Default)]
pub struct StorageLock {
    file: Option<File>,
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            if let Err(err) = FileExt::unlock(file) {
                debug!(error = %err, "release storage lock");
            }
        }
    }
}

/// Where the serialized task document lives.
pub trait Storage {
    /// `Ok(None)` means nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, StorageError>;

    fn write(&self, document: &str) -> Result<(), StorageError>;

    fn lock(&self) -> Result<StorageLock, StorageError> {
        Ok(StorageLock::default())
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    fn temp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("tasks"));
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

impl Storage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::unavailable(&self.path, err)),
        }
    }

    fn write(&self, document: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StorageError::unavailable(parent, err))?;
        }
        let tmp = self.temp_path();
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(document.as_bytes())?;
            file.sync_all()
        });
        if let Err(err) = written.and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::unavailable(&self.path, err));
        }
        Ok(())
    }

    fn lock(&self) -> Result<StorageLock, StorageError> {
        let path = self.lock_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StorageError::unavailable(parent, err))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|err| StorageError::unavailable(&path, err))?;
        file.lock_exclusive()
            .map_err(|err| StorageError::unavailable(&path, err))?;
        Ok(StorageLock { file: Some(file) })
    }
}

/// In-memory document, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: RefCell<Option<String>>,
    writes: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: RefCell::new(Some(document.into())),
            writes: Cell::new(0),
        }
    }

    pub fn document(&self) -> Option<String> {
        self.document.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.document())
    }

    fn write(&self, document: &str) -> Result<(), StorageError> {
        *self.document.borrow_mut() = Some(document.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

pub fn load_tasks<S: Storage + ?Sized>(storage: &S) -> Result<Decoded, StorageError> {
    let decoded = match storage.read()? {
        Some(text) => decode_document(&text),
        None => Decoded::default(),
    };
    debug!(
        tasks = decoded.tasks.len(),
        skipped = decoded.warnings.len(),
        "loaded task document"
    );
    Ok(decoded)
}

pub fn save_tasks<S: Storage + ?Sized>(storage: &S, tasks: &[Task]) -> Result<(), StorageError> {
    storage.write(&encode_document(tasks))?;
    debug!(tasks = tasks.len(), "saved task document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sibling_appends_suffix_to_file_name() {
        assert_eq!(
            sibling(Path::new("/data/tasks.json"), "tmp"),
            PathBuf::from("/data/tasks.json.tmp")
        );
        assert_eq!(sibling(Path::new("tasks.json"), "lock"), PathBuf::from("tasks.json.lock"));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let temp = TempDir::new().expect("tempdir");
        let storage = FileStorage::new(temp.path().join("tasks.json"));
        assert!(storage.read().expect("read").is_none());
    }

    #[test]
    fn write_replaces_file_and_leaves_no_temp() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("nested").join("tasks.json");
        let storage = FileStorage::new(&path);
        storage.write("[\n]").expect("first write");
        storage.write("[\n  {}\n]").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "[\n  {}\n]");
        assert!(!temp.path().join("nested").join("tasks.json.tmp").exists());
    }

    #[test]
    fn read_of_directory_is_unavailable() {
        let temp = TempDir::new().expect("tempdir");
        let storage = FileStorage::new(temp.path());
        let err = storage.read().expect_err("directory is not a document");
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }

    #[test]
    fn lock_creates_lock_file_and_releases_on_drop() {
        let temp = TempDir::new().expect("tempdir");
        let storage = FileStorage::new(temp.path().join("tasks.json"));
        {
            let _guard = storage.lock().expect("lock");
            assert!(storage.lock_path().exists());
        }
        let _again = storage.lock().expect("relock after drop");
    }

    #[test]
    fn memory_storage_counts_writes() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read().expect("read"), None);
        storage.write("[\n]").expect("write");
        assert_eq!(storage.document().as_deref(), Some("[\n]"));
        assert_eq!(storage.writes(), 1);
    }
}
