use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::RwLock;
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::file_lock::FileLock;
use crate::storage::layout::WRITE_LOCK_NAME;

/// Write stream for a new file. Nothing is guaranteed durable until `finish`.
pub trait IndexOutput: Write + Send {
    /// Flush buffered bytes and make the file durable
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Exclusive write access to a directory; released on drop
pub trait Lock: Send + Sync + fmt::Debug {
    fn release(self: Box<Self>) -> Result<()>;
}

/// Flat namespace of write-once files
pub trait Directory: Send + Sync + fmt::Debug {
    /// Create a new file; fails if `name` already exists
    fn create_output(&self, name: &str) -> Result<Box<dyn IndexOutput>>;

    fn open_input(&self, name: &str) -> Result<Box<dyn Read + Send>>;

    /// All file names, sorted
    fn list_all(&self) -> Result<Vec<String>>;

    fn delete_file(&self, name: &str) -> Result<()>;

    /// Atomically and durably replace `to` with `from`
    fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Make directory entries (creations, renames, deletions) durable
    fn sync_metadata(&self) -> Result<()>;

    fn obtain_write_lock(&self) -> Result<Box<dyn Lock>>;

    fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        let mut input = self.open_input(name)?;
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        Ok(data)
    }

    fn file_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_all()?.iter().any(|n| n == name))
    }
}

/// Directory backed by a folder on the local file system
#[derive(Debug, Clone)]
pub struct FsDirectory {
    pub path: PathBuf,
}

impl FsDirectory {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        Ok(FsDirectory { path })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

struct FsOutput {
    writer: BufWriter<File>,
}

impl Write for FsOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl IndexOutput for FsOutput {
    fn finish(self: Box<Self>) -> Result<()> {
        let file = self.writer.into_inner().map_err(|e| Error::from(e.into_error()))?;
        file.sync_all()?;
        Ok(())
    }
}

impl Directory for FsDirectory {
    fn create_output(&self, name: &str) -> Result<Box<dyn IndexOutput>> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.file_path(name))?;
        Ok(Box::new(FsOutput {
            writer: BufWriter::with_capacity(64 * 1024, file),
        }))
    }

    fn open_input(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(self.file_path(name))?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn list_all(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        fs::remove_file(self.file_path(name))?;
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.file_path(from), self.file_path(to))?;
        self.sync_metadata()
    }

    fn sync_metadata(&self) -> Result<()> {
        // Directory fsync is what makes a rename durable on unix
        #[cfg(unix)]
        {
            File::open(&self.path)?.sync_all()?;
        }
        Ok(())
    }

    fn obtain_write_lock(&self) -> Result<Box<dyn Lock>> {
        let lock = FileLock::acquire(&self.file_path(WRITE_LOCK_NAME))?;
        Ok(Box::new(lock))
    }
}

#[derive(Debug, Default)]
struct RamState {
    files: RwLock<BTreeMap<String, Arc<Vec<u8>>>>,
    locked: AtomicBool,
}

/// In-memory directory; clones share the same files
#[derive(Debug, Clone, Default)]
pub struct RamDirectory {
    state: Arc<RamState>,
}

impl RamDirectory {
    pub fn new() -> Self {
        RamDirectory::default()
    }
}

struct RamOutput {
    name: String,
    buffer: Vec<u8>,
    state: Arc<RamState>,
}

impl Write for RamOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl IndexOutput for RamOutput {
    fn finish(self: Box<Self>) -> Result<()> {
        let RamOutput { name, buffer, state } = *self;
        state.files.write().insert(name, Arc::new(buffer));
        Ok(())
    }
}

#[derive(Debug)]
struct RamLock {
    state: Arc<RamState>,
    released: bool,
}

impl Lock for RamLock {
    fn release(mut self: Box<Self>) -> Result<()> {
        self.state.locked.store(false, Ordering::Release);
        self.released = true;
        Ok(())
    }
}

impl Drop for RamLock {
    fn drop(&mut self) {
        if !self.released {
            self.state.locked.store(false, Ordering::Release);
        }
    }
}

fn file_not_found(name: &str) -> Error {
    Error::new(ErrorKind::FileNotFound, format!("file '{}' does not exist", name))
}

impl Directory for RamDirectory {
    fn create_output(&self, name: &str) -> Result<Box<dyn IndexOutput>> {
        if self.state.files.read().contains_key(name) {
            return Err(Error::new(ErrorKind::Io, format!("file '{}' already exists", name)));
        }
        Ok(Box::new(RamOutput {
            name: name.to_string(),
            buffer: Vec::new(),
            state: self.state.clone(),
        }))
    }

    fn open_input(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let data = self.state.files.read()
            .get(name)
            .cloned()
            .ok_or_else(|| file_not_found(name))?;
        Ok(Box::new(Cursor::new(ArcBytes(data))))
    }

    fn list_all(&self) -> Result<Vec<String>> {
        Ok(self.state.files.read().keys().cloned().collect())
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.state.files.write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| file_not_found(name))
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut files = self.state.files.write();
        let data = files.remove(from).ok_or_else(|| file_not_found(from))?;
        files.insert(to.to_string(), data);
        Ok(())
    }

    fn sync_metadata(&self) -> Result<()> {
        Ok(())
    }

    fn obtain_write_lock(&self) -> Result<Box<dyn Lock>> {
        if self.state.locked.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(Error::new(
                ErrorKind::LockObtainFailed,
                "directory is already locked by another writer".to_string(),
            ));
        }
        Ok(Box::new(RamLock {
            state: self.state.clone(),
            released: false,
        }))
    }
}

/// Shared file contents readable through `Cursor`
struct ArcBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for ArcBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
