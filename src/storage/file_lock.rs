use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::directory::Lock;

/// Single writer guarantee, via an advisory `flock` on the lock file
#[derive(Debug)]
pub struct FileLock {
    pub file: File,
    pub path: PathBuf,
    released: bool,
}

impl FileLock {
    pub fn acquire(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;

        // Platform-specific locking
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();
            unsafe {
                if flock(fd, LOCK_EX | LOCK_NB) != 0 {
                    return Err(Error::new(
                        ErrorKind::LockObtainFailed,
                        format!("lock {} is held by another writer", lock_path.display()),
                    ));
                }
            }
        }

        Ok(FileLock {
            file,
            path: lock_path.to_path_buf(),
            released: false,
        })
    }

    fn unlock(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                if flock(fd, LOCK_UN) != 0 {
                    return Err(Error::new(
                        ErrorKind::Io,
                        format!("failed to release lock {}", self.path.display()),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Lock for FileLock {
    fn release(mut self: Box<Self>) -> Result<()> {
        self.unlock()
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.unlock() {
            log::warn!("{}", e);
        }
    }
}
