//! Advisory file locks guarding collection files.
//!
//! The lock file is a zero-byte sentinel next to the data file. Holding an
//! exclusive OS lock on it grants the right to run one load-mutate-persist
//! cycle. Locks are cooperative: anything that edits the data file without
//! going through [`FileLock`] is not excluded.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// First sleep between non-blocking attempts when a timeout is set.
const INITIAL_BACKOFF: Duration = Duration::from_millis(1);
/// Upper bound for the sleep between attempts.
const MAX_BACKOFF: Duration = Duration::from_millis(50);

/// An exclusive lock held on a lock file.
///
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    file: File,
}

impl FileLock {
    /// Acquires an exclusive lock on `path`, creating the file if needed.
    ///
    /// With `timeout = None` this blocks until the lock is granted. With a
    /// timeout it polls with exponential backoff and gives up at the deadline.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` when the deadline passes and `Io` for file
    /// system failures.
    pub fn acquire(path: &Path, timeout: Option<Duration>) -> CoreResult<Self> {
        let start = Instant::now();
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let file = open_lock_file(path)?;

            match timeout {
                None => file.lock_exclusive()?,
                Some(limit) => {
                    while file.try_lock_exclusive().is_err() {
                        let waited = start.elapsed();
                        if waited >= limit {
                            return Err(CoreError::LockTimeout {
                                path: path.to_path_buf(),
                                waited,
                            });
                        }
                        thread::sleep(backoff.min(limit - waited));
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }

            // A concurrent drop may have unlinked the file we locked.
            if still_linked(&file, path) {
                debug!(lock = %path.display(), waited = ?start.elapsed(), "lock acquired");
                return Ok(Self {
                    path: path.to_path_buf(),
                    file,
                });
            }

            debug!(lock = %path.display(), "lock file replaced while waiting, retrying");
            let _ = FileExt::unlock(&file);
        }
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the lock file while still holding the lock.
    ///
    /// Waiters that were blocked on the removed file notice the unlink and
    /// retry on a fresh file.
    pub fn remove_file(&self) -> CoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(path: &Path) -> CoreResult<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    Ok(file)
}

#[cfg(unix)]
pub(crate) fn still_linked(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
pub(crate) fn still_linked(_file: &File, path: &Path) -> bool {
    // Windows refuses to delete a file that is open, so the handle we hold
    // always names the current file.
    path.exists()
}
