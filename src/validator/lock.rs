//! Exclusive lock held by the detached validator host.
//!
//! The lock file lives at `<root>/.roosevelt/validator.lock` and holds the
//! host's PID. Liveness is decided by the `flock`, never by the file's
//! existence, so a crashed host cannot leave a stale lock behind.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::validator::ValidatorError;

/// Lock file path for a project.
pub fn lock_path(root: &Path) -> PathBuf {
    root.join(".roosevelt").join("validator.lock")
}

/// A held lock. Released when dropped.
#[derive(Debug)]
pub struct ProcessLock {
    _file: File,
    path: PathBuf,
}

impl ProcessLock {
    /// Take the lock and record this process's PID. `None` when another
    /// process holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, ValidatorError> {
        let io_err = |source: io::Error| ValidatorError::Lock {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        if !try_flock(&file, FlockMode::Exclusive).map_err(io_err)? {
            return Ok(None);
        }

        file.set_len(0).map_err(io_err)?;
        write!(file, "{}", std::process::id()).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        Ok(Some(Self {
            _file: file,
            path: path.to_path_buf(),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether some process currently holds the lock at `path`.
pub fn is_held(path: &Path) -> Result<bool, ValidatorError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(ValidatorError::Lock {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    // A shared probe never succeeds against a holder, and lets concurrent
    // probes through. Dropping `file` releases it.
    let acquired = try_flock(&file, FlockMode::Shared).map_err(|source| ValidatorError::Lock {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(!acquired)
}

/// PID recorded by the current or last holder.
pub fn holder_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[derive(Debug, Clone, Copy)]
enum FlockMode {
    Shared,
    Exclusive,
}

fn try_flock(file: &File, mode: FlockMode) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        let operation = match mode {
            FlockMode::Shared => libc::LOCK_SH,
            FlockMode::Exclusive => libc::LOCK_EX,
        };
        // SAFETY: fd is a valid descriptor owned by `file`; LOCK_NB never blocks.
        #[allow(unsafe_code)]
        let result = unsafe { libc::flock(fd, operation | libc::LOCK_NB) };
        if result == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK) {
            return Ok(false);
        }
        Err(err)
    }
    #[cfg(not(unix))]
    {
        let _ = (file, mode);
        Ok(true)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(dir.path());
        assert!(!is_held(&path).unwrap());

        let lock = ProcessLock::try_acquire(&path).unwrap().unwrap();
        assert!(is_held(&path).unwrap());
        assert!(ProcessLock::try_acquire(&path).unwrap().is_none());
        assert_eq!(holder_pid(&path), Some(std::process::id()));

        drop(lock);
        assert!(!is_held(&path).unwrap());
        assert!(ProcessLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn concurrent_probes_do_not_block_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();

        // A probe in flight holds a shared lock on its own descriptor.
        let in_flight = File::open(&path).unwrap();
        assert!(try_flock(&in_flight, FlockMode::Shared).unwrap());
        assert!(!is_held(&path).unwrap());

        drop(in_flight);
        assert!(ProcessLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn leftover_file_is_not_a_held_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "99999").unwrap();
        assert!(!is_held(&path).unwrap());
    }
}
