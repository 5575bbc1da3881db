use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Advisory exclusive lock on a side file next to a cache file.
///
/// Released when dropped. The lock file itself is left behind; it only ever
/// holds the pid of the last owner.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    /// Lock path for a given cache file: `<cache file>.lock`.
    pub fn path_for(cache_path: &Path) -> PathBuf {
        let mut name = cache_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Opens (creating if needed) and locks `path` without blocking.
    pub fn lock<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        Self::try_lock(&file)?;

        // Only truncate once we own the lock, or we'd wipe the holder's pid.
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()?;

        Ok(Self { _file: file, path })
    }

    #[cfg(unix)]
    fn try_lock(file: &File) -> io::Result<()> {
        use libc::{flock, LOCK_EX, LOCK_NB};

        let fd = file.as_raw_fd();
        let result = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn try_lock(_file: &File) -> io::Result<()> {
        tracing::warn!("advisory cache file locks are not supported on this platform");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
