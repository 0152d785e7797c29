use crate::CoreError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Advisory lock serializing builds of one working directory.
///
/// Two builds of the same directory would race on `lambda.zip` and the
/// `Procfile`. The lock file lives in the system temp dir, named after a hash
/// of the canonical working directory, so the project tree stays untouched.
pub struct WorkdirLock {
    lock_file: File,
    path: PathBuf,
}

impl WorkdirLock {
    pub fn lock_path_for(working_directory: &Path) -> PathBuf {
        Self::lock_path_in(&std::env::temp_dir(), working_directory)
    }

    fn lock_path_in(lock_dir: &Path, working_directory: &Path) -> PathBuf {
        let canonical = working_directory
            .canonicalize()
            .unwrap_or_else(|_| working_directory.to_path_buf());
        let digest = blake3::hash(canonical.to_string_lossy().as_bytes()).to_hex();
        lock_dir.join(format!("lambda-builder-{}.lock", &digest[..16]))
    }

    /// Take the lock without waiting; `CoreError::Locked` if another process
    /// holds it.
    pub fn try_acquire(working_directory: &Path) -> Result<Self, CoreError> {
        Self::try_acquire_at(Self::lock_path_for(working_directory), working_directory)
    }

    fn try_acquire_at(lock_path: PathBuf, working_directory: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("acquired {}", lock_path.display());
                Ok(Self {
                    lock_file: file,
                    path: lock_path,
                })
            }
            Err(_) => Err(CoreError::Locked(working_directory.to_path_buf())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkdirLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Route Ctrl-C into `shutdown_requested` so a running build container can
/// be stopped and cleaned up. A second Ctrl-C exits immediately.
pub fn install_signal_handler() {
    let _ = ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            std::process::exit(1);
        }
        SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
        eprintln!("\ninterrupt received, stopping build container...");
    });
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
