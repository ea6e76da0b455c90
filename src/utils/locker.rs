//! File-based locking so a service is never backed up twice at the same time

use anyhow::{Context, Result};
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Field order matters: the guard must drop before the lock it borrows.
struct LockSlot {
    guard: Option<RwLockWriteGuard<'static, File>>,
    lock: RwLock<File>,
}

/// Exclusive lock guard for one service's backups
pub struct BackupLock {
    slot: Box<LockSlot>,
    lock_path: PathBuf,
}

impl BackupLock {
    /// Acquire the lock for `key` inside `lock_dir`.
    /// Fails immediately if another backup of the same service holds it.
    pub fn acquire(lock_dir: &Path, key: &str) -> Result<Self> {
        let lock_path = Self::lock_path(lock_dir, key);

        debug!("Attempting to acquire lock: {:?}", lock_path);

        std::fs::create_dir_all(lock_dir).context("Failed to create lock directory")?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .context(format!("Failed to open lock file: {:?}", lock_path))?;

        let mut slot = Box::new(LockSlot {
            guard: None,
            lock: RwLock::new(file),
        });

        // SAFETY: the guard borrows `slot.lock`, which lives in the same heap
        // allocation. The box is never moved out of, and the guard is dropped
        // first (explicitly in `Drop`, and by field order otherwise).
        let lock_ptr = &mut slot.lock as *mut RwLock<File>;
        let guard = unsafe { (*lock_ptr).try_write() }
            .context(format!("A backup for '{}' is already running (lock held)", key))?;
        let guard: RwLockWriteGuard<'static, File> = unsafe { std::mem::transmute(guard) };
        slot.guard = Some(guard);

        info!("Acquired backup lock for {}", key);

        Ok(Self { slot, lock_path })
    }

    fn lock_path(lock_dir: &Path, key: &str) -> PathBuf {
        lock_dir.join(format!("service-manager-{}.lock", key))
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

// The lock file is left in place: unlinking it would let a contender that
// already opened the old file and a newcomer on a fresh file both hold a lock.
impl Drop for BackupLock {
    fn drop(&mut self) {
        self.slot.guard.take();
        info!("Released backup lock: {:?}", self.lock_path);
    }
}
