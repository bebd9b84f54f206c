//! Shared test plumbing.

use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serializes tests that mutate process-wide state (environment
/// variables). A poisoned lock is recovered; the state it guards is
/// reset by each test.
pub fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
