//! Serialized access to process environment for config tests.

use std::sync::{Mutex, MutexGuard, OnceLock};

fn env_guard() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    // A failed test poisons the lock; the environment is still usable.
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs `run` while holding the environment lock.
pub(crate) fn with_locked_env<R>(run: impl FnOnce() -> R) -> R {
    let _guard = env_guard();
    run()
}

/// Sets a `TUBENOR_*` override. Only call inside [`with_locked_env`].
pub(crate) fn set_env_var(key: &str, value: &str) {
    // SAFETY: callers hold the env lock, so no other test thread touches the
    // environment concurrently.
    unsafe {
        std::env::set_var(key, value);
    }
}

/// Removes an override. Only call inside [`with_locked_env`].
pub(crate) fn remove_env_var(key: &str) {
    // SAFETY: see `set_env_var`.
    unsafe {
        std::env::remove_var(key);
    }
}
