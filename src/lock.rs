use std::sync::{Mutex, MutexGuard};

/// Take a lock even if a panicking thread poisoned it; the pipeline state behind
/// these mutexes stays valid across a panic in another stage.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            crate::log_debug(&format!("mutex poisoned in {context}; recovering"));
            poisoned.into_inner()
        }
    }
}
