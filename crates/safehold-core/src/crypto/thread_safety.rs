//! `Send`/`Sync` for [`SessionKey`].
//!
//! `memsafe::MemSafe` holds a raw pointer to its protected mapping, which
//! suppresses the auto traits. `SessionKey` keeps it (or a `SecureBuffer`,
//! which is `Send + Sync` on its own) behind an `RwLock`, so:
//!
//! - the pointer is only dereferenced through `MemSafe::read()` while the
//!   write half of the lock is held
//! - `mlock`/`mprotect`/`madvise` on the mapping are thread-safe syscalls
//! - the pointer is never exposed and no aliased references are created

#![allow(unsafe_code)]

use super::session_key::SessionKey;

// SAFETY: the MemSafe mapping is valid from any thread, and every access to
// it goes through the RwLock.
unsafe impl Send for SessionKey {}

// SAFETY: shared access only ever reaches the key via RwLock::write(), which
// grants exclusive access to the MemSafe for the duration of the read.
unsafe impl Sync for SessionKey {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn session_key_is_send_and_sync() {
        assert_send::<SessionKey>();
        assert_sync::<SessionKey>();
        assert_send::<Arc<SessionKey>>();
    }

    #[test]
    fn can_share_across_threads() {
        let key = Arc::new(SessionKey::generate());
        let expected = key.with_key(<[u8]>::to_vec).expect("access key");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let key = Arc::clone(&key);
                thread::spawn(move || key.with_key(<[u8]>::to_vec).expect("access key"))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("thread panicked"), expected);
        }
    }
}
