use std::fmt;

use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroize;

/// A fixed-size, exclusively owned region of secret bytes.
///
/// The region is locked into RAM on creation (best effort) and zeroed, then
/// unlocked, when the buffer is dropped. Dropping is the release operation:
/// once a `SecureBuffer` is gone nothing can read it again, which the
/// borrow checker enforces at compile time.
pub struct SecureBuffer {
    bytes: Box<[u8]>,
    locked: bool,
}

impl SecureBuffer {
    /// Allocate a zero-filled buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self::from_boxed(vec![0u8; len].into_boxed_slice())
    }

    /// Copy `src` into a new secure buffer.
    ///
    /// The caller stays responsible for wiping `src` if it holds secret data.
    pub fn from_slice(src: &[u8]) -> Self {
        let mut buffer = Self::new(src.len());
        buffer.bytes.copy_from_slice(src);
        buffer
    }

    /// Move the contents of `src` into a new secure buffer and wipe `src`.
    pub fn from_vec(mut src: Vec<u8>) -> Self {
        let buffer = Self::from_slice(&src);
        src.zeroize();
        buffer
    }

    fn from_boxed(bytes: Box<[u8]>) -> Self {
        let locked = lock_region(&bytes);
        Self { bytes, locked }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Whether the backing pages were successfully locked into RAM.
    pub fn is_memory_locked(&self) -> bool {
        self.locked
    }

    /// Zero every byte while keeping the buffer allocated.
    pub fn wipe(&mut self) {
        self.bytes[..].zeroize();
    }
}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        self.wipe();
        if self.locked {
            unlock_region(&self.bytes);
        }
    }
}

impl Clone for SecureBuffer {
    fn clone(&self) -> Self {
        Self::from_slice(&self.bytes)
    }
}

impl Default for SecureBuffer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PartialEq for SecureBuffer {
    /// Constant-time comparison of the contents (length is not hidden).
    fn eq(&self, other: &Self) -> bool {
        self.bytes.len() == other.bytes.len() && bool::from(self.bytes.ct_eq(&other.bytes))
    }
}

impl Eq for SecureBuffer {}

impl fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl From<&[u8]> for SecureBuffer {
    fn from(src: &[u8]) -> Self {
        Self::from_slice(src)
    }
}

impl From<&str> for SecureBuffer {
    fn from(src: &str) -> Self {
        Self::from_slice(src.as_bytes())
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn lock_region(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    // SAFETY: the pointer and length describe a live heap allocation owned by
    // the caller. mlock only changes paging behaviour, never the contents.
    let rc = unsafe { libc::mlock(bytes.as_ptr().cast(), bytes.len()) };
    if rc != 0 {
        debug!(
            len = bytes.len(),
            error = %std::io::Error::last_os_error(),
            "mlock failed, continuing without memory lock"
        );
    }
    rc == 0
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn unlock_region(bytes: &[u8]) {
    // SAFETY: same allocation that was passed to mlock in lock_region.
    // Pages shared with another locked allocation are unlocked too; locking
    // is advisory here and the bytes were already zeroed.
    let _ = unsafe { libc::munlock(bytes.as_ptr().cast(), bytes.len()) };
}

#[cfg(not(unix))]
fn lock_region(_bytes: &[u8]) -> bool {
    false
}

#[cfg(not(unix))]
fn unlock_region(_bytes: &[u8]) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let buffer = SecureBuffer::new(32);
        assert_eq!(buffer.len(), 32);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_slice_copies_contents() {
        let buffer = SecureBuffer::from_slice(b"secret");
        assert_eq!(buffer.as_slice(), b"secret");
    }

    #[test]
    fn test_from_vec_takes_contents() {
        let source = vec![7u8; 16];
        let buffer = SecureBuffer::from_vec(source);
        assert_eq!(buffer.as_slice(), &[7u8; 16]);
    }

    #[test]
    fn test_wipe_zeroes_all_bytes() {
        let mut buffer = SecureBuffer::from_slice(&[0xAB; 64]);
        buffer.wipe();
        assert_eq!(buffer.len(), 64);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_equality_is_content_based() {
        let a = SecureBuffer::from_slice(b"abc");
        let b = SecureBuffer::from_slice(b"abc");
        let c = SecureBuffer::from_slice(b"abd");
        let d = SecureBuffer::from_slice(b"ab");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_debug_is_redacted() {
        let buffer = SecureBuffer::from_slice(b"hunter2");
        let rendered = format!("{buffer:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = SecureBuffer::default();
        assert!(buffer.is_empty());
        assert!(!buffer.is_memory_locked());
    }
}
