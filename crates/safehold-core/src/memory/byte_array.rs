use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{SecureBuffer, SecureMemoryError};

/// Fixed-capacity secret buffer for interactively typed input.
///
/// Input handlers append and erase single bytes while another path may read
/// or flush the contents, so every mutation goes through one `Mutex`. Unlike
/// the other primitives this one is typically shared (`Arc<SecureByteArray>`),
/// which is why it also supports an explicit [`release`](Self::release):
/// after release every operation fails with
/// [`SecureMemoryError::UseAfterRelease`].
pub struct SecureByteArray {
    state: Mutex<ByteArrayState>,
}

struct ByteArrayState {
    /// `None` once released.
    buffer: Option<SecureBuffer>,
    len: usize,
}

impl SecureByteArray {
    /// Create an empty array able to hold `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(ByteArrayState {
                buffer: Some(SecureBuffer::new(capacity)),
                len: 0,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ByteArrayState>, SecureMemoryError> {
        self.state.lock().map_err(|_| SecureMemoryError::LockPoisoned)
    }

    pub fn capacity(&self) -> Result<usize, SecureMemoryError> {
        let state = self.lock()?;
        state.live().map(SecureBuffer::len)
    }

    pub fn len(&self) -> Result<usize, SecureMemoryError> {
        let state = self.lock()?;
        state.live()?;
        Ok(state.len)
    }

    pub fn is_empty(&self) -> Result<bool, SecureMemoryError> {
        self.len().map(|len| len == 0)
    }

    /// Append one byte.
    pub fn push(&self, byte: u8) -> Result<(), SecureMemoryError> {
        let mut state = self.lock()?;
        let len = state.len;
        let buffer = state.live_mut()?;
        if len == buffer.len() {
            return Err(SecureMemoryError::Full {
                capacity: buffer.len(),
            });
        }
        buffer.as_mut_slice()[len] = byte;
        state.len += 1;
        Ok(())
    }

    /// Remove the last byte, zeroing its slot. Returns `false` when empty.
    pub fn pop(&self) -> Result<bool, SecureMemoryError> {
        let mut state = self.lock()?;
        if state.len == 0 {
            state.live()?;
            return Ok(false);
        }
        let last = state.len - 1;
        state.live_mut()?.as_mut_slice()[last] = 0;
        state.len = last;
        Ok(true)
    }

    /// Zero the whole region and reset the length.
    pub fn clear(&self) -> Result<(), SecureMemoryError> {
        let mut state = self.lock()?;
        state.live_mut()?.wipe();
        state.len = 0;
        Ok(())
    }

    /// Run `f` over the live bytes while holding the lock.
    pub fn with_bytes<F, R>(&self, f: F) -> Result<R, SecureMemoryError>
    where
        F: FnOnce(&[u8]) -> R,
    {
        let state = self.lock()?;
        let buffer = state.live()?;
        Ok(f(&buffer.as_slice()[..state.len]))
    }

    /// Copy the live bytes into a length-matched [`SecureBuffer`].
    pub fn to_buffer(&self) -> Result<SecureBuffer, SecureMemoryError> {
        self.with_bytes(SecureBuffer::from_slice)
    }

    /// Wipe and free the region. Calling this more than once is harmless.
    ///
    /// Release still happens if a previous holder of the lock panicked.
    pub fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.buffer = None;
        state.len = 0;
    }

    pub fn is_released(&self) -> bool {
        !matches!(self.state.lock(), Ok(state) if state.buffer.is_some())
    }
}

impl ByteArrayState {
    fn live(&self) -> Result<&SecureBuffer, SecureMemoryError> {
        self.buffer.as_ref().ok_or(SecureMemoryError::UseAfterRelease)
    }

    fn live_mut(&mut self) -> Result<&mut SecureBuffer, SecureMemoryError> {
        self.buffer.as_mut().ok_or(SecureMemoryError::UseAfterRelease)
    }
}

impl fmt::Debug for SecureByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureByteArray")
            .field("len", &self.len().ok())
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_push_pop() {
        let array = SecureByteArray::with_capacity(4);
        array.push(b'a').unwrap();
        array.push(b'b').unwrap();
        assert_eq!(array.len().unwrap(), 2);

        assert!(array.pop().unwrap());
        array.with_bytes(|bytes| assert_eq!(bytes, b"a")).unwrap();

        assert!(array.pop().unwrap());
        assert!(!array.pop().unwrap());
    }

    #[test]
    fn test_pop_zeroes_vacated_slot() {
        let array = SecureByteArray::with_capacity(2);
        array.push(0xFF).unwrap();
        array.push(0xEE).unwrap();
        array.pop().unwrap();

        let state = array.state.lock().unwrap();
        assert_eq!(state.buffer.as_ref().unwrap().as_slice(), &[0xFF, 0x00]);
    }

    #[test]
    fn test_full() {
        let array = SecureByteArray::with_capacity(1);
        array.push(1).unwrap();
        assert_eq!(array.push(2), Err(SecureMemoryError::Full { capacity: 1 }));
    }

    #[test]
    fn test_clear_zeroes_region() {
        let array = SecureByteArray::with_capacity(8);
        for b in b"password" {
            array.push(*b).unwrap();
        }
        array.clear().unwrap();
        assert!(array.is_empty().unwrap());

        let state = array.state.lock().unwrap();
        assert!(state.buffer.as_ref().unwrap().as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_use_after_release() {
        let array = SecureByteArray::with_capacity(8);
        array.push(1).unwrap();
        assert!(!array.is_released());
        array.release();
        array.release();

        assert!(array.is_released());
        assert_eq!(array.push(2), Err(SecureMemoryError::UseAfterRelease));
        assert_eq!(array.pop(), Err(SecureMemoryError::UseAfterRelease));
        assert_eq!(array.len(), Err(SecureMemoryError::UseAfterRelease));
        assert!(matches!(
            array.to_buffer(),
            Err(SecureMemoryError::UseAfterRelease)
        ));
    }

    #[test]
    fn test_to_buffer_snapshot() {
        let array = SecureByteArray::with_capacity(16);
        for b in b"abc" {
            array.push(*b).unwrap();
        }
        let snapshot = array.to_buffer().unwrap();
        array.clear().unwrap();
        assert_eq!(snapshot.as_slice(), b"abc");
    }

    #[test]
    fn test_concurrent_input_and_flush() {
        let array = Arc::new(SecureByteArray::with_capacity(1000));

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let array = Arc::clone(&array);
                thread::spawn(move || {
                    for _ in 0..100 {
                        array.push(b'x').unwrap();
                    }
                })
            })
            .collect();

        let reader = {
            let array = Arc::clone(&array);
            thread::spawn(move || {
                for _ in 0..100 {
                    array.with_bytes(|bytes| assert!(bytes.iter().all(|&b| b == b'x'))).unwrap();
                }
            })
        };

        for handle in writers {
            handle.join().unwrap();
        }
        reader.join().unwrap();
        assert_eq!(array.len().unwrap(), 400);
    }
}
