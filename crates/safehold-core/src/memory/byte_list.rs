use std::fmt;

use super::{SecureBuffer, SecureMemoryError};

/// Initial capacity of a [`SecureByteList`].
pub const DEFAULT_CAPACITY: usize = 64;

/// Largest allocation a [`SecureByteList`] will grow to.
pub const MAX_CAPACITY: usize = i32::MAX as usize;

/// Growable secret byte buffer backing all serialization.
///
/// Capacity starts at [`DEFAULT_CAPACITY`] and doubles on demand, so it is
/// always `DEFAULT_CAPACITY * 2^n` (clamped to [`MAX_CAPACITY`]). Growing
/// copies the live bytes into a fresh [`SecureBuffer`]; the old one is
/// dropped and therefore wiped.
pub struct SecureByteList {
    buffer: SecureBuffer,
    len: usize,
}

impl SecureByteList {
    pub fn new() -> Self {
        Self {
            buffer: SecureBuffer::new(DEFAULT_CAPACITY),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The live bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.len]
    }

    fn reserve(&mut self, additional: usize) -> Result<(), SecureMemoryError> {
        let required = self
            .len
            .checked_add(additional)
            .filter(|&n| n <= MAX_CAPACITY)
            .ok_or(SecureMemoryError::CapacityExceeded {
                requested: self.len.saturating_add(additional),
                max: MAX_CAPACITY,
            })?;
        if required <= self.capacity() {
            return Ok(());
        }

        let mut capacity = self.capacity().max(DEFAULT_CAPACITY);
        while capacity < required {
            capacity = capacity.saturating_mul(2).min(MAX_CAPACITY);
        }

        let mut grown = SecureBuffer::new(capacity);
        grown.as_mut_slice()[..self.len].copy_from_slice(self.as_slice());
        self.buffer = grown;
        Ok(())
    }

    pub fn push(&mut self, byte: u8) -> Result<(), SecureMemoryError> {
        self.reserve(1)?;
        self.buffer.as_mut_slice()[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Append the UTF-8 encoding of `c`.
    pub fn push_char(&mut self, c: char) -> Result<(), SecureMemoryError> {
        let mut utf8 = [0u8; 4];
        let encoded = c.encode_utf8(&mut utf8);
        let result = self.extend_from_slice(encoded.as_bytes());
        utf8.fill(0);
        result
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), SecureMemoryError> {
        self.reserve(bytes.len())?;
        self.buffer.as_mut_slice()[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Remove the last byte, zeroing its slot.
    pub fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let slot = &mut self.buffer.as_mut_slice()[self.len];
        let byte = *slot;
        *slot = 0;
        Some(byte)
    }

    /// Zero the whole region and reset the length. Capacity is kept.
    pub fn clear(&mut self) {
        self.buffer.wipe();
        self.len = 0;
    }

    /// Overwrite four bytes at `position` with `value` in little-endian order.
    ///
    /// The target must lie entirely within the live bytes.
    pub fn patch_u32_le(&mut self, position: usize, value: u32) -> Result<(), SecureMemoryError> {
        let end = position
            .checked_add(4)
            .filter(|&end| end <= self.len)
            .ok_or(SecureMemoryError::OutOfBounds {
                position,
                len: self.len,
            })?;
        self.buffer.as_mut_slice()[position..end].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Copy the live bytes into a length-matched [`SecureBuffer`].
    pub fn to_buffer(&self) -> SecureBuffer {
        SecureBuffer::from_slice(self.as_slice())
    }

    /// Consume the list, returning its live bytes. The spare capacity is wiped.
    pub fn into_buffer(self) -> SecureBuffer {
        self.to_buffer()
    }
}

impl Default for SecureByteList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecureByteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureByteList")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
