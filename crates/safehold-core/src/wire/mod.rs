//! Length-prefixed binary wire format.
//!
//! Every field is a 4-byte little-endian length followed by that many bytes.
//! A record is a length-prefixed blob holding the concatenation of its own
//! prefixed fields, so any substructure can be skipped without a schema:
//!
//! ```text
//! [len: u32 LE][field 1: [len][bytes]][field 2: [len][bytes]]...
//! ```
//!
//! A collection is a record whose contents are its items' records back to
//! back; an empty collection is therefore `00 00 00 00`. Strings are UTF-8.
//!
//! Writers append to a [`SecureByteList`] so that plaintext never lands in
//! an unwiped allocation. Readers walk a borrowed `&[u8]` with a cursor.

mod reader;
mod writer;

use thiserror::Error;

use crate::memory::{SecureByteList, SecureMemoryError};

pub use reader::WireReader;
pub use writer::{RecordMark, WireWriter};

/// Errors raised while encoding or decoding the wire format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The input ended before a complete field could be read.
    ///
    /// **[INTEGRITY VIOLATION]** Decoding ciphertext under the wrong key
    /// usually lands here first.
    #[error("Truncated input at position {position}: needed {needed} bytes, {available} available")]
    Truncated {
        position: usize,
        needed: usize,
        available: usize,
    },

    /// A field or record is longer than a 32-bit prefix can express.
    #[error("Length {length} does not fit in a 32-bit prefix")]
    LengthOverflow { length: usize },

    /// A string field did not hold valid UTF-8.
    ///
    /// **[INTEGRITY VIOLATION]**
    #[error("Invalid UTF-8 in string field at position {position}")]
    InvalidUtf8 { position: usize },

    /// A record carried a type discriminator this build does not know.
    #[error("Unknown type id {0}")]
    UnknownTypeId(u32),

    /// A record carried a type discriminator other than the one expected.
    #[error("Unexpected type id {found} (expected {expected})")]
    UnexpectedTypeId { expected: u32, found: u32 },

    /// A fixed-size field had the wrong length.
    ///
    /// **[INTEGRITY VIOLATION]**
    #[error("Field at position {position} has length {actual}, expected {expected}")]
    UnexpectedLength {
        position: usize,
        expected: usize,
        actual: usize,
    },

    /// The output buffer could not grow.
    ///
    /// **[SYSTEM ERROR]**
    #[error(transparent)]
    Memory(#[from] SecureMemoryError),
}

/// A value with a wire representation.
///
/// Implementations write exactly one record and read exactly one record, so
/// values compose: a parent record simply calls `write_to` on each child.
pub trait WireFormat: Sized {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError>;

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError>;

    /// Encode into a fresh secure buffer.
    fn to_wire(&self) -> Result<SecureByteList, WireError> {
        let mut out = SecureByteList::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Decode one value from the front of `bytes`.
    ///
    /// Bytes after the value are ignored.
    fn from_wire(bytes: &[u8]) -> Result<Self, WireError> {
        Self::read_from(&mut WireReader::new(bytes))
    }
}
