use super::WireError;
use crate::memory::SecureByteList;

/// Position of an open record whose length prefix is still a placeholder.
#[derive(Debug)]
#[must_use = "an open record must be closed with end_record"]
pub struct RecordMark {
    start: usize,
}

/// Append-only encoder for the wire format.
pub trait WireWriter {
    /// Write a bare little-endian `u32`.
    fn write_u32(&mut self, value: u32) -> Result<(), WireError>;

    /// Write `bytes` behind a length prefix.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WireError>;

    /// Write the UTF-8 encoding of `value` behind a length prefix.
    fn write_str(&mut self, value: &str) -> Result<(), WireError> {
        self.write_bytes(value.as_bytes())
    }

    /// Reserve a length prefix for a record whose contents follow.
    fn begin_record(&mut self) -> Result<RecordMark, WireError>;

    /// Back-fill the prefix reserved by `begin_record`.
    fn end_record(&mut self, mark: RecordMark) -> Result<(), WireError>;
}

fn prefix(length: usize) -> Result<u32, WireError> {
    u32::try_from(length).map_err(|_| WireError::LengthOverflow { length })
}

impl WireWriter for SecureByteList {
    fn write_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.extend_from_slice(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.write_u32(prefix(bytes.len())?)?;
        self.extend_from_slice(bytes)?;
        Ok(())
    }

    fn begin_record(&mut self) -> Result<RecordMark, WireError> {
        let start = self.len();
        self.write_u32(0)?;
        Ok(RecordMark { start })
    }

    fn end_record(&mut self, mark: RecordMark) -> Result<(), WireError> {
        let body = self.len() - mark.start - 4;
        self.patch_u32_le(mark.start, prefix(body)?)?;
        Ok(())
    }
}
