use super::WireError;

/// Cursor over a borrowed wire-format buffer.
///
/// Returned slices and strings borrow from the input; nothing is copied
/// unless the caller copies it.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], WireError> {
        if needed > self.remaining() {
            return Err(WireError::Truncated {
                position: self.position,
                needed,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.position..self.position + needed];
        self.position += needed;
        Ok(slice)
    }

    /// Read a bare little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Read a length-prefixed byte span.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], WireError> {
        let start = self.position;
        let length = self.read_u32()? as usize;
        self.take(length).inspect_err(|_| self.position = start)
    }

    /// Read a length-prefixed field that must be exactly `N` bytes long.
    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let position = self.position;
        let bytes = self.read_bytes()?;
        bytes.try_into().map_err(|_| WireError::UnexpectedLength {
            position,
            expected: N,
            actual: bytes.len(),
        })
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<&'a str, WireError> {
        let position = self.position;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 { position })
    }

    /// Read a record and return a reader confined to its contents.
    pub fn read_record(&mut self) -> Result<WireReader<'a>, WireError> {
        self.read_bytes().map(WireReader::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sequence() {
        let data = [3, 0, 0, 0, b'b', b'a', b'r', 2, 0, 0, 0, 1, 2];
        let mut reader = WireReader::new(&data);
        assert_eq!(reader.read_str().unwrap(), "bar");
        assert_eq!(reader.read_bytes().unwrap(), &[1, 2]);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_truncated_prefix() {
        let mut reader = WireReader::new(&[1, 0]);
        assert_eq!(
            reader.read_u32(),
            Err(WireError::Truncated {
                position: 0,
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn test_truncated_body_does_not_advance() {
        let data = [5, 0, 0, 0, 1, 2];
        let mut reader = WireReader::new(&data);
        assert!(matches!(
            reader.read_bytes(),
            Err(WireError::Truncated { needed: 5, available: 2, .. })
        ));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_huge_length_is_truncation_not_panic() {
        let mut reader = WireReader::new(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(reader.read_bytes(), Err(WireError::Truncated { .. })));
    }

    #[test]
    fn test_invalid_utf8() {
        let data = [2, 0, 0, 0, 0xC3, 0x28];
        let mut reader = WireReader::new(&data);
        assert_eq!(reader.read_str(), Err(WireError::InvalidUtf8 { position: 0 }));
    }

    #[test]
    fn test_read_fixed_checks_length() {
        let data = [3, 0, 0, 0, 1, 2, 3];
        assert_eq!(WireReader::new(&data).read_fixed::<3>().unwrap(), [1, 2, 3]);
        assert_eq!(
            WireReader::new(&data).read_fixed::<4>(),
            Err(WireError::UnexpectedLength {
                position: 0,
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_record_is_bounded_and_skips_trailing() {
        // record holding one field plus two trailing bytes, then a sibling
        let data = [
            7, 0, 0, 0, 1, 0, 0, 0, b'x', 0xAA, 0xBB, //
            1, 0, 0, 0, b'y',
        ];
        let mut reader = WireReader::new(&data);
        let mut record = reader.read_record().unwrap();
        assert_eq!(record.read_str().unwrap(), "x");
        assert_eq!(record.remaining(), 2);
        assert_eq!(reader.read_str().unwrap(), "y");
    }
}
