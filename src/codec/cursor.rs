use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Bounds-checked little-endian reader over a world-save buffer.
///
/// The cursor moves forward on every read and can be repositioned with
/// [`seek`](Self::seek). It knows nothing about tiles or sections.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute offset. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::OffsetOutOfRange { offset, len: self.data.len() });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Read a 7-bit encoded length (LEB128, at most five bytes).
    ///
    /// Bits beyond the 32nd are discarded, so an oversized prefix shows up
    /// as a short read on the string body instead of an overflow.
    pub fn read_7bit_len(&mut self) -> Result<usize> {
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u32).wrapping_shl(shift);
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(value as usize)
    }

    /// Read a string prefixed with its 7-bit encoded byte length.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_7bit_len()?;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if available < needed {
            return Err(Error::UnexpectedEndOfData {
                offset: self.pos,
                needed,
                available,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u8().unwrap(), 0x01);
        assert_eq!(cursor.read_u16().unwrap(), 0x0302);
        assert_eq!(cursor.read_u32().unwrap(), 0x07060504);
        assert!(cursor.is_empty());
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn test_read_u64_and_i32() {
        let mut data = 0x0263_6967_6F6C_6572u64.to_le_bytes().to_vec();
        data.extend_from_slice(&(-5i32).to_le_bytes());
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u64().unwrap(), 0x0263_6967_6F6C_6572);
        assert_eq!(cursor.read_i32().unwrap(), -5);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u8().unwrap();

        match cursor.read_u32() {
            Err(Error::UnexpectedEndOfData { offset, needed, available }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("expected UnexpectedEndOfData, got {other:?}"),
        }
        // A failed read does not move the cursor.
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 4];
        let mut cursor = ByteCursor::new(&data);

        cursor.seek(4).unwrap();
        assert!(cursor.is_empty());
        assert!(matches!(
            cursor.seek(5),
            Err(Error::OffsetOutOfRange { offset: 5, len: 4 })
        ));
        cursor.seek(1).unwrap();
        assert_eq!(cursor.remaining(), 3);
    }

    #[test]
    fn test_read_bool() {
        let data = [0x00, 0x01, 0x7F];
        let mut cursor = ByteCursor::new(&data);
        assert!(!cursor.read_bool().unwrap());
        assert!(cursor.read_bool().unwrap());
        assert!(cursor.read_bool().unwrap());
    }

    #[test]
    fn test_read_string() {
        let data = [0x05, b'h', b'e', b'l', b'l', b'o'];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_string().unwrap(), "hello");
    }

    #[test]
    fn test_read_7bit_len_multibyte() {
        // 300 = 0b1_0010_1100 -> 0xAC 0x02
        let data = [0xAC, 0x02];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_7bit_len().unwrap(), 300);
    }

    #[test]
    fn test_read_string_truncated_body() {
        let data = [0x04, b'a', b'b'];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            cursor.read_string(),
            Err(Error::UnexpectedEndOfData { needed: 4, available: 2, .. })
        ));
    }
}
