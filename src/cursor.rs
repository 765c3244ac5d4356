//! Bounds checked reads over a borrowed byte buffer.
//!
//! A [`ByteCursor`] never owns or mutates the buffer. All reads are at absolute offsets and are
//! big-endian. A read whose range goes past the end of the buffer fails with
//! [`Error::TooShort`], which aborts decoding of the enclosing message.

use crate::errors::Error;

#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }

    /// Number of bytes from `offset` till the end of the buffer, 0 if `offset` is past the end.
    pub fn remaining(&self, offset: usize) -> usize {
        self.bytes.len().saturating_sub(offset)
    }

    fn check(&self, offset: usize, width: usize) -> Result<(), Error> {
        match offset.checked_add(width) {
            Some(end) if end <= self.bytes.len() => Ok(()),
            _ => Err(Error::TooShort {
                required: offset.saturating_add(width),
                available: self.bytes.len(),
                data: hex::encode(self.bytes.get(offset..).unwrap_or_default()),
            }),
        }
    }

    pub fn read_bytes(&self, offset: usize, length: usize) -> Result<&'a [u8], Error> {
        self.check(offset, length)?;
        Ok(&self.bytes[offset..offset + length])
    }

    pub fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], Error> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.read_bytes(offset, N)?);
        Ok(out)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, Error> {
        self.check(offset, 1)?;
        Ok(self.bytes[offset])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(self.read_array(offset)?))
    }

    pub fn read_u24(&self, offset: usize) -> Result<u32, Error> {
        let b: [u8; 3] = self.read_array(offset)?;
        Ok((b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32)
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(self.read_array(offset)?))
    }

    pub fn read_i32(&self, offset: usize) -> Result<i32, Error> {
        Ok(i32::from_be_bytes(self.read_array(offset)?))
    }

    /// 48 bit unsigned value, as used by TSIG "time signed".
    pub fn read_u48(&self, offset: usize) -> Result<u64, Error> {
        let b: [u8; 6] = self.read_array(offset)?;
        Ok(b.iter().fold(0_u64, |acc, x| acc << 8 | *x as u64))
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64, Error> {
        Ok(u64::from_be_bytes(self.read_array(offset)?))
    }

    /// A cursor over `length` bytes starting at `offset`. Offsets into the returned cursor are
    /// relative to `offset`.
    pub fn window(&self, offset: usize, length: usize) -> Result<ByteCursor<'a>, Error> {
        Ok(ByteCursor::new(self.read_bytes(offset, length)?))
    }
}

impl<'a> From<&'a [u8]> for ByteCursor<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_reads() {
        let bytes = hex::decode("0102030405060708090a").unwrap();
        let cursor = ByteCursor::new(&bytes);

        assert_eq!(cursor.read_u8(0), Ok(0x01));
        assert_eq!(cursor.read_u16(1), Ok(0x0203));
        assert_eq!(cursor.read_u24(0), Ok(0x010203));
        assert_eq!(cursor.read_u32(2), Ok(0x03040506));
        assert_eq!(cursor.read_u48(4), Ok(0x05060708090a));
        assert_eq!(cursor.read_u64(2), Ok(0x030405060708090a));
        assert_eq!(cursor.read_bytes(8, 2), Ok(&bytes[8..]));
    }

    #[test]
    fn out_of_bounds_reads_fail() {
        let bytes = [0xde, 0xad, 0xbe];
        let cursor = ByteCursor::new(&bytes);

        assert!(cursor.read_u32(0).is_err());
        assert!(cursor.read_u8(3).is_err());
        assert!(cursor.read_bytes(1, 3).is_err());
        assert!(cursor.read_bytes(usize::MAX, 2).is_err());
        assert_eq!(
            cursor.read_u16(2),
            Err(Error::TooShort {
                required: 4,
                available: 3,
                data: "be".to_string(),
            })
        );
        // An empty read at the end is fine.
        assert_eq!(cursor.read_bytes(3, 0), Ok(&[][..]));
    }

    #[test]
    fn remaining_saturates() {
        let bytes = [0_u8; 12];
        let cursor = ByteCursor::new(&bytes);

        assert_eq!(cursor.remaining(0), 12);
        assert_eq!(cursor.remaining(10), 2);
        assert_eq!(cursor.remaining(12), 0);
        assert_eq!(cursor.remaining(40), 0);
    }

    #[test]
    fn window_is_relative() {
        let bytes = hex::decode("00112233445566").unwrap();
        let cursor = ByteCursor::new(&bytes);
        let window = cursor.window(2, 3).unwrap();

        assert_eq!(window.len(), 3);
        assert_eq!(window.read_u8(0), Ok(0x22));
        assert!(window.read_u8(3).is_err());
        assert!(cursor.window(5, 3).is_err());
    }
}
