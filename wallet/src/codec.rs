//! Binary cursor shared by the credential, transaction, and block codecs.
//!
//! All integers on the wire are big-endian. Amounts use the variable-length
//! "varint-F" form: seven bits per byte, most significant group first, high
//! bit set on every byte except the last.

use thiserror::Error;

use crate::config::ADDRESS_LENGTH;

/// Ran out of input while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("varint does not fit in 64 bits")]
    VarintOverflow,
}

/// Longest varint-F encoding of a `u64`.
const MAX_VARINT_LENGTH: usize = 10;

/// A forward-only reader over a byte slice.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The unread tail, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.data.get(self.pos).copied().ok_or(DecodeError::UnexpectedEof {
            needed: 1,
            remaining: 0,
        })
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_hash(&mut self) -> Result<[u8; ADDRESS_LENGTH], DecodeError> {
        self.read_array()
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// A 48-bit big-endian integer, as used for transaction timestamps.
    pub fn read_u48(&mut self) -> Result<u64, DecodeError> {
        let bytes: [u8; 6] = self.read_array()?;
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut value: u64 = 0;
        for _ in 0..MAX_VARINT_LENGTH {
            let byte = self.read_u8()?;
            if value > u64::MAX >> 7 {
                return Err(DecodeError::VarintOverflow);
            }
            value = (value << 7) | u64::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::VarintOverflow)
    }
}

/// Appends the low 48 bits of `value`, big-endian.
pub(crate) fn write_u48(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_be_bytes()[2..]);
}

/// Appends `value` in varint-F form.
pub(crate) fn write_varint(buf: &mut Vec<u8>, value: u64) {
    let mut groups = [0u8; MAX_VARINT_LENGTH];
    let mut n = 0;
    let mut v = value;
    loop {
        groups[n] = (v & 0x7f) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        buf.push(groups[i] | continuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_varint(&mut buf, value);
        buf
    }

    #[test]
    fn varint_known_encodings() {
        assert_eq!(varint(0), vec![0x00]);
        assert_eq!(varint(0x7f), vec![0x7f]);
        assert_eq!(varint(0x80), vec![0x81, 0x00]);
        assert_eq!(varint(300), vec![0x82, 0x2c]);
    }

    #[test]
    fn varint_extremes_decode() {
        for value in [0, 1, 127, 128, 100_000_000, u64::MAX] {
            let buf = varint(value);
            let mut reader = Reader::new(&buf);
            assert_eq!(reader.read_varint().unwrap(), value);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn unterminated_varint_is_truncated() {
        let mut reader = Reader::new(&[0x81, 0x80]);
        assert!(matches!(
            reader.read_varint(),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn overlong_varint_is_rejected() {
        let buf = [0xffu8; 11];
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_varint(), Err(DecodeError::VarintOverflow));
    }

    #[test]
    fn ten_byte_varint_must_fit_in_u64() {
        // 0x81 leads u64::MAX; 0x82 would need a 65th bit.
        let mut fits = vec![0x81u8];
        fits.extend([0xff; 8]);
        fits.push(0x7f);
        assert_eq!(Reader::new(&fits).read_varint(), Ok(u64::MAX));

        let mut spills = vec![0x82u8];
        spills.extend([0x80; 8]);
        spills.push(0x00);
        assert_eq!(
            Reader::new(&spills).read_varint(),
            Err(DecodeError::VarintOverflow)
        );
    }

    #[test]
    fn u48_keeps_low_six_bytes() {
        let mut buf = Vec::new();
        write_u48(&mut buf, 0x0102_0304_0506);
        assert_eq!(buf, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(Reader::new(&buf).read_u48().unwrap(), 0x0102_0304_0506);
    }

    #[test]
    fn short_read_reports_sizes() {
        let mut reader = Reader::new(&[1, 2]);
        assert_eq!(
            reader.read_u32(),
            Err(DecodeError::UnexpectedEof {
                needed: 4,
                remaining: 2
            })
        );
    }
}
