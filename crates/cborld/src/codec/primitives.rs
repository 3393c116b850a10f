//! Unsigned LEB128 varints.
//!
//! Only the legacy-range framing uses these: a registry entry id that does
//! not fit in the tag is split across the tag byte and a payload byte string.

use crate::error::Error;
use crate::limits::MAX_VARINT_BYTES;

// =============================================================================
// DECODING
// =============================================================================

/// Reader over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8, Error> {
        let byte = *self.data.get(self.pos).ok_or(Error::MalformedVarint)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads an unsigned varint (LEB128).
    pub fn read_varint(&mut self) -> Result<u64, Error> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for _ in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte()?;
            let value = (byte & 0x7F) as u64;

            // Check for overflow
            if shift == 63 && value > 1 {
                return Err(Error::MalformedVarint);
            }

            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }

        Err(Error::MalformedVarint)
    }
}

/// Decodes a varint that must span `bytes` exactly, in minimal form.
pub fn decode_exact_varint(bytes: &[u8]) -> Result<u64, Error> {
    let mut reader = Reader::new(bytes);
    let value = reader.read_varint()?;
    if !reader.is_empty() {
        return Err(Error::MalformedVarint);
    }
    if encode_varint(value) != bytes {
        return Err(Error::MalformedVarint);
    }
    Ok(value)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for varint output.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Writes an unsigned varint (LEB128).
    #[inline]
    pub fn write_varint(&mut self, mut value: u64) {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }
}

/// Encodes a value as a minimal unsigned varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.write_varint(value);
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_roundtrip() {
        let test_values = [0u64, 1, 127, 128, 255, 256, 16383, 16384, u64::MAX];

        for v in test_values {
            let mut writer = Writer::new();
            writer.write_varint(v);

            let mut reader = Reader::new(writer.as_bytes());
            let decoded = reader.read_varint().unwrap();
            assert_eq!(v, decoded, "failed for {}", v);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_varint_lengths() {
        assert_eq!(encode_varint(127), vec![0x7f]);
        assert_eq!(encode_varint(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xac, 0x02]);
        assert_eq!(encode_varint(u64::MAX).len(), MAX_VARINT_BYTES);
    }

    #[test]
    fn test_varint_too_long() {
        let data = [0x80u8; 11];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_varint(), Err(Error::MalformedVarint));
    }

    #[test]
    fn test_varint_overflow() {
        let mut data = [0xffu8; 10];
        data[9] = 0x02;
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_varint(), Err(Error::MalformedVarint));
    }

    #[test]
    fn test_varint_truncated() {
        let mut reader = Reader::new(&[0x80]);
        assert_eq!(reader.read_varint(), Err(Error::MalformedVarint));
    }

    #[test]
    fn test_exact_varint_rejects_trailing_bytes() {
        assert_eq!(decode_exact_varint(&[0x80, 0x01]), Ok(128));
        assert_eq!(decode_exact_varint(&[0x7f, 0x00]), Err(Error::MalformedVarint));
    }

    #[test]
    fn test_exact_varint_rejects_non_minimal() {
        // 0x80 0x00 decodes to 0 but is not the minimal encoding.
        assert_eq!(decode_exact_varint(&[0x80, 0x00]), Err(Error::MalformedVarint));
    }
}
