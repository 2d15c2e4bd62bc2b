use crate::core::error::{Error, ErrorKind, Result};

/// Variable byte encoding for integers (best for small integers)
pub struct VByteEncoder;

impl VByteEncoder {
    /// Encode single u32 value
    /// Values < 128 use 1 byte, < 16384 use 2 bytes, etc.
    pub fn encode_u32(output: &mut Vec<u8>, mut value: u32) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);  // Set continuation bit
            value >>= 7;
        }
        output.push(value as u8);  // Last byte without continuation bit
    }

    /// Decode single u32 value, returns (value, bytes_consumed)
    pub fn decode_u32(input: &[u8]) -> Result<(u32, usize)> {
        let mut value = 0u32;
        let mut shift = 0;

        for (i, &byte) in input.iter().enumerate() {
            if shift == 28 && byte & 0x70 != 0 {
                return Err(Error::new(ErrorKind::Corrupted, "VByte overflow".to_string()));
            }
            value |= ((byte & 127) as u32) << shift;

            if byte & 128 == 0 {  // No continuation bit
                return Ok((value, i + 1));
            }

            shift += 7;
            if shift > 28 {  // Max 5 bytes for u32
                return Err(Error::new(ErrorKind::Corrupted, "VByte overflow".to_string()));
            }
        }

        Err(Error::new(ErrorKind::Corrupted, "Incomplete VByte".to_string()))
    }
}

/// Sequential reader over a vbyte stream
pub struct VByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        VByteReader { data, pos: 0 }
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let (value, consumed) = VByteEncoder::decode_u32(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_sizes() {
        for (value, size) in [(0u32, 1usize), (127, 1), (128, 2), (16_383, 2), (16_384, 3), (u32::MAX, 5)] {
            let mut out = Vec::new();
            VByteEncoder::encode_u32(&mut out, value);
            assert_eq!(out.len(), size, "value {}", value);
            assert_eq!(VByteEncoder::decode_u32(&out).unwrap(), (value, size));
        }
    }

    #[test]
    fn test_truncated_and_overlong_input() {
        assert!(VByteEncoder::decode_u32(&[0x80]).is_err());
        assert!(VByteEncoder::decode_u32(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]).is_err());
        assert!(VByteEncoder::decode_u32(&[0xff, 0xff, 0xff, 0xff, 0x7f]).is_err());
    }

    #[test]
    fn test_reader_walks_stream() {
        let mut out = Vec::new();
        for v in [5u32, 300, 0] {
            VByteEncoder::encode_u32(&mut out, v);
        }
        let mut reader = VByteReader::new(&out);
        assert_eq!(reader.read_u32().unwrap(), 5);
        assert_eq!(reader.read_u32().unwrap(), 300);
        assert_eq!(reader.read_u32().unwrap(), 0);
        assert!(reader.is_exhausted());
        assert!(reader.read_u32().is_err());
    }
}
