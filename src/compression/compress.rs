use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    LZ4,      // Fast block compression, size prepended
}

impl CompressionType {
    pub fn to_byte(self) -> u8 {
        match self {
            CompressionType::None => 0,
            CompressionType::LZ4 => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::LZ4),
            other => Err(Error::corrupted(format!("unknown compression type {}", other))),
        }
    }
}

/// Compress raw byte data
pub fn compress(data: &[u8], compression: CompressionType) -> Vec<u8> {
    match compression {
        CompressionType::None => data.to_vec(),
        CompressionType::LZ4 => lz4_flex::compress_prepend_size(data),
    }
}

pub fn decompress(data: &[u8], compression: CompressionType) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::LZ4 => lz4_flex::decompress_size_prepended(data)
            .map_err(|e| Error::new(ErrorKind::Corrupted, format!("LZ4 block: {}", e))),
    }
}
