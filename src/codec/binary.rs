use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::codec::Codec;
use crate::compression::compress::{compress, decompress, CompressionType};
use crate::compression::delta::DeltaEncoder;
use crate::core::error::{Error, Result};
use crate::index::inverted::{Term, TermInfo};
use crate::storage::segment::{FieldStats, Segment, StoredField, TermEntry};

const MAGIC: &[u8; 4] = b"LXSG";
const VERSION: u32 = 1;
// magic + version + compression byte
const HEADER_LEN: usize = 4 + 4 + 1;
const FOOTER_LEN: usize = 4;

/// Compact segment format
///
/// ```text
/// [ "LXSG" | version u32 LE | compression u8 ]
/// [ body: bincode, compressed as a single block ]
/// [ CRC32 u32 LE of everything above ]
/// ```
///
/// Postings inside the body are delta + vbyte encoded per term.
#[derive(Debug, Clone, Copy)]
pub struct BinaryCodec {
    pub compression: CompressionType,
}

impl BinaryCodec {
    pub fn new(compression: CompressionType) -> Self {
        BinaryCodec { compression }
    }
}

impl Default for BinaryCodec {
    fn default() -> Self {
        BinaryCodec::new(CompressionType::LZ4)
    }
}

#[derive(Serialize, Deserialize)]
struct SegmentBody {
    name: String,
    doc_count: u32,
    fields: Vec<(String, FieldStats)>,
    terms: Vec<TermBlock>,
    stored: Vec<Vec<StoredField>>,
}

#[derive(Serialize, Deserialize)]
struct TermBlock {
    field: String,
    bytes: Vec<u8>,
    info: TermInfo,
    postings: Vec<u8>,
}

impl Codec for BinaryCodec {
    fn name(&self) -> &str {
        "Binary"
    }

    fn extension(&self) -> &str {
        "lxb"
    }

    fn encode(&self, segment: &Segment) -> Result<Vec<u8>> {
        let body = SegmentBody {
            name: segment.name.clone(),
            doc_count: segment.doc_count,
            fields: segment.fields.iter()
                .map(|(name, stats)| (name.clone(), stats.clone()))
                .collect(),
            terms: segment.terms.iter()
                .map(|(term, entry)| TermBlock {
                    field: term.field.clone(),
                    bytes: term.bytes.clone(),
                    info: entry.info,
                    postings: DeltaEncoder::encode_postings(&entry.postings),
                })
                .collect(),
            stored: segment.stored.clone(),
        };
        let raw = bincode::serialize(&body)?;
        let packed = compress(&raw, self.compression);

        let mut out = Vec::with_capacity(HEADER_LEN + packed.len() + FOOTER_LEN);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.push(self.compression.to_byte());
        out.extend_from_slice(&packed);
        let checksum = crc32fast::hash(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
        Ok(out)
    }

    /// Accepts either compression regardless of how this codec is configured
    fn decode(&self, data: &[u8]) -> Result<Segment> {
        if data.len() < HEADER_LEN + FOOTER_LEN {
            return Err(Error::corrupted(format!("binary segment too short: {} bytes", data.len())));
        }
        let (content, footer) = data.split_at(data.len() - FOOTER_LEN);
        let stored_checksum = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
        let actual = crc32fast::hash(content);
        if stored_checksum != actual {
            return Err(Error::corrupted(format!(
                "binary segment checksum mismatch: stored {:08x}, computed {:08x}", stored_checksum, actual
            )));
        }

        if &content[..4] != MAGIC {
            return Err(Error::corrupted("not a binary segment file"));
        }
        let version = u32::from_le_bytes([content[4], content[5], content[6], content[7]]);
        if version != VERSION {
            return Err(Error::corrupted(format!("unsupported binary segment version {}", version)));
        }
        let compression = CompressionType::from_byte(content[8])?;

        let raw = decompress(&content[HEADER_LEN..], compression)?;
        let body: SegmentBody = bincode::deserialize(&raw)
            .map_err(|e| Error::corrupted(format!("binary segment body: {}", e)))?;

        let mut fields = BTreeMap::new();
        for (name, stats) in body.fields {
            if fields.insert(name, stats).is_some() {
                return Err(Error::corrupted("duplicate field statistics"));
            }
        }

        let mut terms = BTreeMap::new();
        for block in body.terms {
            let postings = DeltaEncoder::decode_postings(&block.postings, block.info.doc_freq)?;
            let term = Term::new(block.field, block.bytes);
            if terms.insert(term, TermEntry { info: block.info, postings }).is_some() {
                return Err(Error::corrupted("duplicate term in dictionary"));
            }
        }

        Ok(Segment {
            name: body.name,
            doc_count: body.doc_count,
            fields,
            terms,
            stored: body.stored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::simple_text::SimpleTextCodec;
    use crate::codec::test_support::sample_segment;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_encode_is_stable_across_decode() {
        for codec in [BinaryCodec::default(), BinaryCodec::new(CompressionType::None)] {
            let segment = sample_segment();
            let first = codec.encode(&segment).unwrap();
            let decoded = codec.decode(&first).unwrap();
            assert_eq!(decoded, segment);
            assert_eq!(codec.encode(&decoded).unwrap(), first);
        }
    }

    #[test]
    fn test_header_layout() {
        let encoded = BinaryCodec::default().encode(&sample_segment()).unwrap();
        assert_eq!(&encoded[..4], b"LXSG");
        assert_eq!(&encoded[4..8], &1u32.to_le_bytes());
        assert_eq!(encoded[8], CompressionType::LZ4.to_byte());
    }

    #[test]
    fn test_damage_is_detected() {
        let codec = BinaryCodec::default();
        let encoded = codec.encode(&sample_segment()).unwrap();

        let mut flipped = encoded.clone();
        let middle = flipped.len() / 2;
        flipped[middle] ^= 0x40;
        assert!(codec.decode(&flipped).unwrap_err().is(ErrorKind::Corrupted));

        let truncated = &encoded[..encoded.len() - 1];
        assert!(codec.decode(truncated).unwrap_err().is(ErrorKind::Corrupted));
        assert!(codec.decode(b"LX").unwrap_err().is(ErrorKind::Corrupted));
    }

    #[test]
    fn test_rejects_other_formats() {
        let text = SimpleTextCodec.encode(&sample_segment()).unwrap();
        assert!(BinaryCodec::default().decode(&text).is_err());
    }
}
