use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, Result};
use crate::index::posting::{Posting, PostingList};

/// Delta encoding for postings: (doc gap, freq) pairs, both vbyte
pub struct DeltaEncoder;

impl DeltaEncoder {
    pub fn encode_postings(postings: &PostingList) -> Vec<u8> {
        let mut output = Vec::with_capacity(postings.len() * 2);
        let mut prev = 0u32;
        for (i, posting) in postings.iter().enumerate() {
            let doc = posting.doc_id.0;
            // First doc is written as-is, the rest as gaps
            let gap = if i == 0 { doc } else { doc - prev };
            VByteEncoder::encode_u32(&mut output, gap);
            VByteEncoder::encode_u32(&mut output, posting.term_freq);
            prev = doc;
        }
        output
    }

    /// Decode exactly `count` postings; trailing bytes are an error
    pub fn decode_postings(data: &[u8], count: u32) -> Result<PostingList> {
        let mut reader = VByteReader::new(data);
        let mut postings = Vec::with_capacity(count as usize);
        let mut prev = 0u32;
        for i in 0..count {
            let gap = reader.read_u32()?;
            let freq = reader.read_u32()?;
            let doc = if i == 0 {
                gap
            } else {
                prev.checked_add(gap)
                    .filter(|_| gap > 0)
                    .ok_or_else(|| Error::corrupted("invalid doc gap in postings"))?
            };
            postings.push(Posting::new(doc, freq));
            prev = doc;
        }
        if !reader.is_exhausted() {
            return Err(Error::corrupted("trailing bytes after postings"));
        }
        PostingList::from_postings(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postings_use_gaps() {
        let list = PostingList::from_postings(vec![
            Posting::new(1000, 1),
            Posting::new(1001, 3),
            Posting::new(1200, 1),
        ]).unwrap();
        let encoded = DeltaEncoder::encode_postings(&list);
        // 1000 needs two bytes, the gaps 1 and 199 need one and two
        assert_eq!(encoded.len(), 2 + 1 + 1 + 1 + 2 + 1);
        assert_eq!(DeltaEncoder::decode_postings(&encoded, 3).unwrap(), list);
    }

    #[test]
    fn test_count_mismatch_is_corruption() {
        let list = PostingList::from_postings(vec![Posting::new(0, 1), Posting::new(4, 2)]).unwrap();
        let encoded = DeltaEncoder::encode_postings(&list);
        assert!(DeltaEncoder::decode_postings(&encoded, 1).is_err());
        assert!(DeltaEncoder::decode_postings(&encoded, 3).is_err());
    }

    #[test]
    fn test_zero_gap_is_corruption() {
        let data = [3u8, 1, 0, 1];
        assert!(DeltaEncoder::decode_postings(&data, 2).is_err());
    }
}
