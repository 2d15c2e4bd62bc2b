use std::collections::BTreeMap;
use fst::{IntoStreamer, Map, MapBuilder};
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document};
use crate::index::inverted::{Term, FIELD_SEPARATOR};
use crate::storage::segment::{FieldStats, Segment, StoredField, TermEntry};

/// Read side of one committed segment inside a `DirectoryReader`.
///
/// The term dictionary is an FST from `field \0 bytes` to the ordinal of the
/// term's entry; doc ids handed out by this reader are local, callers add
/// `doc_base`.
pub struct SegmentReader {
    name: String,
    doc_base: u32,
    doc_count: u32,
    dictionary: Map<Vec<u8>>,
    entries: Vec<TermEntry>,
    fields: BTreeMap<String, FieldStats>,
    stored: Vec<Vec<StoredField>>,
}

impl SegmentReader {
    pub fn new(segment: Segment, doc_base: u32) -> Result<Self> {
        let Segment { name, doc_count, fields, terms, stored } = segment;

        // BTreeMap order on Term equals byte order on its key
        let mut builder = MapBuilder::memory();
        let mut entries = Vec::with_capacity(terms.len());
        for (ordinal, (term, entry)) in terms.into_iter().enumerate() {
            builder.insert(term.key(), ordinal as u64)?;
            entries.push(entry);
        }
        let dictionary = Map::new(builder.into_inner()?)?;

        Ok(SegmentReader {
            name,
            doc_base,
            doc_count,
            dictionary,
            entries,
            fields,
            stored,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc_base(&self) -> u32 {
        self.doc_base
    }

    pub fn max_doc(&self) -> u32 {
        self.doc_count
    }

    pub fn term_count(&self) -> usize {
        self.entries.len()
    }

    pub fn term(&self, term: &Term) -> Option<&TermEntry> {
        self.dictionary.get(term.key())
            .and_then(|ordinal| self.entries.get(ordinal as usize))
    }

    pub fn field_stats(&self, field: &str) -> Option<&FieldStats> {
        self.fields.get(field)
    }

    pub fn field_length(&self, field: &str, doc: u32) -> u32 {
        self.fields.get(field).map(|stats| stats.length(doc)).unwrap_or(0)
    }

    /// Stored fields of a local doc
    pub fn document(&self, doc: u32) -> Result<Document> {
        let stored = self.stored.get(doc as usize).ok_or_else(|| {
            Error::corrupted(format!("segment {} has no stored fields for doc {}", self.name, doc))
        })?;
        Ok(Segment::stored_document(stored))
    }

    /// Dictionary keys of `field`, ascending
    pub fn field_terms(&self, field: &str) -> fst::map::Stream<'_> {
        let mut lower = field.as_bytes().to_vec();
        lower.push(FIELD_SEPARATOR);
        let mut upper = field.as_bytes().to_vec();
        upper.push(FIELD_SEPARATOR + 1);
        self.dictionary.range().ge(lower).lt(upper).into_stream()
    }

    /// Local id of a reader-level doc that falls inside this segment
    pub fn local_doc(&self, doc: DocId) -> Option<u32> {
        doc.0.checked_sub(self.doc_base).filter(|local| *local < self.doc_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fst::Streamer;
    use crate::codec::test_support::sample_segment;

    fn field_term_count(reader: &SegmentReader, field: &str) -> usize {
        let mut stream = reader.field_terms(field);
        let mut count = 0;
        while stream.next().is_some() {
            count += 1;
        }
        count
    }

    #[test]
    fn test_dictionary_lookup() {
        let reader = SegmentReader::new(sample_segment(), 10).unwrap();
        let entry = reader.term(&Term::text("title", "hello")).unwrap();
        assert_eq!(entry.info.doc_freq, 1);
        assert_eq!(entry.postings.postings[0].term_freq, 2);
        assert!(reader.term(&Term::text("title", "absent")).is_none());
        assert!(reader.term(&Term::text("missing", "hello")).is_none());
        assert!(reader.term(&Term::new("blob", vec![0, 255, b' ', b'%', b'\n'])).is_some());
    }

    #[test]
    fn test_field_terms_stay_inside_field() {
        let reader = SegmentReader::new(sample_segment(), 0).unwrap();
        let mut stream = reader.field_terms("title");
        let mut keys = Vec::new();
        while let Some((key, _)) = stream.next() {
            keys.push(Term::from_key(key).unwrap().as_str().unwrap().to_string());
        }
        assert_eq!(keys, vec!["café", "hello", "naïve", "rust", "world"]);
        assert_eq!(field_term_count(&reader, "body"), 1);
        assert_eq!(field_term_count(&reader, "nope"), 0);
    }

    #[test]
    fn test_doc_base_translation() {
        let reader = SegmentReader::new(sample_segment(), 10).unwrap();
        assert_eq!(reader.local_doc(DocId(9)), None);
        assert_eq!(reader.local_doc(DocId(10)), Some(0));
        assert_eq!(reader.local_doc(DocId(12)), Some(2));
        assert_eq!(reader.local_doc(DocId(13)), None);
        assert_eq!(reader.document(0).unwrap().get_text("title"), Some("Hello world, hello Rust"));
        assert_eq!(reader.field_length("title", 0), 4);
        assert_eq!(reader.field_length("title", 1), 0);
    }
}
