use std::collections::{BTreeMap, HashMap};
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document, FieldValue};
use crate::index::posting::{PostingList, NO_MORE_DOCS};
use crate::storage::segment::{FieldStats, Segment, StoredField, TermEntry};

/// Separates field name from term bytes in dictionary keys.
/// Field names never contain NUL, so keys sort by field then bytes.
pub const FIELD_SEPARATOR: u8 = 0;

/// Term representation: (field, bytes), ordered by field then bytes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub bytes: Vec<u8>,
}

impl Term {
    pub fn new(field: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Term {
            field: field.into(),
            bytes: bytes.into(),
        }
    }

    pub fn text(field: impl Into<String>, text: &str) -> Self {
        Term::new(field, text.as_bytes())
    }

    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes)
            .map_err(|_| Error::new(ErrorKind::Parse, format!("term in field '{}' is not UTF-8", self.field)))
    }

    /// Dictionary key: field bytes, separator, term bytes
    pub fn key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.field.len() + 1 + self.bytes.len());
        key.extend_from_slice(self.field.as_bytes());
        key.push(FIELD_SEPARATOR);
        key.extend_from_slice(&self.bytes);
        key
    }

    pub fn from_key(key: &[u8]) -> Result<Self> {
        let split = key.iter()
            .position(|&b| b == FIELD_SEPARATOR)
            .ok_or_else(|| Error::corrupted("dictionary key without field separator"))?;
        let field = std::str::from_utf8(&key[..split])
            .map_err(|_| Error::corrupted("dictionary key with non UTF-8 field name"))?;
        Ok(Term::new(field, &key[split + 1..]))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.field, String::from_utf8_lossy(&self.bytes))
    }
}

/// Term metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    pub doc_freq: u32,
    pub total_term_freq: u64,
}

/// Uncommitted documents of an IndexWriter, inverted as they are added
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<Term, PostingList>,
    field_lengths: BTreeMap<String, Vec<u32>>,
    stored: Vec<Vec<StoredField>>,
    doc_count: u32,
    total_tokens: u64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex::default()
    }

    /// Analyze and invert `doc`, returning its segment-local id.
    /// Nothing is mutated when the document is rejected.
    pub fn add_document(&mut self, doc: &Document, analyzer: &dyn Analyzer) -> Result<DocId> {
        doc.validate()?;
        if self.doc_count >= NO_MORE_DOCS - 1 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "segment buffer is full, commit before adding more documents".to_string(),
            ));
        }

        let doc_id = DocId(self.doc_count);
        let mut term_freqs: HashMap<Term, u32> = HashMap::new();
        let mut lengths: BTreeMap<&str, u32> = BTreeMap::new();
        let mut stored = Vec::new();

        for field in &doc.fields {
            if field.is_indexed() {
                let length = lengths.entry(field.name.as_str()).or_insert(0);
                match &field.value {
                    FieldValue::Text(text) if field.field_type.tokenized => {
                        for token in analyzer.token_stream(&field.name, text) {
                            let term = Term::new(field.name.as_str(), token.text.into_bytes());
                            *term_freqs.entry(term).or_insert(0) += 1;
                            *length += 1;
                        }
                    }
                    // Untokenized text and binary values are a single term
                    value => {
                        let term = Term::new(field.name.as_str(), value.as_bytes());
                        *term_freqs.entry(term).or_insert(0) += 1;
                        *length += 1;
                    }
                }
            }
            if field.is_stored() {
                stored.push(StoredField::new(field.name.clone(), field.value.clone()));
            }
        }

        for (term, freq) in term_freqs {
            self.total_tokens += freq as u64;
            self.postings.entry(term)
                .or_default()
                .add_occurrences(doc_id, freq);
        }
        for (field, length) in lengths {
            let per_doc = self.field_lengths.entry(field.to_string()).or_default();
            per_doc.resize(doc_id.0 as usize, 0);
            per_doc.push(length);
        }
        self.stored.push(stored);
        self.doc_count += 1;

        Ok(doc_id)
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    #[cfg(test)]
    fn search_term(&self, term: &Term) -> Option<&PostingList> {
        self.postings.get(term)
    }

    /// Rebuild the buffer a segment was frozen from, for segments that were never published
    pub fn from_segment(segment: Segment) -> Self {
        let total_tokens = segment.terms.values().map(|e| e.info.total_term_freq).sum();
        InvertedIndex {
            postings: segment.terms.into_iter()
                .map(|(term, entry)| (term, entry.postings))
                .collect(),
            field_lengths: segment.fields.into_iter()
                .map(|(field, stats)| (field, stats.lengths))
                .collect(),
            stored: segment.stored,
            doc_count: segment.doc_count,
            total_tokens,
        }
    }

    /// Append the documents of `other` after the buffered ones.
    /// Their ids shift by the current `doc_count()`.
    pub fn append(&mut self, other: InvertedIndex) {
        let base = self.doc_count;
        for (term, list) in other.postings {
            let target = self.postings.entry(term).or_default();
            for posting in list.postings {
                target.add_occurrences(DocId(base + posting.doc_id.0), posting.term_freq);
            }
        }
        for (field, lengths) in other.field_lengths {
            let per_doc = self.field_lengths.entry(field).or_default();
            per_doc.resize(base as usize, 0);
            per_doc.extend(lengths);
        }
        self.stored.extend(other.stored);
        self.doc_count += other.doc_count;
        self.total_tokens += other.total_tokens;
    }

    /// Freeze into an immutable segment, computing term and field statistics
    pub fn freeze(self, name: impl Into<String>) -> Segment {
        let doc_count = self.doc_count;

        let terms = self.postings.into_iter()
            .map(|(term, postings)| {
                let info = TermInfo {
                    doc_freq: postings.doc_freq(),
                    total_term_freq: postings.total_freq(),
                };
                (term, TermEntry { info, postings })
            })
            .collect();

        let fields = self.field_lengths.into_iter()
            .map(|(field, mut lengths)| {
                lengths.resize(doc_count as usize, 0);
                (field, FieldStats::from_lengths(lengths))
            })
            .collect();

        Segment {
            name: name.into(),
            doc_count,
            fields,
            terms,
            stored: self.stored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::TextAnalyzer;
    use crate::core::types::Field;

    #[test]
    fn test_term_key_round_trip_and_order() {
        let a = Term::text("a", "zzz");
        let ab = Term::text("ab", "a");
        assert!(a < ab);
        assert!(a.key() < ab.key());
        assert_eq!(Term::from_key(&a.key()).unwrap(), a);
        assert!(Term::from_key(b"no-separator").is_err());
        assert_eq!(a.to_string(), "a:zzz");
    }

    #[test]
    fn test_add_document_counts_frequencies_and_lengths() {
        let analyzer = TextAnalyzer::standard();
        let mut index = InvertedIndex::new();

        let d0 = index.add_document(
            &Document::new().with(Field::text("body", "the quick the lazy", true)),
            &analyzer,
        ).unwrap();
        let d1 = index.add_document(
            &Document::new()
                .with(Field::string("id", "Doc-1", true))
                .with(Field::bytes("raw", vec![0xff, 0x00], true, false)),
            &analyzer,
        ).unwrap();

        assert_eq!((d0, d1), (DocId(0), DocId(1)));
        let the = index.search_term(&Term::text("body", "the")).unwrap();
        assert_eq!(the.postings[0].term_freq, 2);
        // Untokenized values keep their case
        assert!(index.search_term(&Term::text("id", "Doc-1")).is_some());
        assert!(index.search_term(&Term::new("raw", vec![0xff, 0x00])).is_some());
        assert_eq!(index.total_tokens(), 6);

        let segment = index.freeze("_0");
        assert_eq!(segment.doc_count, 2);
        let body = &segment.fields["body"];
        assert_eq!(body.lengths, vec![4, 0]);
        assert_eq!(body.doc_count, 1);
        assert_eq!(body.sum_total_term_freq, 4);
        assert_eq!(segment.fields["id"].lengths, vec![0, 1]);
        assert_eq!(segment.terms[&Term::text("body", "the")].info.total_term_freq, 2);
        assert_eq!(segment.stored[1].len(), 1);
        assert!(segment.validate().is_ok());
    }

    #[test]
    fn test_unpublished_segment_goes_back_in_front() {
        let analyzer = TextAnalyzer::standard();
        let mut first = InvertedIndex::new();
        first.add_document(&Document::new().with(Field::text("body", "fox fox", true)), &analyzer).unwrap();
        first.add_document(&Document::new().with(Field::string("id", "x", true)), &analyzer).unwrap();
        let mut restored = InvertedIndex::from_segment(first.freeze("_0"));
        assert_eq!(restored.doc_count(), 2);
        assert_eq!(restored.total_tokens(), 3);

        let mut newer = InvertedIndex::new();
        newer.add_document(&Document::new().with(Field::text("body", "fox dog", true)), &analyzer).unwrap();
        restored.append(newer);

        assert_eq!(restored.doc_count(), 3);
        assert_eq!(restored.total_tokens(), 5);
        let fox = restored.search_term(&Term::text("body", "fox")).unwrap();
        assert_eq!(fox.postings.iter().map(|p| (p.doc_id.0, p.term_freq)).collect::<Vec<_>>(), vec![(0, 2), (2, 1)]);
        assert_eq!(restored.search_term(&Term::text("body", "dog")).unwrap().postings[0].doc_id, DocId(2));

        let segment = restored.freeze("_1");
        assert_eq!(segment.fields["body"].lengths, vec![2, 0, 2]);
        assert_eq!(segment.fields["id"].lengths, vec![0, 1, 0]);
        assert_eq!(segment.stored.len(), 3);
        assert!(segment.validate().is_ok());
    }

    #[test]
    fn test_rejected_document_leaves_buffer_untouched() {
        let analyzer = TextAnalyzer::standard();
        let mut index = InvertedIndex::new();
        let bad = Document::new()
            .with(Field::text("body", "hello", true))
            .with(Field::text("", "broken", true));

        let err = index.add_document(&bad, &analyzer).unwrap_err();
        assert!(err.is(ErrorKind::InvalidArgument));
        assert!(index.is_empty());
        assert_eq!(index.term_count(), 0);
    }
}
