use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::DocId;

/// Sentinel doc returned by exhausted cursors
pub const NO_MORE_DOCS: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,       // Term frequency in document
}

impl Posting {
    pub fn new(doc_id: u32, term_freq: u32) -> Self {
        Posting {
            doc_id: DocId(doc_id),
            term_freq,
        }
    }
}

/// Posting list for a term
/// Note: Sorted by doc_id, no duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingList {
    pub postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    /// Wrap decoded postings, rejecting out-of-order or duplicate docs
    pub fn from_postings(postings: Vec<Posting>) -> Result<Self> {
        for pair in postings.windows(2) {
            if pair[0].doc_id >= pair[1].doc_id {
                return Err(Error::corrupted(format!(
                    "postings out of order: doc {} followed by doc {}",
                    pair[0].doc_id, pair[1].doc_id
                )));
            }
        }
        if postings.iter().any(|p| p.term_freq == 0) {
            return Err(Error::corrupted("posting with zero term frequency"));
        }
        Ok(PostingList { postings })
    }

    /// Add `freq` occurrences of the term in `doc_id`
    pub fn add_occurrences(&mut self, doc_id: DocId, freq: u32) {
        match self.postings.last_mut() {
            Some(last) if last.doc_id == doc_id => last.term_freq += freq,
            Some(last) if last.doc_id > doc_id => {
                // Keep sorted by doc_id for efficient merging
                match self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
                    Ok(pos) => self.postings[pos].term_freq += freq,
                    Err(pos) => self.postings.insert(pos, Posting { doc_id, term_freq: freq }),
                }
            }
            _ => self.postings.push(Posting { doc_id, term_freq: freq }),
        }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.term_freq as u64).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    pub fn cursor(&self) -> PostingsCursor<'_> {
        PostingsCursor::new(&self.postings)
    }
}

/// Forward-only cursor over sorted postings.
///
/// A cursor is positioned on its first posting as soon as it is created;
/// `doc()` is `NO_MORE_DOCS` once the postings are exhausted.
#[derive(Debug, Clone)]
pub struct PostingsCursor<'a> {
    postings: &'a [Posting],
    pos: usize,
}

impl<'a> PostingsCursor<'a> {
    pub fn new(postings: &'a [Posting]) -> Self {
        PostingsCursor { postings, pos: 0 }
    }

    pub fn doc(&self) -> u32 {
        self.postings.get(self.pos).map(|p| p.doc_id.0).unwrap_or(NO_MORE_DOCS)
    }

    pub fn freq(&self) -> u32 {
        self.postings.get(self.pos).map(|p| p.term_freq).unwrap_or(0)
    }

    pub fn next_doc(&mut self) -> u32 {
        if self.pos < self.postings.len() {
            self.pos += 1;
        }
        self.doc()
    }

    /// Move to the first posting with doc >= `target`.
    /// Galloping search: cost is logarithmic in the distance skipped.
    pub fn advance(&mut self, target: u32) -> u32 {
        if self.doc() >= target {
            return self.doc();
        }
        let rest = &self.postings[self.pos..];
        let mut bound = 1;
        while bound < rest.len() && rest[bound].doc_id.0 < target {
            bound *= 2;
        }
        let lo = bound / 2;
        let window = &rest[lo..(bound + 1).min(rest.len())];
        self.pos += lo + window.partition_point(|p| p.doc_id.0 < target);
        self.doc()
    }

    /// Upper bound on remaining matches
    pub fn cost(&self) -> usize {
        self.postings.len().saturating_sub(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(docs: &[u32]) -> PostingList {
        PostingList::from_postings(docs.iter().map(|&d| Posting::new(d, 1)).collect()).unwrap()
    }

    #[test]
    fn test_add_occurrences_merges_same_doc() {
        let mut pl = PostingList::new();
        pl.add_occurrences(DocId(0), 1);
        pl.add_occurrences(DocId(0), 2);
        pl.add_occurrences(DocId(3), 1);
        pl.add_occurrences(DocId(1), 1);
        let docs: Vec<u32> = pl.iter().map(|p| p.doc_id.0).collect();
        assert_eq!(docs, vec![0, 1, 3]);
        assert_eq!(pl.postings[0].term_freq, 3);
        assert_eq!(pl.total_freq(), 5);
        assert_eq!(pl.doc_freq(), 3);
    }

    #[test]
    fn test_from_postings_rejects_unsorted() {
        let bad = vec![Posting::new(2, 1), Posting::new(2, 1)];
        assert!(PostingList::from_postings(bad).is_err());
        let zero = vec![Posting::new(1, 0)];
        assert!(PostingList::from_postings(zero).is_err());
    }

    #[test]
    fn test_cursor_advance_gallops_to_target() {
        let pl = list(&[1, 3, 5, 8, 13, 21, 34, 55, 89]);
        let mut cursor = pl.cursor();
        assert_eq!(cursor.doc(), 1);
        assert_eq!(cursor.advance(4), 5);
        assert_eq!(cursor.advance(5), 5);
        assert_eq!(cursor.advance(22), 34);
        assert_eq!(cursor.next_doc(), 55);
        assert_eq!(cursor.advance(89), 89);
        assert_eq!(cursor.advance(90), NO_MORE_DOCS);
        assert_eq!(cursor.next_doc(), NO_MORE_DOCS);
    }

    #[test]
    fn test_cursor_advance_matches_linear_scan() {
        let docs: Vec<u32> = (0..500).map(|i| i * 3 + (i % 7)).collect();
        let pl = list(&docs);
        for target in 0..1600 {
            let mut cursor = pl.cursor();
            let expected = docs.iter().copied().find(|&d| d >= target).unwrap_or(NO_MORE_DOCS);
            assert_eq!(cursor.advance(target), expected, "target {}", target);
        }
    }

    #[test]
    fn test_empty_cursor() {
        let pl = PostingList::new();
        let mut cursor = pl.cursor();
        assert_eq!(cursor.doc(), NO_MORE_DOCS);
        assert_eq!(cursor.advance(0), NO_MORE_DOCS);
        assert_eq!(cursor.cost(), 0);
    }
}
