use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document, Field, FieldType, FieldValue};
use crate::index::inverted::{Term, TermInfo};
use crate::index::posting::PostingList;

/// Stored field value of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredField {
    pub name: String,
    pub value: FieldValue,
}

impl StoredField {
    pub fn new(name: String, value: FieldValue) -> Self {
        StoredField { name, value }
    }
}

/// Per-field statistics of a segment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    pub doc_count: u32,             // Documents with at least one term in the field
    pub sum_total_term_freq: u64,   // Sum of all field lengths
    pub lengths: Vec<u32>,          // Field length per local doc id ("norms")
}

impl FieldStats {
    pub fn from_lengths(lengths: Vec<u32>) -> Self {
        FieldStats {
            doc_count: lengths.iter().filter(|&&l| l > 0).count() as u32,
            sum_total_term_freq: lengths.iter().map(|&l| l as u64).sum(),
            lengths,
        }
    }

    pub fn length(&self, doc: u32) -> u32 {
        self.lengths.get(doc as usize).copied().unwrap_or(0)
    }

    pub fn avg_field_length(&self) -> f32 {
        if self.doc_count == 0 {
            return 0.0;
        }
        self.sum_total_term_freq as f32 / self.doc_count as f32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    pub info: TermInfo,
    pub postings: PostingList,
}

/// Immutable unit of committed index data. Doc ids are local, starting at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub doc_count: u32,
    pub fields: BTreeMap<String, FieldStats>,
    pub terms: BTreeMap<Term, TermEntry>,
    pub stored: Vec<Vec<StoredField>>,
}

impl Segment {
    pub fn empty(name: impl Into<String>) -> Self {
        Segment {
            name: name.into(),
            doc_count: 0,
            fields: BTreeMap::new(),
            terms: BTreeMap::new(),
            stored: Vec::new(),
        }
    }

    pub fn term(&self, term: &Term) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    /// Stored fields of a local doc, in add order
    pub fn document(&self, doc: DocId) -> Option<Document> {
        self.stored.get(doc.0 as usize).map(|stored| Self::stored_document(stored))
    }

    pub fn stored_document(stored: &[StoredField]) -> Document {
        stored.iter()
            .map(|f| Field::new(f.name.clone(), f.value.clone(), FieldType::STORED_ONLY))
            .collect()
    }

    /// Check the cross-references a decoder cannot enforce on its own
    pub fn validate(&self) -> Result<()> {
        let n = self.doc_count as usize;
        if self.stored.len() != n {
            return Err(Error::corrupted(format!(
                "segment {}: {} stored documents for doc count {}", self.name, self.stored.len(), n
            )));
        }

        for (field, stats) in &self.fields {
            if stats.lengths.len() != n {
                return Err(Error::corrupted(format!(
                    "segment {}: field '{}' has {} norms for doc count {}",
                    self.name, field, stats.lengths.len(), n
                )));
            }
            if *stats != FieldStats::from_lengths(stats.lengths.clone()) {
                return Err(Error::corrupted(format!(
                    "segment {}: field '{}' statistics do not match its norms", self.name, field
                )));
            }
        }

        for (term, entry) in &self.terms {
            if !self.fields.contains_key(&term.field) {
                return Err(Error::corrupted(format!(
                    "segment {}: term {} belongs to an unknown field", self.name, term
                )));
            }
            if entry.postings.is_empty() {
                return Err(Error::corrupted(format!(
                    "segment {}: term {} has no postings", self.name, term
                )));
            }
            if let Some(last) = entry.postings.postings.last() {
                if last.doc_id.0 >= self.doc_count {
                    return Err(Error::corrupted(format!(
                        "segment {}: term {} references doc {} beyond doc count {}",
                        self.name, term, last.doc_id, n
                    )));
                }
            }
            if entry.info.doc_freq != entry.postings.doc_freq()
                || entry.info.total_term_freq != entry.postings.total_freq()
            {
                return Err(Error::corrupted(format!(
                    "segment {}: term {} statistics do not match its postings", self.name, term
                )));
            }
        }
        Ok(())
    }
}
