use std::fmt;
use std::sync::Arc;
use fst::Streamer;
use crate::codec::{builtin_codecs, find_codec, Codec};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};
use crate::index::inverted::Term;
use crate::index::posting::Posting;
use crate::reader::segment_reader::SegmentReader;
use crate::storage::directory::Directory;
use crate::storage::layout::latest_generation;
use crate::storage::manifest::{Manifest, SegmentEntry};

const MAX_OPEN_ATTEMPTS: usize = 10;

/// Field statistics summed over every segment of a reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldStatistics {
    pub doc_count: u64,
    pub sum_total_term_freq: u64,
}

impl FieldStatistics {
    pub fn avg_field_length(&self) -> f32 {
        if self.doc_count == 0 {
            return 0.0;
        }
        self.sum_total_term_freq as f32 / self.doc_count as f32
    }
}

/// Immutable snapshot of the commit that was current when it was opened.
///
/// Segment `k` owns reader doc ids `[base_k, base_k + max_doc_k)`.
pub struct DirectoryReader {
    directory: Arc<dyn Directory>,
    generation: u64,
    segments: Vec<SegmentReader>,
    max_doc: u32,
}

impl DirectoryReader {
    pub fn open(directory: Arc<dyn Directory>) -> Result<Self> {
        Self::open_with_codecs(directory, &builtin_codecs())
    }

    /// Open with extra codecs; segments name the codec that wrote them
    pub fn open_with_codecs(directory: Arc<dyn Directory>, codecs: &[Arc<dyn Codec>]) -> Result<Self> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let manifest = match Manifest::load_latest(directory.as_ref())? {
                Some(manifest) => manifest,
                None => {
                    log::debug!("opened empty reader, no commit in {:?}", directory);
                    return Ok(DirectoryReader {
                        directory,
                        generation: 0,
                        segments: Vec::new(),
                        max_doc: 0,
                    });
                }
            };

            match load_segments(directory.as_ref(), &manifest.segments, codecs) {
                Ok((segments, max_doc)) => {
                    log::debug!(
                        "opened reader at generation {}: {} segments, {} docs",
                        manifest.generation, segments.len(), max_doc
                    );
                    return Ok(DirectoryReader {
                        directory,
                        generation: manifest.generation,
                        segments,
                        max_doc,
                    });
                }
                // Segment files vanish only when a newer commit replaced them
                Err(e) if e.is(ErrorKind::FileNotFound) && attempt < MAX_OPEN_ATTEMPTS => {
                    let newest = latest_generation(&directory.list_all()?);
                    if newest.is_some_and(|g| g != manifest.generation) {
                        log::warn!("generation {} superseded while opening, retrying: {}", manifest.generation, e);
                        continue;
                    }
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Generation of the commit this reader sees, 0 for an empty index
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn segments(&self) -> &[SegmentReader] {
        &self.segments
    }

    /// One greater than the largest doc id
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Live documents; equals `max_doc` since documents are never deleted
    pub fn num_docs(&self) -> u32 {
        self.max_doc
    }

    /// Stored fields of `doc_id`, in the order they were added
    pub fn document(&self, doc_id: DocId) -> Result<Document> {
        for segment in &self.segments {
            if let Some(local) = segment.local_doc(doc_id) {
                return segment.document(local);
            }
        }
        Err(Error::new(
            ErrorKind::NotFound,
            format!("doc {} out of range, max doc is {}", doc_id, self.max_doc),
        ))
    }

    /// Distinct terms of `field` across all segments, ascending
    pub fn terms(&self, field: &str) -> Terms<'_> {
        Terms {
            segments: &self.segments,
            field: field.to_string(),
        }
    }

    /// (doc id, term frequency) of `term` across all segments, ascending
    pub fn postings(&self, term: &Term) -> Postings<'_> {
        let parts = self.segments.iter()
            .filter_map(|segment| {
                segment.term(term).map(|entry| (segment.doc_base(), entry.postings.postings.as_slice()))
            })
            .collect();
        Postings { parts, part: 0, pos: 0 }
    }

    pub fn doc_freq(&self, term: &Term) -> u64 {
        self.segments.iter()
            .filter_map(|segment| segment.term(term))
            .map(|entry| entry.info.doc_freq as u64)
            .sum()
    }

    pub fn total_term_freq(&self, term: &Term) -> u64 {
        self.segments.iter()
            .filter_map(|segment| segment.term(term))
            .map(|entry| entry.info.total_term_freq)
            .sum()
    }

    /// `None` when no segment indexed the field
    pub fn field_stats(&self, field: &str) -> Option<FieldStatistics> {
        let mut found = false;
        let mut total = FieldStatistics::default();
        for stats in self.segments.iter().filter_map(|segment| segment.field_stats(field)) {
            found = true;
            total.doc_count += stats.doc_count as u64;
            total.sum_total_term_freq += stats.sum_total_term_freq;
        }
        found.then_some(total)
    }

    pub fn close(self) -> Result<()> {
        log::debug!("closed reader at generation {}", self.generation);
        Ok(())
    }
}

impl fmt::Debug for DirectoryReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryReader")
            .field("generation", &self.generation)
            .field("segments", &self.segments.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("max_doc", &self.max_doc)
            .finish()
    }
}

fn load_segments(
    directory: &dyn Directory,
    entries: &[SegmentEntry],
    codecs: &[Arc<dyn Codec>],
) -> Result<(Vec<SegmentReader>, u32)> {
    let mut segments = Vec::with_capacity(entries.len());
    let mut doc_base = 0u32;
    for entry in entries {
        let codec = find_codec(codecs, &entry.codec)?;
        let segment = codec.deserialize_segment(directory, entry)?;
        log::debug!(
            "loaded segment {} ({} docs, {} terms) with codec {}",
            entry.name, segment.doc_count, segment.terms.len(), entry.codec
        );
        let next_base = doc_base.checked_add(segment.doc_count)
            .filter(|n| *n < u32::MAX)
            .ok_or_else(|| Error::new(ErrorKind::InvalidState, "index exceeds the doc id space".to_string()))?;
        segments.push(SegmentReader::new(segment, doc_base)?);
        doc_base = next_base;
    }
    Ok((segments, doc_base))
}

/// Restartable view of the terms of one field
pub struct Terms<'a> {
    segments: &'a [SegmentReader],
    field: String,
}

impl<'a> Terms<'a> {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn iter(&self) -> TermsIter<'a> {
        let mut streams: Vec<fst::map::Stream<'a>> = self.segments.iter()
            .map(|segment| segment.field_terms(&self.field))
            .collect();
        let heads = streams.iter_mut()
            .map(|stream| stream.next().map(|(key, _)| key.to_vec()))
            .collect();
        TermsIter {
            streams,
            heads,
            prefix_len: self.field.len() + 1,
        }
    }
}

impl<'a> IntoIterator for &Terms<'a> {
    type Item = Vec<u8>;
    type IntoIter = TermsIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// K-way merge of the per-segment dictionary streams
pub struct TermsIter<'a> {
    streams: Vec<fst::map::Stream<'a>>,
    heads: Vec<Option<Vec<u8>>>,
    prefix_len: usize,
}

impl Iterator for TermsIter<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let smallest = self.heads.iter().flatten().min()?.clone();
        for (head, stream) in self.heads.iter_mut().zip(self.streams.iter_mut()) {
            if head.as_ref() == Some(&smallest) {
                *head = stream.next().map(|(key, _)| key.to_vec());
            }
        }
        Some(smallest[self.prefix_len..].to_vec())
    }
}

/// Postings of one term across segments, with reader-level doc ids
pub struct Postings<'a> {
    parts: Vec<(u32, &'a [Posting])>,
    part: usize,
    pos: usize,
}

impl Iterator for Postings<'_> {
    type Item = (DocId, u32);

    fn next(&mut self) -> Option<(DocId, u32)> {
        loop {
            let (base, postings) = self.parts.get(self.part)?;
            if let Some(posting) = postings.get(self.pos) {
                self.pos += 1;
                return Some((DocId(base + posting.doc_id.0), posting.term_freq));
            }
            self.part += 1;
            self.pos = 0;
        }
    }
}
