pub mod core;
pub mod storage;
pub mod analysis;
pub mod index;
pub mod codec;
pub mod compression;
pub mod scoring;
pub mod search;
pub mod query;
pub mod writer;
pub mod reader;

use std::sync::Arc;

pub use crate::core::config::{IndexWriterConfig, OpenMode, SearchConfig};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocId, Document, Field, FieldType, FieldValue};
pub use crate::query::{BooleanQuery, Occur, Query, Term, TermQuery};
pub use crate::reader::DirectoryReader;
pub use crate::search::{IndexSearcher, ScoreDoc, TopDocs};
pub use crate::storage::directory::{Directory, FsDirectory, RamDirectory};
pub use crate::writer::IndexWriter;

/// Open the single writer of `directory`
pub fn new_index_writer(directory: Arc<dyn Directory>, config: IndexWriterConfig) -> Result<IndexWriter> {
    IndexWriter::open(directory, config)
}

/// Snapshot of the latest commit in `directory`
pub fn open_directory_reader(directory: Arc<dyn Directory>) -> Result<DirectoryReader> {
    DirectoryReader::open(directory)
}

/// BM25 searcher over `reader`
pub fn new_index_searcher(reader: &DirectoryReader) -> IndexSearcher<'_> {
    IndexSearcher::new(reader)
}

/*
┌──────────────────────────────────── LUCIDX ARCHITECTURE ─────────────────────────────────────┐

  WRITE PATH
  ┌───────────┐  add_document   ┌──────────────────────┐  commit   ┌─────────────────────────┐
  │ Document  │ ──────────────► │ IndexWriter          │ ────────► │ Codec                   │
  │ • fields  │   Analyzer      │ • buffer: Mutex<     │  freeze   │ • SimpleTextCodec (.stx)│
  └───────────┘                 │     InvertedIndex>   │           │ • BinaryCodec (.lxb)    │
                                │ • commit_state       │           └────────────┬────────────┘
                                │ • write_lock         │                        │ _N.<ext>
                                └──────────┬───────────┘                        ▼
                                           │ publish          ┌─────────────────────────────┐
                                           └────────────────► │ Directory                   │
                                      pending_segments_<gen>  │ • FsDirectory / RamDirectory│
                                      ──rename──► segments_<gen>                            │
                                                              └──────────────┬──────────────┘
  READ PATH                                                                  │ load_latest
  ┌────────────────────────┐     ┌─────────────────────────┐                 ▼
  │ IndexSearcher          │ ◄── │ DirectoryReader         │ ◄── Manifest + SegmentReaders
  │ • Weight (stats)       │     │ • segments (doc_base)   │      (fst term dictionary)
  │ • Term/BooleanScorer   │     │ • terms / postings      │
  │ • Similarity (BM25)    │     │ • document              │
  │ • TopDocsCollector     │     └─────────────────────────┘
  └────────────────────────┘

└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/
