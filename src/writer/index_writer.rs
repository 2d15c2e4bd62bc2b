use std::collections::HashSet;
use std::mem;
use std::sync::Arc;
use parking_lot::Mutex;
use crate::core::config::{IndexWriterConfig, OpenMode};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};
use crate::index::inverted::InvertedIndex;
use crate::storage::directory::{Directory, Lock};
use crate::storage::layout::{is_index_file, parse_segment_counter, segment_file_name, segment_name};
use crate::storage::manifest::Manifest;
use crate::storage::segment::Segment;

/// Single writer per directory.
///
/// Documents are inverted into an in-memory buffer as they are added and
/// become visible to readers opened after the next successful `commit`.
/// `add_document` and `commit` take `&self`; the writer can be shared
/// between threads behind an `Arc`.
pub struct IndexWriter {
    directory: Arc<dyn Directory>,
    config: IndexWriterConfig,
    buffer: Mutex<InvertedIndex>,
    commit_state: Mutex<CommitState>,   // Also serializes commits
    write_lock: Option<Box<dyn Lock>>,
}

struct CommitState {
    manifest: Manifest,
    counter: u64,
}

impl IndexWriter {
    pub fn open(directory: Arc<dyn Directory>, config: IndexWriterConfig) -> Result<Self> {
        let write_lock = directory.obtain_write_lock()?;
        let existing = Manifest::load_latest(directory.as_ref())?;

        let manifest = match (config.open_mode, existing) {
            (OpenMode::Create, previous) => {
                delete_index_files(directory.as_ref(), &HashSet::new())?;
                // Generations keep increasing so stale readers never see a reused name
                let mut fresh = Manifest::empty();
                if let Some(previous) = previous {
                    fresh.generation = previous.generation;
                    fresh.counter = previous.counter;
                }
                fresh
            }
            (OpenMode::Append, None) => {
                return Err(Error::new(
                    ErrorKind::NotFound,
                    format!("no committed index in {:?}", directory),
                ));
            }
            (_, Some(manifest)) => manifest,
            (OpenMode::CreateOrAppend, None) => Manifest::empty(),
        };

        let referenced: HashSet<String> = manifest.referenced_files().into_iter().collect();
        delete_index_files(directory.as_ref(), &referenced)?;

        // Never reuse the name of a leftover file that could not be removed
        let counter = directory.list_all()?
            .iter()
            .filter_map(|name| parse_segment_counter(name))
            .map(|c| c + 1)
            .fold(manifest.counter, u64::max);

        log::info!(
            "opened index writer: generation {}, {} segments, {} docs, mode {:?}, codec {}",
            manifest.generation, manifest.segments.len(), manifest.doc_count(),
            config.open_mode, config.codec.name()
        );

        Ok(IndexWriter {
            directory,
            config,
            buffer: Mutex::new(InvertedIndex::new()),
            commit_state: Mutex::new(CommitState { manifest, counter }),
            write_lock: Some(write_lock),
        })
    }

    /// Analyze and buffer `doc`; returns its id within the pending segment
    pub fn add_document(&self, doc: &Document) -> Result<DocId> {
        let mut buffer = self.buffer.lock();
        buffer.add_document(doc, self.config.analyzer.as_ref())
    }

    /// Add a batch atomically with respect to validation: if any document
    /// is invalid, none is added.
    pub fn add_documents(&self, docs: &[Document]) -> Result<Vec<DocId>> {
        for doc in docs {
            doc.validate()?;
        }
        let mut buffer = self.buffer.lock();
        docs.iter()
            .map(|doc| buffer.add_document(doc, self.config.analyzer.as_ref()))
            .collect()
    }

    /// Durably publish everything added so far as a new segment.
    ///
    /// Returns only after the segment file and the new manifest are durable.
    /// Adds from other threads keep going while the segment is written.
    /// If the commit fails its documents go back in front of the buffer for
    /// the next attempt, so ids of documents added meanwhile shift.
    pub fn commit(&self) -> Result<()> {
        let mut state = self.commit_state.lock();

        let buffer = mem::take(&mut *self.buffer.lock());
        if buffer.is_empty() {
            return Ok(());
        }
        log::debug!(
            "swapped out buffer: {} docs, {} terms, {} tokens",
            buffer.doc_count(), buffer.term_count(), buffer.total_tokens()
        );

        let name = segment_name(state.counter);
        state.counter += 1;
        let segment = buffer.freeze(name);
        let doc_count = segment.doc_count;

        let codec = &self.config.codec;
        let file = segment_file_name(&segment.name, codec.extension());
        let entry = match codec.serialize_segment(self.directory.as_ref(), &segment) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("commit failed writing {}: {}", file, e);
                self.remove_quietly(&file);
                self.requeue(segment);
                return Err(e);
            }
        };

        let manifest = state.manifest.next(entry, state.counter);
        if let Err(e) = manifest.publish(self.directory.as_ref()) {
            if self.directory.file_exists(&manifest.file_name()).unwrap_or(false) {
                // Renamed into place but not confirmed durable: it is the live commit now
                log::warn!("manifest {} published with error: {}", manifest.file_name(), e);
                state.manifest = manifest;
            } else {
                log::warn!("commit failed publishing {}: {}", manifest.file_name(), e);
                self.remove_quietly(&file);
                self.requeue(segment);
            }
            return Err(e);
        }

        let previous = mem::replace(&mut state.manifest, manifest);
        if previous.generation > 0 {
            self.remove_quietly(&previous.file_name());
        }
        log::info!(
            "committed segment {} ({} docs) as generation {}",
            segment.name, doc_count, state.manifest.generation
        );
        Ok(())
    }

    /// Discard all documents added since the last commit
    pub fn rollback(&self) {
        let discarded = mem::take(&mut *self.buffer.lock());
        if !discarded.is_empty() {
            log::info!("rolled back {} uncommitted documents", discarded.doc_count());
        }
    }

    pub fn pending_docs(&self) -> u32 {
        self.buffer.lock().doc_count()
    }

    /// Documents visible in the last published commit
    pub fn committed_docs(&self) -> u64 {
        self.commit_state.lock().manifest.doc_count()
    }

    pub fn generation(&self) -> u64 {
        self.commit_state.lock().manifest.generation
    }

    pub fn config(&self) -> &IndexWriterConfig {
        &self.config
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Release the write lock. Uncommitted documents are discarded.
    pub fn close(mut self) -> Result<()> {
        let pending = mem::take(self.buffer.get_mut());
        if !pending.is_empty() {
            log::warn!("closing index writer with {} uncommitted documents", pending.doc_count());
        }
        if let Some(lock) = self.write_lock.take() {
            lock.release()?;
        }
        log::info!("closed index writer at generation {}", self.commit_state.get_mut().manifest.generation);
        Ok(())
    }

    /// Put the documents of an unpublished segment back ahead of those added since
    fn requeue(&self, segment: Segment) {
        let mut restored = InvertedIndex::from_segment(segment);
        let mut buffer = self.buffer.lock();
        let added = mem::take(&mut *buffer);
        log::info!(
            "kept {} docs of the failed commit buffered ahead of {} newer docs",
            restored.doc_count(), added.doc_count()
        );
        restored.append(added);
        *buffer = restored;
    }

    fn remove_quietly(&self, name: &str) {
        if let Err(e) = self.directory.delete_file(name) {
            if !e.is(ErrorKind::FileNotFound) {
                log::warn!("could not remove {}: {}", name, e);
            }
        }
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        let pending = self.buffer.get_mut().doc_count();
        if pending > 0 {
            log::warn!("index writer dropped with {} uncommitted documents", pending);
        }
    }
}

/// Delete index files not in `keep`. Failures are logged; the next open retries.
fn delete_index_files(directory: &dyn Directory, keep: &HashSet<String>) -> Result<()> {
    for name in directory.list_all()? {
        if !is_index_file(&name) || keep.contains(&name) {
            continue;
        }
        match directory.delete_file(&name) {
            Ok(()) => log::debug!("deleted unreferenced file {}", name),
            Err(e) => log::warn!("could not delete unreferenced file {}: {}", name, e),
        }
    }
    Ok(())
}
