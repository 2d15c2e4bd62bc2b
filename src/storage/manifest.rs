use std::io::Write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::directory::Directory;
use crate::storage::layout::{latest_generation, manifest_file_name, pending_manifest_file_name};

/// Attempts before giving up on a manifest that keeps disappearing
const MAX_OPEN_RETRIES: usize = 10;

/// One live segment of a commit point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub name: String,
    pub codec: String,
    pub file: String,
    pub doc_count: u32,
    pub checksum: u32,     // CRC32 of the whole segment file
}

/// Commit point, persisted as `segments_<gen>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub generation: u64,
    pub counter: u64,      // Next segment number to allocate
    pub timestamp: DateTime<Utc>,
    pub segments: Vec<SegmentEntry>,
}

impl Manifest {
    pub const VERSION: u32 = 1;

    /// Generation 0: nothing has been committed yet
    pub fn empty() -> Self {
        Manifest {
            version: Self::VERSION,
            generation: 0,
            counter: 0,
            timestamp: Utc::now(),
            segments: Vec::new(),
        }
    }

    pub fn file_name(&self) -> String {
        manifest_file_name(self.generation)
    }

    pub fn doc_count(&self) -> u64 {
        self.segments.iter().map(|s| s.doc_count as u64).sum()
    }

    /// Files a reader of this commit needs, manifest included
    pub fn referenced_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.segments.iter().map(|s| s.file.clone()).collect();
        if self.generation > 0 {
            files.push(self.file_name());
        }
        files
    }

    /// Successor commit point with `entry` appended
    pub fn next(&self, entry: SegmentEntry, counter: u64) -> Manifest {
        let mut segments = self.segments.clone();
        segments.push(entry);
        Manifest {
            version: Self::VERSION,
            generation: self.generation + 1,
            counter,
            timestamp: Utc::now(),
            segments,
        }
    }

    pub fn read(dir: &dyn Directory, generation: u64) -> Result<Manifest> {
        let name = manifest_file_name(generation);
        let data = dir.read_all(&name)?;
        let manifest: Manifest = serde_json::from_slice(&data)?;
        if manifest.version != Self::VERSION {
            return Err(Error::corrupted(format!(
                "{}: unsupported manifest version {}", name, manifest.version
            )));
        }
        if manifest.generation != generation {
            return Err(Error::corrupted(format!(
                "{}: file claims generation {}", name, manifest.generation
            )));
        }
        Ok(manifest)
    }

    /// Latest published commit point, `None` for a directory without commits.
    /// Retries when the manifest is superseded and deleted while opening.
    pub fn load_latest(dir: &dyn Directory) -> Result<Option<Manifest>> {
        let mut last_error = None;
        for attempt in 0..MAX_OPEN_RETRIES {
            let generation = match latest_generation(&dir.list_all()?) {
                Some(generation) => generation,
                None => return Ok(None),
            };
            match Self::read(dir, generation) {
                Ok(manifest) => return Ok(Some(manifest)),
                Err(e) if e.is(ErrorKind::FileNotFound) => {
                    log::warn!("manifest generation {} vanished (attempt {}), retrying", generation, attempt + 1);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            Error::new(ErrorKind::NotFound, "no readable manifest".to_string())
        }))
    }

    /// Write `pending_segments_<gen>`, make it durable, then rename it into place.
    /// The pending file is removed again if anything fails.
    pub fn publish(&self, dir: &dyn Directory) -> Result<()> {
        let pending = pending_manifest_file_name(self.generation);
        let result = self.write_pending(dir, &pending)
            .and_then(|_| dir.rename(&pending, &self.file_name()));
        if result.is_err() {
            if let Err(e) = dir.delete_file(&pending) {
                if !e.is(ErrorKind::FileNotFound) {
                    log::warn!("failed to remove {}: {}", pending, e);
                }
            }
        }
        result
    }

    fn write_pending(&self, dir: &dyn Directory, pending: &str) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        // Left behind by an earlier publish of this generation that failed
        match dir.delete_file(pending) {
            Ok(()) => log::debug!("removed stale {}", pending),
            Err(e) if e.is(ErrorKind::FileNotFound) => {}
            Err(e) => return Err(e),
        }
        let mut output = dir.create_output(pending)?;
        output.write_all(&data)?;
        output.finish()
    }
}
