//! Segment serialization.
//!
//! A codec turns a frozen [`Segment`] into the bytes of one file and back.
//! Encoding is deterministic: decoding a file and encoding the result again
//! yields the same bytes.

pub mod binary;
pub mod simple_text;

use std::io::Write;
use std::sync::Arc;
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::directory::Directory;
use crate::storage::layout::segment_file_name;
use crate::storage::manifest::SegmentEntry;
use crate::storage::segment::Segment;

pub use binary::BinaryCodec;
pub use simple_text::SimpleTextCodec;

pub trait Codec: Send + Sync {
    /// Name recorded in the manifest; used to pick the codec when reading
    fn name(&self) -> &str;

    fn extension(&self) -> &str;

    fn encode(&self, segment: &Segment) -> Result<Vec<u8>>;

    fn decode(&self, data: &[u8]) -> Result<Segment>;

    /// Write `segment` to a new file and return its manifest entry.
    /// The file is durable once this returns.
    fn serialize_segment(&self, dir: &dyn Directory, segment: &Segment) -> Result<SegmentEntry> {
        let data = self.encode(segment)?;
        let file = segment_file_name(&segment.name, self.extension());

        let mut output = dir.create_output(&file)?;
        output.write_all(&data)?;
        output.finish()?;

        Ok(SegmentEntry {
            name: segment.name.clone(),
            codec: self.name().to_string(),
            file,
            doc_count: segment.doc_count,
            checksum: crc32fast::hash(&data),
        })
    }

    /// Load the segment named by `entry`, verifying it against the manifest
    fn deserialize_segment(&self, dir: &dyn Directory, entry: &SegmentEntry) -> Result<Segment> {
        let data = dir.read_all(&entry.file)?;
        let actual = crc32fast::hash(&data);
        if actual != entry.checksum {
            return Err(Error::corrupted(format!(
                "{}: checksum {:08x} does not match manifest {:08x}", entry.file, actual, entry.checksum
            )));
        }

        let segment = self.decode(&data)?;
        if segment.name != entry.name || segment.doc_count != entry.doc_count {
            return Err(Error::corrupted(format!(
                "{}: holds segment {} with {} docs, manifest expects {} with {}",
                entry.file, segment.name, segment.doc_count, entry.name, entry.doc_count
            )));
        }
        segment.validate()?;
        Ok(segment)
    }
}

/// Codecs every reader knows about
pub fn builtin_codecs() -> Vec<Arc<dyn Codec>> {
    vec![
        Arc::new(SimpleTextCodec),
        Arc::new(BinaryCodec::default()),
    ]
}

pub fn find_codec<'a>(codecs: &'a [Arc<dyn Codec>], name: &str) -> Result<&'a Arc<dyn Codec>> {
    codecs.iter()
        .find(|c| c.name() == name)
        .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("no codec named '{}'", name)))
}

#[cfg(test)]
impl std::fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").field("name", &self.name()).finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::analysis::analyzer::TextAnalyzer;
    use crate::core::types::{Document, Field};
    use crate::index::inverted::InvertedIndex;
    use crate::storage::segment::Segment;

    /// Segment exercising every value kind, empty strings and odd bytes
    pub fn sample_segment() -> Segment {
        let analyzer = TextAnalyzer::standard();
        let mut index = InvertedIndex::new();
        let docs = vec![
            Document::new()
                .with(Field::text("title", "Hello world, hello Rust", true))
                .with(Field::string("id", "doc 0 %", true)),
            Document::new()
                .with(Field::bytes("blob", vec![0, 255, b' ', b'%', b'\n'], true, true))
                .with(Field::stored("note", "")),
            Document::new()
                .with(Field::text("title", "naïve café", true))
                .with(Field::text("body", "world", false)),
        ];
        for doc in &docs {
            index.add_document(doc, &analyzer).unwrap();
        }
        index.freeze("_7")
    }
}
