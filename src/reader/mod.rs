pub mod directory_reader;
pub mod segment_reader;

pub use directory_reader::{DirectoryReader, FieldStatistics, Postings, Terms};
pub use segment_reader::SegmentReader;
