pub mod similarity;

pub use similarity::{BM25Similarity, ClassicSimilarity, Similarity, TermStatistics};
