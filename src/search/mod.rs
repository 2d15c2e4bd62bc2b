pub mod results;
pub mod scorer;
pub mod searcher;
pub mod weight;

pub use results::{ScoreDoc, ScoreExplanation, TopDocs, TopDocsCollector};
pub use searcher::IndexSearcher;
