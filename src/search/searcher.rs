use std::sync::Arc;
use crate::core::config::SearchConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::posting::NO_MORE_DOCS;
use crate::query::ast::Query;
use crate::reader::DirectoryReader;
use crate::scoring::similarity::{BM25Similarity, Similarity};
use crate::search::results::{ScoreExplanation, TopDocs, TopDocsCollector};
use crate::search::weight::Weight;

/// Runs queries against one reader snapshot.
///
/// Holds no mutable state; share it freely across threads.
pub struct IndexSearcher<'a> {
    reader: &'a DirectoryReader,
    similarity: Arc<dyn Similarity>,
    config: SearchConfig,
}

impl<'a> IndexSearcher<'a> {
    /// Searcher scoring with BM25 (k1 = 1.2, b = 0.75)
    pub fn new(reader: &'a DirectoryReader) -> Self {
        IndexSearcher {
            reader,
            similarity: Arc::new(BM25Similarity::default()),
            config: SearchConfig::default(),
        }
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reader(&self) -> &'a DirectoryReader {
        self.reader
    }

    pub fn similarity(&self) -> &dyn Similarity {
        self.similarity.as_ref()
    }

    /// Best `n` hits by descending score, ties broken by ascending doc id.
    /// `total_hits` counts every match.
    pub fn search_top_n(&self, query: &Query, n: usize) -> Result<TopDocs> {
        if n == 0 {
            return Err(Error::invalid_argument("number of hits must be positive"));
        }
        query.validate(&self.config)?;

        let weight = Weight::new(query, self.reader);
        let mut collector = TopDocsCollector::new(n);
        self.for_each_match(&weight, |doc, score| collector.collect(doc, score));

        let top = collector.into_top_docs();
        log::debug!(
            "search {} on generation {}: {} hits, returned {}",
            query, self.reader.generation(), top.total_hits, top.score_docs.len()
        );
        Ok(top)
    }

    /// Number of matching documents
    pub fn count(&self, query: &Query) -> Result<usize> {
        query.validate(&self.config)?;
        let weight = Weight::new(query, self.reader);
        let mut count = 0;
        self.for_each_match(&weight, |_, _| count += 1);
        Ok(count)
    }

    /// How `doc` scores against `query`; the value equals its search score
    pub fn explain(&self, query: &Query, doc: DocId) -> Result<ScoreExplanation> {
        query.validate(&self.config)?;
        let segment = self.reader.segments()
            .iter()
            .find_map(|s| s.local_doc(doc).map(|local| (s, local)));
        let (segment, local) = segment.ok_or_else(|| Error::new(
            ErrorKind::NotFound,
            format!("doc {} out of range, reader has {} docs", doc, self.reader.max_doc()),
        ))?;
        let weight = Weight::new(query, self.reader);
        Ok(weight.explain(segment, local, self.similarity.as_ref()))
    }

    fn for_each_match(&self, weight: &Weight, mut collect: impl FnMut(DocId, f32)) {
        for segment in self.reader.segments() {
            let Some(mut scorer) = weight.scorer(segment, self.similarity.as_ref()) else {
                continue;
            };
            while scorer.doc() != NO_MORE_DOCS {
                let score = scorer.score();
                collect(DocId(segment.doc_base() + scorer.doc()), score);
                scorer.next_doc();
            }
        }
    }
}
