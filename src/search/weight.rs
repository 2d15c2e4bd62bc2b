use crate::index::inverted::Term;
use crate::query::ast::{Occur, Query};
use crate::reader::{DirectoryReader, SegmentReader};
use crate::scoring::similarity::{Similarity, TermStatistics};
use crate::search::results::ScoreExplanation;
use crate::search::scorer::{BooleanScorer, Scorer, TermScorer};

/// A query bound to the statistics of one reader.
///
/// Statistics are gathered over the whole reader once, so every segment
/// scores against the same idf and average length.
#[derive(Debug, Clone)]
pub enum Weight {
    Term(TermWeight),
    Boolean(BooleanWeight),
}

#[derive(Debug, Clone)]
pub struct TermWeight {
    pub term: Term,
    pub boost: f32,
    pub stats: TermStatistics,
}

#[derive(Debug, Clone)]
pub struct BooleanWeight {
    pub clauses: Vec<(Weight, Occur)>,
    pub boost: f32,
}

impl Weight {
    pub fn new(query: &Query, reader: &DirectoryReader) -> Self {
        match query {
            Query::Term(q) => {
                let avg_field_length = reader.field_stats(&q.term.field)
                    .map(|s| s.avg_field_length())
                    .unwrap_or(0.0);
                Weight::Term(TermWeight {
                    term: q.term.clone(),
                    boost: q.boost,
                    stats: TermStatistics {
                        doc_count: reader.max_doc() as u64,
                        doc_freq: reader.doc_freq(&q.term),
                        avg_field_length,
                    },
                })
            }
            Query::Boolean(q) => Weight::Boolean(BooleanWeight {
                clauses: q.clauses()
                    .iter()
                    .map(|c| (Weight::new(&c.query, reader), c.occur))
                    .collect(),
                boost: q.boost(),
            }),
        }
    }

    /// Scorer over one segment, `None` when nothing there can match
    pub fn scorer<'a>(
        &'a self,
        segment: &'a SegmentReader,
        similarity: &'a dyn Similarity,
    ) -> Option<Box<dyn Scorer + 'a>> {
        match self {
            Weight::Term(w) => {
                let entry = segment.term(&w.term)?;
                Some(Box::new(TermScorer::new(
                    entry.postings.cursor(),
                    segment.field_stats(&w.term.field),
                    &w.stats,
                    w.boost,
                    similarity,
                )))
            }
            Weight::Boolean(w) => {
                let mut scorers = Vec::with_capacity(w.clauses.len());
                let mut positive = false;
                for (weight, occur) in &w.clauses {
                    match (weight.scorer(segment, similarity), occur) {
                        (Some(scorer), _) => {
                            positive |= *occur != Occur::MustNot;
                            scorers.push((*occur, scorer));
                        }
                        (None, Occur::Must) => return None,
                        (None, _) => {}
                    }
                }
                if !positive {
                    return None;
                }
                Some(Box::new(BooleanScorer::new(scorers, w.boost)))
            }
        }
    }

    /// Explains the score of local doc `doc`, summing in the scorer's order
    pub fn explain(&self, segment: &SegmentReader, doc: u32, similarity: &dyn Similarity) -> ScoreExplanation {
        match self {
            Weight::Term(w) => {
                let posting = segment.term(&w.term)
                    .and_then(|entry| entry.postings.iter().find(|p| p.doc_id.0 == doc));
                match posting {
                    Some(posting) => {
                        let length = segment.field_length(&w.term.field, doc);
                        let detail = similarity.explain(w.boost, &w.stats, posting.term_freq, length);
                        ScoreExplanation::new(
                            detail.value,
                            format!("weight({} in {}) [{}]", w.term, doc, similarity.name()),
                            vec![detail],
                        )
                    }
                    None => ScoreExplanation::no_match(format!("no matching term {}", w.term)),
                }
            }
            Weight::Boolean(w) => {
                let mut sum = 0.0f32;
                let mut details = Vec::with_capacity(w.clauses.len());
                let mut positive = false;
                for (weight, occur) in &w.clauses {
                    let explanation = weight.explain(segment, doc, similarity);
                    match occur {
                        Occur::Must if !explanation.matched => {
                            return ScoreExplanation::no_match(format!(
                                "required clause did not match: {}", explanation.description
                            ));
                        }
                        Occur::MustNot if explanation.matched => {
                            return ScoreExplanation::no_match(format!(
                                "prohibited clause matched: {}", explanation.description
                            ));
                        }
                        Occur::MustNot => continue,
                        _ if explanation.matched => {
                            positive = true;
                            sum += explanation.value;
                            details.push(explanation);
                        }
                        _ => {}
                    }
                }
                if !positive {
                    return ScoreExplanation::no_match("no clause matched");
                }
                if w.boost != 1.0 {
                    details.push(ScoreExplanation::leaf(w.boost, "boost"));
                }
                ScoreExplanation::new(sum * w.boost, "sum of", details)
            }
        }
    }
}
