use crate::index::posting::{PostingsCursor, NO_MORE_DOCS};
use crate::query::ast::Occur;
use crate::scoring::similarity::{Similarity, TermStatistics};
use crate::storage::segment::FieldStats;

/// Iterator over matching local docs of one segment, with scores.
///
/// A scorer is positioned on its first match when created. Targets passed
/// to `advance` never decrease; `advance` to a target at or before the
/// current doc leaves the scorer where it is.
pub trait Scorer {
    fn doc(&self) -> u32;

    fn next_doc(&mut self) -> u32;

    /// Move to the first match >= `target`
    fn advance(&mut self, target: u32) -> u32;

    /// Score of the current doc
    fn score(&mut self) -> f32;

    /// Upper bound on the number of matches left
    fn cost(&self) -> usize;
}

pub struct TermScorer<'a> {
    cursor: PostingsCursor<'a>,
    norms: Option<&'a FieldStats>,
    stats: &'a TermStatistics,
    boost: f32,
    similarity: &'a dyn Similarity,
}

impl<'a> TermScorer<'a> {
    pub fn new(
        cursor: PostingsCursor<'a>,
        norms: Option<&'a FieldStats>,
        stats: &'a TermStatistics,
        boost: f32,
        similarity: &'a dyn Similarity,
    ) -> Self {
        TermScorer { cursor, norms, stats, boost, similarity }
    }
}

impl Scorer for TermScorer<'_> {
    fn doc(&self) -> u32 {
        self.cursor.doc()
    }

    fn next_doc(&mut self) -> u32 {
        self.cursor.next_doc()
    }

    fn advance(&mut self, target: u32) -> u32 {
        self.cursor.advance(target)
    }

    fn score(&mut self) -> f32 {
        let length = self.norms.map(|n| n.length(self.cursor.doc())).unwrap_or(0);
        self.similarity.score(self.boost, self.stats, self.cursor.freq(), length)
    }

    fn cost(&self) -> usize {
        self.cursor.cost()
    }
}

/// Merges sub-scorers per clause occurrence.
///
/// Must scorers are intersected leapfrog style starting from the cheapest
/// one; without Must clauses the Should scorers form a disjunction. MustNot
/// scorers are only ever advanced to candidates. Scores are summed in
/// clause order.
pub struct BooleanScorer<'a> {
    clauses: Vec<(Occur, Box<dyn Scorer + 'a>)>,
    must: Vec<usize>,       // Cheapest first
    should: Vec<usize>,
    must_not: Vec<usize>,
    boost: f32,
    doc: u32,
}

impl<'a> BooleanScorer<'a> {
    /// At least one Must or Should scorer is required
    pub fn new(clauses: Vec<(Occur, Box<dyn Scorer + 'a>)>, boost: f32) -> Self {
        let indices = |occur: Occur| -> Vec<usize> {
            clauses.iter()
                .enumerate()
                .filter(|(_, (o, _))| *o == occur)
                .map(|(i, _)| i)
                .collect()
        };
        let mut must = indices(Occur::Must);
        let should = indices(Occur::Should);
        let must_not = indices(Occur::MustNot);
        must.sort_by_key(|&i| clauses[i].1.cost());

        let mut scorer = BooleanScorer { clauses, must, should, must_not, boost, doc: 0 };
        scorer.doc = scorer.find_match(0);
        scorer
    }

    fn find_match(&mut self, mut target: u32) -> u32 {
        loop {
            let candidate = if self.must.is_empty() {
                self.next_should(target)
            } else {
                self.align_must(target)
            };
            if candidate == NO_MORE_DOCS {
                return NO_MORE_DOCS;
            }

            let clauses = &mut self.clauses;
            let excluded = self.must_not.iter()
                .any(|&i| clauses[i].1.advance(candidate) == candidate);
            if !excluded {
                return candidate;
            }
            target = candidate + 1;
        }
    }

    /// Smallest doc >= target among the Should scorers
    fn next_should(&mut self, target: u32) -> u32 {
        let mut smallest = NO_MORE_DOCS;
        for &i in &self.should {
            smallest = smallest.min(self.clauses[i].1.advance(target));
        }
        smallest
    }

    /// First doc >= target on which every Must scorer agrees
    fn align_must(&mut self, target: u32) -> u32 {
        let lead = self.must[0];
        let mut candidate = self.clauses[lead].1.advance(target);
        'search: loop {
            if candidate == NO_MORE_DOCS {
                return NO_MORE_DOCS;
            }
            for &i in &self.must[1..] {
                let doc = self.clauses[i].1.advance(candidate);
                if doc > candidate {
                    candidate = self.clauses[lead].1.advance(doc);
                    continue 'search;
                }
            }
            return candidate;
        }
    }
}

impl Scorer for BooleanScorer<'_> {
    fn doc(&self) -> u32 {
        self.doc
    }

    fn next_doc(&mut self) -> u32 {
        if self.doc != NO_MORE_DOCS {
            self.doc = self.find_match(self.doc + 1);
        }
        self.doc
    }

    fn advance(&mut self, target: u32) -> u32 {
        if target > self.doc {
            self.doc = self.find_match(target);
        }
        self.doc
    }

    fn score(&mut self) -> f32 {
        let doc = self.doc;
        let mut sum = 0.0f32;
        for (occur, scorer) in self.clauses.iter_mut() {
            match occur {
                Occur::Must => sum += scorer.score(),
                Occur::Should => {
                    if scorer.advance(doc) == doc {
                        sum += scorer.score();
                    }
                }
                Occur::MustNot => {}
            }
        }
        sum * self.boost
    }

    fn cost(&self) -> usize {
        match self.must.first() {
            Some(&lead) => self.clauses[lead].1.cost(),
            None => self.should.iter().map(|&i| self.clauses[i].1.cost()).sum(),
        }
    }
}
