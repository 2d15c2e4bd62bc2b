use std::fmt;
use crate::core::error::{Error, Result};
use crate::search::results::ScoreExplanation;

/// Statistics of one term, gathered once per search from stored values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStatistics {
    pub doc_count: u64,          // N: documents in the reader
    pub doc_freq: u64,           // Documents containing the term
    pub avg_field_length: f32,   // Mean length over documents carrying the field
}

/// Similarity trait
pub trait Similarity: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32;

    /// Score of one (term, document) pair
    fn score(&self, boost: f32, stats: &TermStatistics, freq: u32, field_length: u32) -> f32;

    /// Breakdown of `score`; its value is exactly what `score` returns
    fn explain(&self, boost: f32, stats: &TermStatistics, freq: u32, field_length: u32) -> ScoreExplanation;
}

/// BM25 Scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BM25Similarity {
    k1: f32,  // Term frequency saturation (default: 1.2)
    b: f32,   // Length normalization strength (default: 0.75)
}

impl BM25Similarity {
    pub fn new(k1: f32, b: f32) -> Result<Self> {
        if !k1.is_finite() || k1 < 0.0 {
            return Err(Error::invalid_argument(format!("k1 must be finite and non-negative, got {}", k1)));
        }
        if !b.is_finite() || !(0.0..=1.0).contains(&b) {
            return Err(Error::invalid_argument(format!("b must lie in [0, 1], got {}", b)));
        }
        Ok(BM25Similarity { k1, b })
    }

    pub fn k1(&self) -> f32 {
        self.k1
    }

    pub fn b(&self) -> f32 {
        self.b
    }

    /// Length ratio docLen / avgDocLen; 1 when the average is unknown
    fn length_ratio(field_length: u32, avg_field_length: f32) -> f32 {
        if avg_field_length > 0.0 {
            field_length as f32 / avg_field_length
        } else {
            1.0
        }
    }

    fn tf_norm(&self, freq: u32, field_length: u32, avg_field_length: f32) -> f32 {
        let tf = freq as f32;
        let ratio = Self::length_ratio(field_length, avg_field_length);
        (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * ratio))
    }
}

impl Default for BM25Similarity {
    fn default() -> Self {
        BM25Similarity { k1: 1.2, b: 0.75 }
    }
}

impl Similarity for BM25Similarity {
    fn name(&self) -> &str {
        "BM25"
    }

    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32 {
        let n = doc_count as f64;
        let df = doc_freq as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln() as f32
    }

    fn score(&self, boost: f32, stats: &TermStatistics, freq: u32, field_length: u32) -> f32 {
        let idf = self.idf(stats.doc_freq, stats.doc_count);
        boost * idf * self.tf_norm(freq, field_length, stats.avg_field_length)
    }

    fn explain(&self, boost: f32, stats: &TermStatistics, freq: u32, field_length: u32) -> ScoreExplanation {
        let idf = self.idf(stats.doc_freq, stats.doc_count);
        let tf_norm = self.tf_norm(freq, field_length, stats.avg_field_length);
        ScoreExplanation::new(
            self.score(boost, stats, freq, field_length),
            format!("BM25 score, computed as boost * idf * tf (k1={}, b={})", self.k1, self.b),
            vec![
                ScoreExplanation::leaf(boost, "boost"),
                ScoreExplanation::new(
                    idf,
                    "idf, computed as ln(1 + (N - n + 0.5) / (n + 0.5))",
                    vec![
                        ScoreExplanation::leaf(stats.doc_freq as f32, "n, number of documents containing term"),
                        ScoreExplanation::leaf(stats.doc_count as f32, "N, total number of documents"),
                    ],
                ),
                ScoreExplanation::new(
                    tf_norm,
                    "tf, computed as freq * (k1 + 1) / (freq + k1 * (1 - b + b * dl / avgdl))",
                    vec![
                        ScoreExplanation::leaf(freq as f32, "freq, occurrences of term within document"),
                        ScoreExplanation::leaf(field_length as f32, "dl, length of field"),
                        ScoreExplanation::leaf(stats.avg_field_length, "avgdl, average length of field"),
                    ],
                ),
            ],
        )
    }
}

/// Lucene's classic TF-IDF
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassicSimilarity;

impl ClassicSimilarity {
    fn length_norm(field_length: u32) -> f32 {
        1.0 / (field_length.max(1) as f32).sqrt()
    }
}

impl Similarity for ClassicSimilarity {
    fn name(&self) -> &str {
        "Classic"
    }

    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32 {
        (1.0 + (doc_count as f64 / (doc_freq as f64 + 1.0)).ln()) as f32
    }

    fn score(&self, boost: f32, stats: &TermStatistics, freq: u32, field_length: u32) -> f32 {
        let idf = self.idf(stats.doc_freq, stats.doc_count);
        boost * (freq as f32).sqrt() * idf * idf * Self::length_norm(field_length)
    }

    fn explain(&self, boost: f32, stats: &TermStatistics, freq: u32, field_length: u32) -> ScoreExplanation {
        let idf = self.idf(stats.doc_freq, stats.doc_count);
        ScoreExplanation::new(
            self.score(boost, stats, freq, field_length),
            "classic score, computed as boost * sqrt(freq) * idf^2 * lengthNorm",
            vec![
                ScoreExplanation::leaf(boost, "boost"),
                ScoreExplanation::leaf((freq as f32).sqrt(), format!("tf, sqrt of freq={}", freq)),
                ScoreExplanation::leaf(idf, format!(
                    "idf, computed as 1 + ln(N / (n + 1)) from N={}, n={}", stats.doc_count, stats.doc_freq
                )),
                ScoreExplanation::leaf(Self::length_norm(field_length), format!(
                    "lengthNorm, 1 / sqrt of field length {}", field_length
                )),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(doc_count: u64, doc_freq: u64, avg: f32) -> TermStatistics {
        TermStatistics { doc_count, doc_freq, avg_field_length: avg }
    }

    #[test]
    fn test_bm25_parameters_are_validated() {
        assert!(BM25Similarity::new(1.2, 0.75).is_ok());
        assert!(BM25Similarity::new(0.0, 0.0).is_ok());
        assert!(BM25Similarity::new(-0.1, 0.75).is_err());
        assert!(BM25Similarity::new(f32::INFINITY, 0.75).is_err());
        assert!(BM25Similarity::new(1.2, 1.5).is_err());
        assert!(BM25Similarity::new(1.2, f32::NAN).is_err());
        let default = BM25Similarity::default();
        assert_eq!((default.k1(), default.b()), (1.2, 0.75));
    }

    #[test]
    fn test_bm25_matches_formula() {
        let sim = BM25Similarity::default();
        // Three docs, term in two, avg length 1, this doc length 1, tf 1
        let s = stats(3, 2, 1.0);
        let idf = (1.0f64 + (3.0 - 2.0 + 0.5) / (2.0 + 0.5)).ln() as f32;
        let expected = idf * (1.0 * 2.2) / (1.0 + 1.2 * (1.0 - 0.75 + 0.75));
        assert!((sim.score(1.0, &s, 1, 1) - expected).abs() < 1e-6);
        assert!((sim.score(2.0, &s, 1, 1) - 2.0 * expected).abs() < 1e-6);
    }

    #[test]
    fn test_bm25_monotonicity() {
        let sim = BM25Similarity::default();
        let s = stats(100, 10, 8.0);
        let mut previous = 0.0;
        for tf in 1..50 {
            let score = sim.score(1.0, &s, tf, 8);
            assert!(score >= previous, "tf {}", tf);
            previous = score;
        }
        let mut previous = f32::MAX;
        for len in 1..100 {
            let score = sim.score(1.0, &s, 3, len);
            assert!(score <= previous, "len {}", len);
            previous = score;
        }
    }

    #[test]
    fn test_rarer_terms_score_higher() {
        for sim in [&BM25Similarity::default() as &dyn Similarity, &ClassicSimilarity] {
            assert!(sim.idf(1, 100) > sim.idf(50, 100), "{}", sim.name());
        }
    }

    #[test]
    fn test_explain_value_equals_score() {
        let s = stats(10, 3, 4.5);
        for sim in [&BM25Similarity::default() as &dyn Similarity, &ClassicSimilarity] {
            let explanation = sim.explain(1.5, &s, 2, 6);
            assert_eq!(explanation.value, sim.score(1.5, &s, 2, 6));
            assert!(!explanation.details.is_empty());
        }
    }

    #[test]
    fn test_zero_average_length_does_not_produce_nan() {
        let sim = BM25Similarity::default();
        assert!(sim.score(1.0, &stats(1, 1, 0.0), 1, 0).is_finite());
        assert!(ClassicSimilarity.score(1.0, &stats(1, 1, 0.0), 1, 0).is_finite());
    }
}
