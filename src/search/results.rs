use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use crate::core::types::DocId;

/// Document with relevance score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDoc {
    pub doc: DocId,
    pub score: f32,
}

/// Search results container
#[derive(Debug, Clone, PartialEq)]
pub struct TopDocs {
    pub total_hits: usize,          // Every match, not only the returned ones
    pub score_docs: Vec<ScoreDoc>,  // Best first; equal scores by ascending doc
    pub max_score: Option<f32>,     // None when nothing matched
}

impl TopDocs {
    pub fn empty() -> Self {
        TopDocs {
            total_hits: 0,
            score_docs: Vec::new(),
            max_score: None,
        }
    }

    pub fn docs(&self) -> Vec<DocId> {
        self.score_docs.iter().map(|sd| sd.doc).collect()
    }
}

/// Score explanation for debugging
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreExplanation {
    pub matched: bool,
    pub value: f32,
    pub description: String,
    pub details: Vec<ScoreExplanation>,
}

impl ScoreExplanation {
    pub fn new(value: f32, description: impl Into<String>, details: Vec<ScoreExplanation>) -> Self {
        ScoreExplanation {
            matched: true,
            value,
            description: description.into(),
            details,
        }
    }

    pub fn leaf(value: f32, description: impl Into<String>) -> Self {
        Self::new(value, description, Vec::new())
    }

    pub fn no_match(description: impl Into<String>) -> Self {
        ScoreExplanation {
            matched: false,
            value: 0.0,
            description: description.into(),
            details: Vec::new(),
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{} = {}", "", self.value, self.description, indent = depth * 2)?;
        for detail in &self.details {
            detail.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ScoreExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

// Heap entry ordered so that the worst hit is the greatest
#[derive(Debug, Clone, Copy)]
struct Entry {
    doc: DocId,
    score: f32,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower score is worse; on equal scores the higher doc is worse
        other.score.total_cmp(&self.score)
            .then(self.doc.cmp(&other.doc))
    }
}

/// Top-N collector over a bounded heap
pub struct TopDocsCollector {
    heap: BinaryHeap<Entry>,
    n: usize,
    total_hits: usize,  // Track total documents processed
    max_score: Option<f32>,
}

impl TopDocsCollector {
    pub fn new(n: usize) -> Self {
        TopDocsCollector {
            heap: BinaryHeap::with_capacity(n.min(1024) + 1),
            n,
            total_hits: 0,
            max_score: None,
        }
    }

    pub fn collect(&mut self, doc: DocId, score: f32) {
        self.total_hits += 1;
        self.max_score = Some(match self.max_score {
            Some(max) if max.total_cmp(&score) == Ordering::Greater => max,
            _ => score,
        });

        let entry = Entry { doc, score };
        if self.heap.len() < self.n {
            self.heap.push(entry);
        } else if let Some(worst) = self.heap.peek() {
            if entry < *worst {
                self.heap.pop();
                self.heap.push(entry);
            }
        }
    }

    pub fn into_top_docs(self) -> TopDocs {
        let score_docs = self.heap.into_sorted_vec()
            .into_iter()
            .map(|e| ScoreDoc { doc: e.doc, score: e.score })
            .collect();
        TopDocs {
            total_hits: self.total_hits,
            score_docs,
            max_score: self.max_score,
        }
    }
}
