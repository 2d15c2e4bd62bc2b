use std::fmt;
use std::sync::Arc;
use crate::analysis::analyzer::{Analyzer, TextAnalyzer};
use crate::codec::Codec;
use crate::codec::simple_text::SimpleTextCodec;

/// What `IndexWriter::open` does with an existing index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    Create,          // Delete every existing index file
    Append,          // Require an existing commit
    #[default]
    CreateOrAppend,  // Append if a commit exists, otherwise start empty
}

#[derive(Clone)]
pub struct IndexWriterConfig {
    pub analyzer: Arc<dyn Analyzer>,
    pub codec: Arc<dyn Codec>,
    pub open_mode: OpenMode,
}

impl IndexWriterConfig {
    pub fn new(analyzer: Arc<dyn Analyzer>, codec: Arc<dyn Codec>) -> Self {
        IndexWriterConfig {
            analyzer,
            codec,
            open_mode: OpenMode::default(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = open_mode;
        self
    }
}

impl Default for IndexWriterConfig {
    fn default() -> Self {
        IndexWriterConfig {
            analyzer: Arc::new(TextAnalyzer::standard()),
            codec: Arc::new(SimpleTextCodec),
            open_mode: OpenMode::default(),
        }
    }
}

impl fmt::Debug for IndexWriterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexWriterConfig")
            .field("analyzer", &self.analyzer.name())
            .field("codec", &self.codec.name())
            .field("open_mode", &self.open_mode)
            .finish()
    }
}

/// Limits applied while building queries
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_clause_count: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_clause_count: 1024,
        }
    }
}
