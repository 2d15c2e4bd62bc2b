use std::collections::HashMap;
use std::sync::Arc;
use rust_stemmers::Algorithm;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::TokenStream;
use crate::analysis::tokenizer::{KeywordTokenizer, StandardTokenizer, Tokenizer, WhitespaceTokenizer};

/// Turns a field value into the terms that get indexed
pub trait Analyzer: Send + Sync {
    fn token_stream<'a>(&'a self, field: &str, text: &'a str) -> TokenStream<'a>;

    fn name(&self) -> &str;
}

/// Text analysis pipeline: one tokenizer followed by filters
pub struct TextAnalyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl TextAnalyzer {
    pub fn new(name: impl Into<String>, tokenizer: Box<dyn Tokenizer>) -> Self {
        TextAnalyzer {
            tokenizer,
            filters: Vec::new(),
            name: name.into(),
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Unicode word segmentation, lowercased
    pub fn standard() -> Self {
        TextAnalyzer::new("standard", Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
    }

    pub fn whitespace() -> Self {
        TextAnalyzer::new("whitespace", Box::new(WhitespaceTokenizer))
    }

    /// Whole value as a single term
    pub fn keyword() -> Self {
        TextAnalyzer::new("keyword", Box::new(KeywordTokenizer))
    }

    /// Standard analysis plus English stop words and Snowball stemming
    pub fn english() -> Self {
        TextAnalyzer::new("english", Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
            .add_filter(Box::new(StopWordFilter::english()))
            .add_filter(Box::new(StemmerFilter::new(Algorithm::English)))
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        TextAnalyzer::standard()
    }
}

impl Analyzer for TextAnalyzer {
    fn token_stream<'a>(&'a self, _field: &str, text: &'a str) -> TokenStream<'a> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Routes each field to its own analyzer, falling back to a default
pub struct PerFieldAnalyzer {
    default: Arc<dyn Analyzer>,
    analyzers: HashMap<String, Arc<dyn Analyzer>>,
}

impl PerFieldAnalyzer {
    pub fn new(default: Arc<dyn Analyzer>) -> Self {
        PerFieldAnalyzer {
            default,
            analyzers: HashMap::new(),
        }
    }

    pub fn with_field(mut self, field: &str, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzers.insert(field.to_string(), analyzer);
        self
    }

    pub fn get(&self, field: &str) -> &Arc<dyn Analyzer> {
        self.analyzers.get(field).unwrap_or(&self.default)
    }
}

impl Analyzer for PerFieldAnalyzer {
    fn token_stream<'a>(&'a self, field: &str, text: &'a str) -> TokenStream<'a> {
        self.get(field).token_stream(field, text)
    }

    fn name(&self) -> &str {
        "per_field"
    }
}
