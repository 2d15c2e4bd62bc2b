use crate::analysis::token::{Token, TokenStream};
use unicode_segmentation::UnicodeSegmentation;

pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a>;

    fn name(&self) -> &str;
}

/// Standard Unicode tokenizer (UAX #29 word boundaries)
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        let max_len = self.max_token_length;
        // Over-long words are dropped but still consume a position
        let words = text.unicode_word_indices()
            .enumerate()
            .filter(move |(_, (_, word))| word.len() <= max_len)
            .map(|(position, (offset, word))| Token::new(word.to_string(), position as u32, offset));
        Box::new(words)
    }

    fn name(&self) -> &str {
        "standard"
    }
}

/// Splits on Unicode whitespace only
#[derive(Debug, Clone, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        let base = text.as_ptr() as usize;
        let words = text.split_whitespace()
            .enumerate()
            .map(move |(position, word)| {
                Token::new(word.to_string(), position as u32, word.as_ptr() as usize - base)
            });
        Box::new(words)
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Emits the whole input as one token
#[derive(Debug, Clone, Default)]
pub struct KeywordTokenizer;

impl Tokenizer for KeywordTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        if text.is_empty() {
            return Box::new(std::iter::empty());
        }
        Box::new(std::iter::once(Token::new(text.to_string(), 0, 0)))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
