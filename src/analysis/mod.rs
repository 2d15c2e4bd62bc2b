pub mod analyzer;
pub mod filter;
pub mod filters;
pub mod token;
pub mod tokenizer;
