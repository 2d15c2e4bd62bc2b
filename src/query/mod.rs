pub mod ast;

pub use ast::{BooleanClause, BooleanQuery, BooleanQueryBuilder, Occur, Query, TermQuery};
pub use crate::index::inverted::Term;
