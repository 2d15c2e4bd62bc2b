use std::fmt;
use serde::{Deserialize, Serialize};
use crate::core::config::SearchConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::inverted::Term;

/// Main query enum representing all query types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Term(TermQuery),         // Single term search
    Boolean(BooleanQuery),   // Boolean combinations, possibly nested
}

impl Query {
    pub fn boost(&self) -> f32 {
        match self {
            Query::Term(q) => q.boost,
            Query::Boolean(q) => q.boost,
        }
    }

    /// Re-check invariants the builders enforce; deserialized queries skip them
    pub fn validate(&self, config: &SearchConfig) -> Result<()> {
        check_boost(self.boost())?;
        match self {
            Query::Term(q) => check_field(&q.term.field),
            Query::Boolean(q) => {
                q.check_clauses(config.max_clause_count)?;
                q.clauses.iter().try_for_each(|c| c.query.validate(config))
            }
        }
    }
}

impl From<TermQuery> for Query {
    fn from(query: TermQuery) -> Self {
        Query::Term(query)
    }
}

impl From<BooleanQuery> for Query {
    fn from(query: BooleanQuery) -> Self {
        Query::Boolean(query)
    }
}

impl From<Term> for Query {
    fn from(term: Term) -> Self {
        Query::Term(TermQuery::new(term))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term(q) => fmt::Display::fmt(q, f),
            Query::Boolean(q) => fmt::Display::fmt(q, f),
        }
    }
}

/// Single term query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub term: Term,
    pub boost: f32,
}

impl TermQuery {
    pub fn new(term: Term) -> Self {
        TermQuery { term, boost: 1.0 }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl fmt::Display for TermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term)?;
        write_boost(f, self.boost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occur {
    Must,      // All must match (AND)
    Should,    // At least one must match when there is no Must clause (OR)
    MustNot,   // None must match (NOT)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanClause {
    pub query: Query,
    pub occur: Occur,
}

/// Boolean query with must/should/must_not clauses.
/// Built with [`BooleanQueryBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
    boost: f32,
}

impl BooleanQuery {
    pub fn builder() -> BooleanQueryBuilder {
        BooleanQueryBuilder::new()
    }

    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    fn check_clauses(&self, max_clause_count: usize) -> Result<()> {
        if self.clauses.len() > max_clause_count {
            return Err(Error::new(
                ErrorKind::InvalidQuery,
                format!("boolean query has {} clauses, the maximum is {}", self.clauses.len(), max_clause_count),
            ));
        }
        if !self.clauses.iter().any(|c| c.occur != Occur::MustNot) {
            return Err(Error::new(
                ErrorKind::InvalidQuery,
                "boolean query needs at least one Must or Should clause".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            let prefix = match clause.occur {
                Occur::Must => "+",
                Occur::Should => "",
                Occur::MustNot => "-",
            };
            write!(f, "{}{}", prefix, clause.query)?;
        }
        write!(f, ")")?;
        write_boost(f, self.boost)
    }
}

pub struct BooleanQueryBuilder {
    clauses: Vec<BooleanClause>,
    boost: f32,
    max_clause_count: usize,
}

impl BooleanQueryBuilder {
    pub fn new() -> Self {
        Self::with_config(&SearchConfig::default())
    }

    pub fn with_config(config: &SearchConfig) -> Self {
        BooleanQueryBuilder {
            clauses: Vec::new(),
            boost: 1.0,
            max_clause_count: config.max_clause_count,
        }
    }

    pub fn add(mut self, query: impl Into<Query>, occur: Occur) -> Self {
        self.clauses.push(BooleanClause { query: query.into(), occur });
        self
    }

    pub fn must(self, query: impl Into<Query>) -> Self {
        self.add(query, Occur::Must)
    }

    pub fn should(self, query: impl Into<Query>) -> Self {
        self.add(query, Occur::Should)
    }

    pub fn must_not(self, query: impl Into<Query>) -> Self {
        self.add(query, Occur::MustNot)
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn build(self) -> Result<BooleanQuery> {
        check_boost(self.boost)?;
        let query = BooleanQuery {
            clauses: self.clauses,
            boost: self.boost,
        };
        query.check_clauses(self.max_clause_count)?;
        Ok(query)
    }
}

impl Default for BooleanQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_boost(boost: f32) -> Result<()> {
    if !boost.is_finite() || boost < 0.0 {
        return Err(Error::new(ErrorKind::InvalidQuery, format!("invalid boost {}", boost)));
    }
    Ok(())
}

/// Dictionary keys separate field from term with NUL
fn check_field(field: &str) -> Result<()> {
    if field.is_empty() || field.contains('\0') {
        return Err(Error::new(ErrorKind::InvalidQuery, format!("invalid term field {:?}", field)));
    }
    Ok(())
}

fn write_boost(f: &mut fmt::Formatter<'_>, boost: f32) -> fmt::Result {
    if boost != 1.0 {
        write!(f, "^{}", boost)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(text: &str) -> TermQuery {
        TermQuery::new(Term::text("a", text))
    }

    #[test]
    fn test_builder_rejects_must_not_only() {
        let err = BooleanQuery::builder().must_not(term("x")).build().unwrap_err();
        assert!(err.is(ErrorKind::InvalidQuery));
        let err = BooleanQuery::builder().build().unwrap_err();
        assert!(err.is(ErrorKind::InvalidQuery));
        assert!(BooleanQuery::builder().should(term("x")).must_not(term("y")).build().is_ok());
    }

    #[test]
    fn test_clause_limit() {
        let config = SearchConfig { max_clause_count: 2 };
        let ok = BooleanQueryBuilder::with_config(&config)
            .should(term("a"))
            .should(term("b"))
            .build();
        assert!(ok.is_ok());

        let err = BooleanQueryBuilder::with_config(&config)
            .should(term("a"))
            .should(term("b"))
            .should(term("c"))
            .build()
            .unwrap_err();
        assert!(err.is(ErrorKind::InvalidQuery));
    }

    #[test]
    fn test_validate_nested_and_boost() {
        let inner = BooleanQuery::builder().must(term("x")).build().unwrap();
        let outer = BooleanQuery::builder().should(inner).should(term("y").with_boost(2.0)).build().unwrap();
        let query = Query::from(outer);
        assert!(query.validate(&SearchConfig::default()).is_ok());
        assert_eq!(query.to_string(), "((+a:x) a:y^2)");

        let bad = Query::from(term("x").with_boost(f32::NAN));
        assert!(bad.validate(&SearchConfig::default()).is_err());
        assert!(BooleanQuery::builder().must(term("x")).boost(-1.0).build().is_err());
    }

    #[test]
    fn test_validate_rejects_ambiguous_term_fields() {
        let config = SearchConfig::default();
        let nul = Query::from(TermQuery::new(Term::text("x\0y", "b")));
        assert!(nul.validate(&config).unwrap_err().is(ErrorKind::InvalidQuery));
        let empty = Query::from(TermQuery::new(Term::text("", "b")));
        assert!(empty.validate(&config).unwrap_err().is(ErrorKind::InvalidQuery));

        let nested = BooleanQuery::builder()
            .should(term("ok"))
            .should(TermQuery::new(Term::text("x\0y", "b")))
            .build()
            .unwrap();
        assert!(Query::from(nested).validate(&config).unwrap_err().is(ErrorKind::InvalidQuery));
    }
}
