//! Search terms and predicates
//!
//! A `Term` is one indexable (parameter, value) fact derived from a resource
//! body by the term extractor. A `Predicate` is a conjunction of equality
//! terms used to target conditional operations; the store never interprets
//! it, it only hands it to the injected search resolver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One indexable (parameter name, value) fact
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    /// Search parameter name, e.g. "name" or "identifier"
    pub param: String,
    /// Extracted value
    pub value: String,
}

impl Term {
    /// Create a new term
    pub fn new(param: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.param, self.value)
    }
}

/// Conjunction of equality terms targeting conditional operations
///
/// An empty predicate matches nothing. Predicates are built fluently:
///
/// ```
/// use chronicle_core::search::Predicate;
///
/// let p = Predicate::matching("name", "Smith").and("identifier", "urn:system|001");
/// assert_eq!(p.terms().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    /// Create an empty predicate (matches nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a predicate with a single equality term
    pub fn matching(param: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            terms: vec![Term::new(param, value)],
        }
    }

    /// Add another equality term (conjunction)
    pub fn and(mut self, param: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push(Term::new(param, value));
        self
    }

    /// The terms of this predicate
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// True if the predicate has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, "&")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}
