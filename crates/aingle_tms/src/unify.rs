//! Pattern matching and substitution
//!
//! `match_statement` is one-way unification: variables may only occur in the
//! pattern, and the other side is treated as ground. A variable on the ground
//! side is an opaque symbol that only a pattern variable can bind to.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::term::{Statement, Term};

/// Variable bindings produced by a successful match.
///
/// Bindings keep the order in which variables were bound, so answers print
/// deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    values: IndexMap<String, Term>,
}

impl Bindings {
    /// Create empty bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a value
    pub fn bind(&mut self, var: impl Into<String>, value: Term) {
        self.values.insert(var.into(), value);
    }

    /// Get a bound value
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.values.get(var)
    }

    /// Check if a variable is bound
    pub fn is_bound(&self, var: &str) -> bool {
        self.values.contains_key(var)
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing is bound, e.g. after matching a ground query.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(variable, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (var, value) in &self.values {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "?{} : {}", var, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Matches `pattern` against `ground`, returning the bindings that make them equal.
///
/// Returns `None` when the predicates, arities or any argument disagree.
/// Failure to match is a normal outcome, not an error.
///
/// ```
/// use aingle_tms::{Statement, Term};
/// use aingle_tms::unify::match_statement;
///
/// let pattern = Statement::from_symbols("isa", &["?x", "man"]);
/// let fact = Statement::from_symbols("isa", &["socrates", "man"]);
///
/// let bindings = match_statement(&pattern, &fact).unwrap();
/// assert_eq!(bindings.get("x"), Some(&Term::constant("socrates")));
/// ```
pub fn match_statement(pattern: &Statement, ground: &Statement) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    if match_statement_with(pattern, ground, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

/// Matches `pattern` against `ground`, extending existing bindings.
///
/// On failure the bindings may be partially extended; callers that need to
/// retry should clone first.
pub fn match_statement_with(
    pattern: &Statement,
    ground: &Statement,
    bindings: &mut Bindings,
) -> bool {
    pattern.predicate == ground.predicate
        && pattern.terms.len() == ground.terms.len()
        && pattern
            .terms
            .iter()
            .zip(&ground.terms)
            .all(|(p, g)| match_term(p, g, bindings))
}

/// Matches a single pattern term against a ground term.
pub fn match_term(pattern: &Term, ground: &Term, bindings: &mut Bindings) -> bool {
    match (pattern, ground) {
        (Term::Variable(var), _) => {
            if let Some(bound) = bindings.get(var) {
                bound == ground
            } else {
                bindings.bind(var.clone(), ground.clone());
                true
            }
        }
        (Term::Constant(c1), Term::Constant(c2)) => c1 == c2,
        (Term::Compound(p), Term::Compound(g)) => match_statement_with(p, g, bindings),
        _ => false,
    }
}

/// Replaces every bound variable in `statement` with its value.
///
/// Unbound variables are left in place.
pub fn instantiate(statement: &Statement, bindings: &Bindings) -> Statement {
    Statement {
        predicate: statement.predicate.clone(),
        terms: statement
            .terms
            .iter()
            .map(|t| instantiate_term(t, bindings))
            .collect(),
    }
}

/// Replaces every bound variable in `term` with its value.
pub fn instantiate_term(term: &Term, bindings: &Bindings) -> Term {
    match term {
        Term::Constant(_) => term.clone(),
        Term::Variable(var) => bindings.get(var).cloned().unwrap_or_else(|| term.clone()),
        Term::Compound(statement) => Term::Compound(instantiate(statement, bindings)),
    }
}
