//! Terms and statements
//!
//! A `Statement` is a predicate applied to a list of `Term`s, e.g.
//! `(isa socrates man)`. Terms are constants, variables (written `?x`), or
//! nested statements. Equality and hashing are structural throughout.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The prefix that marks a symbol as a variable in the textual notation.
pub const VARIABLE_PREFIX: char = '?';

/// A symbolic expression appearing inside a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A named constant, such as `socrates`.
    Constant(String),
    /// A variable, stored without its `?` prefix.
    Variable(String),
    /// A nested predicate application, such as `(father-of bob)`.
    Compound(Statement),
}

impl Term {
    /// Creates a constant term.
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Constant(name.into())
    }

    /// Creates a variable term. A leading `?` is stripped if present.
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix(VARIABLE_PREFIX) {
            Some(stripped) => Term::Variable(stripped.to_string()),
            None => Term::Variable(name),
        }
    }

    /// Creates a compound term from a statement.
    pub fn compound(statement: Statement) -> Self {
        Term::Compound(statement)
    }

    /// Interprets a bare symbol: `?x` is a variable, anything else a constant.
    pub fn symbol(symbol: &str) -> Self {
        match symbol.strip_prefix(VARIABLE_PREFIX) {
            Some(name) => Term::Variable(name.to_string()),
            None => Term::Constant(symbol.to_string()),
        }
    }

    /// Returns `true` if this term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Returns `true` if no variable occurs anywhere in this term.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Constant(_) => true,
            Term::Variable(_) => false,
            Term::Compound(statement) => statement.is_ground(),
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Term::Constant(_) => {}
            Term::Variable(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Term::Compound(statement) => {
                for term in &statement.terms {
                    term.collect_variables(out);
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(name) => write!(f, "{}", name),
            Term::Variable(name) => write!(f, "{}{}", VARIABLE_PREFIX, name),
            Term::Compound(statement) => write!(f, "{}", statement),
        }
    }
}

/// A predicate applied to an ordered list of terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// The predicate name.
    pub predicate: String,
    /// The arguments, in order.
    pub terms: Vec<Term>,
}

impl Statement {
    /// Creates a new statement.
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
        }
    }

    /// Creates a statement from bare symbols, interpreting `?x` as a variable.
    ///
    /// ```
    /// use aingle_tms::{Statement, Term};
    ///
    /// let s = Statement::from_symbols("isa", &["?x", "man"]);
    /// assert_eq!(s.terms[0], Term::variable("x"));
    /// assert_eq!(s.to_string(), "(isa ?x man)");
    /// ```
    pub fn from_symbols(predicate: impl Into<String>, symbols: &[&str]) -> Self {
        Self::new(predicate, symbols.iter().map(|s| Term::symbol(s)).collect())
    }

    /// Number of arguments.
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if no variable occurs anywhere in this statement.
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_ground)
    }

    /// Returns the distinct variable names in order of first occurrence.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for term in &self.terms {
            term.collect_variables(&mut out);
        }
        out
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for term in &self.terms {
            write!(f, " {}", term)?;
        }
        write!(f, ")")
    }
}
