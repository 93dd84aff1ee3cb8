//! Fact and rule values
//!
//! These are the shapes callers hand to the knowledge base. Identity is
//! structural: two facts with equal statements are the same fact, and two
//! rules with equal conditions and conclusion are the same rule. The
//! bookkeeping that makes a fact "true" (assertion, support) lives in the
//! justification graph, not here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::term::Statement;

/// A statement declared or derived to be true.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    /// The statement this fact asserts.
    pub statement: Statement,
}

impl Fact {
    /// Creates a new fact.
    pub fn new(statement: Statement) -> Self {
        Self { statement }
    }

    /// Returns `true` if the statement contains no variables.
    pub fn is_ground(&self) -> bool {
        self.statement.is_ground()
    }
}

impl From<Statement> for Fact {
    fn from(statement: Statement) -> Self {
        Fact::new(statement)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact: {}", self.statement)
    }
}

/// A conjunctive rule: when every condition in `lhs` holds, `rhs` holds.
///
/// Conditions are consumed strictly left to right during forward chaining.
/// A rule with several conditions left may be a partially satisfied rule
/// produced by chaining; it is stored and treated like any other rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RuleRepr", into = "RuleRepr")]
pub struct Rule {
    lhs: Vec<Statement>,
    rhs: Statement,
}

impl Rule {
    /// Creates a new rule. The left-hand side must not be empty.
    pub fn new(lhs: Vec<Statement>, rhs: Statement) -> Result<Self> {
        if lhs.is_empty() {
            return Err(Error::InvalidRule(format!(
                "rule concluding {} has no conditions",
                rhs
            )));
        }
        Ok(Self { lhs, rhs })
    }

    /// Builds a rule whose left-hand side is known to be non-empty.
    pub(crate) fn from_parts(lhs: Vec<Statement>, rhs: Statement) -> Self {
        debug_assert!(!lhs.is_empty());
        Self { lhs, rhs }
    }

    /// Starts a fluent rule definition.
    pub fn builder() -> RuleBuilder {
        RuleBuilder::new()
    }

    /// The ordered conditions.
    pub fn lhs(&self) -> &[Statement] {
        &self.lhs
    }

    /// The conclusion.
    pub fn rhs(&self) -> &Statement {
        &self.rhs
    }

    /// The leading condition, matched first during chaining.
    pub fn first_condition(&self) -> &Statement {
        // `new` guarantees at least one condition.
        &self.lhs[0]
    }

    /// The conditions after the leading one.
    pub fn rest(&self) -> &[Statement] {
        &self.lhs[1..]
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule: (")?;
        for (i, condition) in self.lhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", condition)?;
        }
        write!(f, ") -> {}", self.rhs)
    }
}

#[derive(Serialize, Deserialize)]
struct RuleRepr {
    lhs: Vec<Statement>,
    rhs: Statement,
}

impl TryFrom<RuleRepr> for Rule {
    type Error = Error;

    fn try_from(repr: RuleRepr) -> Result<Self> {
        Rule::new(repr.lhs, repr.rhs)
    }
}

impl From<Rule> for RuleRepr {
    fn from(rule: Rule) -> Self {
        RuleRepr {
            lhs: rule.lhs,
            rhs: rule.rhs,
        }
    }
}

/// A builder for creating `Rule`s using a fluent API.
#[derive(Debug, Clone, Default)]
pub struct RuleBuilder {
    lhs: Vec<Statement>,
}

impl RuleBuilder {
    /// Creates a builder with no conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a condition.
    pub fn when(mut self, condition: Statement) -> Self {
        self.lhs.push(condition);
        self
    }

    /// Sets the conclusion and builds the rule.
    pub fn then(self, rhs: Statement) -> Result<Rule> {
        Rule::new(self.lhs, rhs)
    }
}

/// Either a fact or a rule: everything the knowledge base stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Fact(Fact),
    Rule(Rule),
}

impl Item {
    /// Returns `"fact"` or `"rule"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Item::Fact(_) => "fact",
            Item::Rule(_) => "rule",
        }
    }

    /// Returns the fact, if this item is one.
    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            Item::Fact(fact) => Some(fact),
            Item::Rule(_) => None,
        }
    }

    /// Returns the rule, if this item is one.
    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Item::Fact(_) => None,
            Item::Rule(rule) => Some(rule),
        }
    }
}

impl From<Fact> for Item {
    fn from(fact: Fact) -> Self {
        Item::Fact(fact)
    }
}

impl From<Rule> for Item {
    fn from(rule: Rule) -> Self {
        Item::Rule(rule)
    }
}

impl From<Statement> for Item {
    fn from(statement: Statement) -> Self {
        Item::Fact(Fact::new(statement))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Fact(fact) => fact.fmt(f),
            Item::Rule(rule) => rule.fmt(f),
        }
    }
}
