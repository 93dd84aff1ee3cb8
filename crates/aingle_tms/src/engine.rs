//! Forward-chaining inference step
//!
//! The engine is stateless. Given one fact and one rule it either derives
//! nothing, a fact (when the rule had a single condition left), or a shorter
//! rule (when conditions remain). Recording the derivation and asserting it
//! is the knowledge base's job.

use log::trace;

use crate::config::Verbosity;
use crate::item::{Fact, Item, Rule};
use crate::unify::{instantiate, match_statement};

/// Performs single forward-chaining steps between a fact and a rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferenceEngine {
    verbosity: Verbosity,
}

impl InferenceEngine {
    /// Creates an engine that reports at the given verbosity.
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Tries to satisfy `rule`'s leading condition with `fact`.
    ///
    /// On a match the substitution is applied to the conclusion and, if any
    /// conditions remain, to those conditions as well (order preserved):
    ///
    /// ```text
    ///   (isa socrates man)  +  ((isa ?x man)) -> (mortal ?x)
    ///       => fact: (mortal socrates)
    ///
    ///   (isa socrates man)  +  ((isa ?x man) (greek ?x)) -> (philosopher ?x)
    ///       => rule: ((greek socrates)) -> (philosopher socrates)
    /// ```
    ///
    /// Returns `None` when the condition does not match; that is a normal
    /// outcome, not an error. Neither input is modified.
    pub fn fc_infer(&self, fact: &Fact, rule: &Rule) -> Option<Item> {
        if self.verbosity.allows(Verbosity::Verbose) {
            trace!(
                "Attempting to infer from {} and {}",
                fact.statement,
                rule
            );
        }

        let bindings = match_statement(rule.first_condition(), &fact.statement)?;
        let conclusion = instantiate(rule.rhs(), &bindings);

        let derived = if rule.rest().is_empty() {
            Item::Fact(Fact::new(conclusion))
        } else {
            let remaining = rule
                .rest()
                .iter()
                .map(|condition| instantiate(condition, &bindings))
                .collect();
            Item::Rule(Rule::from_parts(remaining, conclusion))
        };

        if self.verbosity.allows(Verbosity::Verbose) {
            trace!("Derived {} with {}", derived, bindings);
        }
        Some(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Statement;

    fn st(predicate: &str, symbols: &[&str]) -> Statement {
        Statement::from_symbols(predicate, symbols)
    }

    #[test]
    fn test_single_condition_derives_fact() {
        let engine = InferenceEngine::default();
        let fact = Fact::new(st("isa", &["socrates", "man"]));
        let rule = Rule::new(vec![st("isa", &["?x", "man"])], st("mortal", &["?x"])).unwrap();

        let derived = engine.fc_infer(&fact, &rule).unwrap();
        assert_eq!(derived, Item::Fact(Fact::new(st("mortal", &["socrates"]))));
    }

    #[test]
    fn test_multiple_conditions_derive_rule() {
        let engine = InferenceEngine::default();
        let fact = Fact::new(st("isa", &["cube", "block"]));
        let rule = Rule::new(
            vec![
                st("isa", &["?x", "block"]),
                st("larger", &["?x", "?y"]),
                st("color", &["?y", "?c"]),
            ],
            st("bigger", &["?x", "?y"]),
        )
        .unwrap();

        let derived = engine.fc_infer(&fact, &rule).unwrap();
        let expected = Rule::new(
            vec![st("larger", &["cube", "?y"]), st("color", &["?y", "?c"])],
            st("bigger", &["cube", "?y"]),
        )
        .unwrap();
        assert_eq!(derived, Item::Rule(expected));
    }

    #[test]
    fn test_no_match_derives_nothing() {
        let engine = InferenceEngine::new(Verbosity::Verbose);
        let fact = Fact::new(st("isa", &["cube", "block"]));
        let rule = Rule::new(vec![st("isa", &["?x", "man"])], st("mortal", &["?x"])).unwrap();

        assert!(engine.fc_infer(&fact, &rule).is_none());
    }

    #[test]
    fn test_only_leading_condition_is_tried() {
        let engine = InferenceEngine::default();
        let fact = Fact::new(st("greek", &["socrates"]));
        let rule = Rule::new(
            vec![st("isa", &["?x", "man"]), st("greek", &["?x"])],
            st("philosopher", &["?x"]),
        )
        .unwrap();

        assert!(engine.fc_infer(&fact, &rule).is_none());
    }
}
