//! Knowledge base with forward chaining and truth maintenance
//!
//! The knowledge base owns a [`JustificationGraph`] and keeps it consistent
//! across three operations:
//!
//! - `assert`: record a fact or rule, then chain it against every stored item
//!   of the opposite kind until no new conclusion follows
//! - `retract`: withdraw an assertion and remove everything whose last
//!   justification depended on it
//! - `ask`: match a fact pattern against the stored facts
//!
//! A stored item is present exactly when it is asserted or has at least one
//! `(fact, rule)` justification.

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{KbConfig, Verbosity};
use crate::engine::InferenceEngine;
use crate::error::{Error, Result};
use crate::explain::Explanation;
use crate::graph::{FactNode, JustificationGraph, NodeId, Removed, RuleNode, Support};
use crate::item::{Fact, Item, Rule};
use crate::term::Statement;
use crate::unify::{match_statement, Bindings};

/// Result of a successful `assert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertOutcome {
    /// The item was new. Chaining stored this many new facts and rules.
    Inserted {
        derived_facts: usize,
        derived_rules: usize,
    },
    /// The item was already present; it is now marked asserted.
    Reasserted,
}

/// Result of a `retract`. None of these is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetractOutcome {
    /// Nothing structurally equal to the item is stored.
    NotFound,
    /// The fact is no longer asserted but other derivations still justify it.
    StillSupported,
    /// The rule is asserted or supported and cannot be retracted directly.
    Rejected,
    /// The item and everything that depended solely on it were removed.
    Removed(Removed),
}

/// One answer to a query: the bindings and the stored fact they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub bindings: Bindings,
    pub fact: Fact,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            write!(f, "{}", self.fact.statement)
        } else {
            write!(f, "{} ({})", self.bindings, self.fact.statement)
        }
    }
}

/// Counters describing the work a knowledge base has done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KbStats {
    /// External `assert` calls.
    pub asserts: usize,
    /// External `retract` calls.
    pub retracts: usize,
    /// Fact/rule pairs tried by the inference engine.
    pub inference_attempts: usize,
    /// Successful inference steps, including ones that only added support.
    pub derivations: usize,
    /// Facts deleted by retraction cascades.
    pub facts_removed: usize,
    /// Rules deleted by retraction cascades.
    pub rules_removed: usize,
}

/// Pairings still owed to one newly stored item.
///
/// `end` is the number of opposite-kind items stored when the item was
/// inserted. Items stored later pair with it from their own frame, so each
/// fact/rule pair is tried once.
struct Pairing {
    node: NodeId,
    next: usize,
    end: usize,
}

/// What `add` did with one item.
enum Added {
    New(Pairing),
    Merged,
    Reasserted,
}

/// A forward-chaining knowledge base with justification-based truth maintenance.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    graph: JustificationGraph,
    engine: InferenceEngine,
    config: KbConfig,
    stats: KbStats,
}

impl KnowledgeBase {
    /// Creates an empty knowledge base with the default configuration.
    pub fn new() -> Self {
        Self::with_config(KbConfig::default())
    }

    /// Creates an empty knowledge base with the given configuration.
    pub fn with_config(config: KbConfig) -> Self {
        Self {
            graph: JustificationGraph::new(),
            engine: InferenceEngine::new(config.verbosity),
            config,
            stats: KbStats::default(),
        }
    }

    /// Creates a knowledge base by asserting `facts` and then `rules`.
    ///
    /// Inference has already run when this returns.
    ///
    /// ```
    /// use aingle_tms::{Fact, KnowledgeBase, Rule, Statement};
    ///
    /// let kb = KnowledgeBase::with_items(
    ///     vec![Fact::new(Statement::from_symbols("isa", &["socrates", "man"]))],
    ///     vec![Rule::new(
    ///         vec![Statement::from_symbols("isa", &["?x", "man"])],
    ///         Statement::from_symbols("mortal", &["?x"]),
    ///     )?],
    /// )?;
    ///
    /// let answers = kb.ask(Statement::from_symbols("mortal", &["socrates"]));
    /// assert_eq!(answers.len(), 1);
    /// # Ok::<(), aingle_tms::Error>(())
    /// ```
    pub fn with_items(
        facts: impl IntoIterator<Item = Fact>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Result<Self> {
        Self::with_items_and_config(KbConfig::default(), facts, rules)
    }

    /// Like [`with_items`](Self::with_items), with an explicit configuration.
    ///
    /// The derivation limit applies to each initial assertion separately.
    pub fn with_items_and_config(
        config: KbConfig,
        facts: impl IntoIterator<Item = Fact>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Result<Self> {
        let mut kb = Self::with_config(config);
        for fact in facts {
            kb.assert(fact)?;
        }
        for rule in rules {
            kb.assert(rule)?;
        }
        Ok(kb)
    }

    /// Asserts every item in order, stopping at the first error.
    pub fn assert_all(&mut self, items: impl IntoIterator<Item = Item>) -> Result<()> {
        for item in items {
            self.assert(item)?;
        }
        Ok(())
    }

    /// The active configuration.
    pub fn config(&self) -> &KbConfig {
        &self.config
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> &KbStats {
        &self.stats
    }

    /// Read access to the underlying justification graph.
    pub fn graph(&self) -> &JustificationGraph {
        &self.graph
    }

    /// Number of stored facts.
    pub fn fact_count(&self) -> usize {
        self.graph.fact_count()
    }

    /// Number of stored rules.
    pub fn rule_count(&self) -> usize {
        self.graph.rule_count()
    }

    /// Returns `true` if no facts or rules are stored.
    pub fn is_empty(&self) -> bool {
        self.fact_count() == 0 && self.rule_count() == 0
    }

    /// Stored facts, in storage order.
    pub fn facts(&self) -> impl Iterator<Item = &Fact> + '_ {
        self.graph.facts().map(|(_, record)| record.value())
    }

    /// Stored rules, in storage order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.graph.rules().map(|(_, record)| record.value())
    }

    /// The stored record for a fact, if present.
    pub fn fact(&self, fact: &Fact) -> Option<&FactNode> {
        self.graph.fact_id(fact).and_then(|id| self.graph.fact(id))
    }

    /// The stored record for a rule, if present.
    pub fn rule(&self, rule: &Rule) -> Option<&RuleNode> {
        self.graph.rule_id(rule).and_then(|id| self.graph.rule(id))
    }

    /// Returns `true` if a structurally equal item is stored.
    pub fn contains(&self, item: &Item) -> bool {
        self.node_id(item).is_some()
    }

    /// The justifications of a stored item, resolved to values.
    ///
    /// Returns an empty vector for absent or purely asserted items.
    pub fn justifications(&self, item: &Item) -> Vec<(Fact, Rule)> {
        let supports: Vec<Support> = match self.node_id(item) {
            Some(NodeId::Fact(id)) => self
                .graph
                .fact(id)
                .map(|r| r.supported_by().copied().collect()),
            Some(NodeId::Rule(id)) => self
                .graph
                .rule(id)
                .map(|r| r.supported_by().copied().collect()),
            None => None,
        }
        .unwrap_or_default();

        supports
            .into_iter()
            .filter_map(|s| {
                let fact = self.graph.fact(s.fact)?.value().clone();
                let rule = self.graph.rule(s.rule)?.value().clone();
                Some((fact, rule))
            })
            .collect()
    }

    fn node_id(&self, item: &Item) -> Option<NodeId> {
        match item {
            Item::Fact(fact) => self.graph.fact_id(fact).map(NodeId::Fact),
            Item::Rule(rule) => self.graph.rule_id(rule).map(NodeId::Rule),
        }
    }

    fn reports(&self, level: Verbosity) -> bool {
        self.config.verbosity.allows(level)
    }

    /// Declares a fact or rule true and chains it to a fixed point.
    ///
    /// Asserting something already stored never duplicates it; it only marks
    /// the stored copy as asserted.
    ///
    /// # Errors
    ///
    /// Returns `Error::DerivationLimitExceeded` if chaining needs more steps
    /// than `KbConfig::max_derivations`. Everything derived up to that point
    /// stays in place and the graph remains consistent.
    pub fn assert(&mut self, item: impl Into<Item>) -> Result<AssertOutcome> {
        let item = item.into();
        if self.reports(Verbosity::Normal) {
            info!("Asserting {}", item);
        }
        self.stats.asserts += 1;

        let pairing = match self.add(item, None) {
            Added::New(pairing) => pairing,
            Added::Merged | Added::Reasserted => return Ok(AssertOutcome::Reasserted),
        };

        let (derived_facts, derived_rules) = self.chain(pairing)?;
        Ok(AssertOutcome::Inserted {
            derived_facts,
            derived_rules,
        })
    }

    /// Stores one item, or merges it into the stored copy.
    ///
    /// A new item owes a pairing with every stored item of the opposite kind.
    /// An existing item gains `support` if one is given and is otherwise
    /// marked asserted; either way it owes nothing, since its truth has not
    /// changed.
    fn add(&mut self, item: Item, support: Option<Support>) -> Added {
        if self.reports(Verbosity::Verbose) {
            debug!("Adding {}", item);
        }

        let (node, end) = match item {
            Item::Fact(fact) => {
                if let Some(id) = self.graph.fact_id(&fact) {
                    return self.merge(NodeId::Fact(id), support);
                }
                let end = self.graph.rule_count();
                (NodeId::Fact(self.graph.insert_fact(fact, support.is_none())), end)
            }
            Item::Rule(rule) => {
                if let Some(id) = self.graph.rule_id(&rule) {
                    return self.merge(NodeId::Rule(id), support);
                }
                let end = self.graph.fact_count();
                (NodeId::Rule(self.graph.insert_rule(rule, support.is_none())), end)
            }
        };

        if let Some(support) = support {
            self.graph.add_support(node, support);
        }
        Added::New(Pairing { node, next: 0, end })
    }

    fn merge(&mut self, node: NodeId, support: Option<Support>) -> Added {
        match support {
            Some(support) => {
                self.graph.add_support(node, support);
                Added::Merged
            }
            None => {
                self.graph.set_asserted(node, true);
                Added::Reasserted
            }
        }
    }

    /// Works off pairings depth-first until none remain.
    ///
    /// A newly derived item is chained to completion before the item that
    /// produced it moves on to its next partner, so derived items are stored
    /// in the same order a recursive assert would store them. Nothing is
    /// removed while chaining, which keeps storage indices stable.
    ///
    /// Returns the number of new facts and rules stored.
    fn chain(&mut self, root: Pairing) -> Result<(usize, usize)> {
        let mut stack = vec![root];
        let mut derivations = 0usize;
        let mut derived_facts = 0;
        let mut derived_rules = 0;

        while let Some(top) = stack.last_mut() {
            if top.next >= top.end {
                stack.pop();
                continue;
            }
            let index = top.next;
            top.next += 1;

            let pair = match top.node {
                NodeId::Fact(fact) => self
                    .graph
                    .rule_id_at(index)
                    .map(|rule| Support::new(fact, rule)),
                NodeId::Rule(rule) => self
                    .graph
                    .fact_id_at(index)
                    .map(|fact| Support::new(fact, rule)),
            };
            let Some(pair) = pair else {
                continue;
            };
            let (Some(fact), Some(rule)) = (self.graph.fact(pair.fact), self.graph.rule(pair.rule))
            else {
                continue;
            };
            self.stats.inference_attempts += 1;

            let Some(derived) = self.engine.fc_infer(fact.value(), rule.value()) else {
                continue;
            };

            derivations += 1;
            if derivations > self.config.max_derivations {
                warn!(
                    "Stopping forward chaining after {} derivations",
                    self.config.max_derivations
                );
                return Err(Error::DerivationLimitExceeded {
                    limit: self.config.max_derivations,
                });
            }
            self.stats.derivations += 1;

            if let Added::New(pairing) = self.add(derived, Some(pair)) {
                match pairing.node {
                    NodeId::Fact(_) => derived_facts += 1,
                    NodeId::Rule(_) => derived_rules += 1,
                }
                stack.push(pairing);
            }
        }

        Ok((derived_facts, derived_rules))
    }

    /// Queries the stored facts with a fact pattern.
    ///
    /// Returns one answer per matching fact, in storage order, or an empty
    /// vector if nothing matches. A rule-shaped query is reported as invalid
    /// and also yields an empty vector.
    ///
    /// Matching is one-way: a variable in a stored fact is an opaque symbol
    /// that only a query variable can bind to.
    pub fn ask(&self, query: impl Into<Item>) -> Vec<Answer> {
        match self.try_ask(query) {
            Ok(answers) => answers,
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }

    /// Like [`ask`](Self::ask), but reports a rule-shaped query as
    /// `Error::InvalidQuery`.
    pub fn try_ask(&self, query: impl Into<Item>) -> Result<Vec<Answer>> {
        let query = match query.into() {
            Item::Fact(fact) => fact,
            Item::Rule(rule) => return Err(Error::InvalidQuery(rule.to_string())),
        };
        if self.reports(Verbosity::Normal) {
            info!("Asking {}", query);
        }

        Ok(self
            .graph
            .facts()
            .filter_map(|(_, record)| {
                match_statement(&query.statement, record.statement()).map(|bindings| Answer {
                    bindings,
                    fact: record.value().clone(),
                })
            })
            .collect())
    }

    /// Withdraws an external assertion.
    ///
    /// - A fact loses its asserted flag. If other derivations still justify
    ///   it, it stays; otherwise it is removed along with everything whose
    ///   only justification depended on it.
    /// - A rule that is asserted or still supported cannot be retracted
    ///   directly; the call is rejected and nothing changes. Rules leave the
    ///   knowledge base only through a cascade.
    pub fn retract(&mut self, item: impl Into<Item>) -> RetractOutcome {
        let item = item.into();
        if self.reports(Verbosity::Normal) {
            info!("Retracting {}", item);
        }
        self.stats.retracts += 1;

        let Some(node) = self.node_id(&item) else {
            if self.reports(Verbosity::Verbose) {
                debug!("Nothing to retract for {}", item);
            }
            return RetractOutcome::NotFound;
        };

        match node {
            NodeId::Fact(id) => {
                self.graph.set_asserted(node, false);
                if self.graph.fact(id).is_some_and(|r| r.is_supported()) {
                    if self.reports(Verbosity::Verbose) {
                        debug!("{} remains supported", item);
                    }
                    return RetractOutcome::StillSupported;
                }
            }
            NodeId::Rule(id) => {
                if self.graph.rule(id).is_some_and(|r| r.is_justified()) {
                    if self.reports(Verbosity::Normal) {
                        info!("Rejected retraction of {}: still asserted or supported", item);
                    }
                    return RetractOutcome::Rejected;
                }
            }
        }

        let removed = self.graph.remove_cascade(node);
        self.stats.facts_removed += removed.facts.len();
        self.stats.rules_removed += removed.rules.len();
        if self.reports(Verbosity::Verbose) {
            debug!(
                "Retraction removed {} facts and {} rules",
                removed.facts.len(),
                removed.rules.len()
            );
        }
        RetractOutcome::Removed(removed)
    }

    /// Like [`retract`](Self::retract), but reports an absent item as
    /// `Error::NotFound` and a rejected rule as `Error::IllegalRetract`.
    ///
    /// Returns what was removed; a fact that stays supported removes nothing.
    pub fn try_retract(&mut self, item: impl Into<Item>) -> Result<Removed> {
        let item = item.into();
        let label = item.to_string();
        match self.retract(item) {
            RetractOutcome::NotFound => Err(Error::NotFound(label)),
            RetractOutcome::Rejected => Err(Error::IllegalRetract(label)),
            RetractOutcome::StillSupported => Ok(Removed::default()),
            RetractOutcome::Removed(removed) => Ok(removed),
        }
    }

    /// Builds a why-tree for a stored fact.
    pub fn explain(&self, statement: &Statement) -> Option<Explanation> {
        let id = self.graph.fact_id(&Fact::new(statement.clone()))?;
        Explanation::build_with_max_depth(&self.graph, id, self.config.max_explain_depth)
    }

    /// Verifies the support and edge invariants of the whole knowledge base.
    pub fn check_consistency(&self) -> Result<()> {
        self.graph.check_consistency()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Knowledge Base:")?;
        for fact in self.facts() {
            writeln!(f, "{}", fact)?;
        }
        for rule in self.rules() {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
