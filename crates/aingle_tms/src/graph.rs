//! Justification graph
//!
//! Facts and rules live in two arenas and refer to each other only through
//! `FactId`/`RuleId` handles. Every record keeps both directions of its
//! support edges:
//!
//! ```text
//!   supported_by:   (fact, rule) pairs that justify this record
//!   supports_*:     records whose supported_by names this record
//! ```
//!
//! The two directions are kept in sync: `X` appears in `S.supports_facts`
//! (or `supports_rules`) exactly when some pair in `X.supported_by` names `S`.

use indexmap::{IndexMap, IndexSet};
use slotmap::{new_key_type, SlotMap};

use crate::error::{Error, Result};
use crate::item::{Fact, Rule};
use crate::term::Statement;

new_key_type! {
    /// Stable handle to a fact record.
    pub struct FactId;
    /// Stable handle to a rule record.
    pub struct RuleId;
}

/// Handle to either kind of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Fact(FactId),
    Rule(RuleId),
}

/// One justification: the record followed from `fact` and `rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Support {
    pub fact: FactId,
    pub rule: RuleId,
}

impl Support {
    /// Creates a support pair.
    pub fn new(fact: FactId, rule: RuleId) -> Self {
        Self { fact, rule }
    }

    /// Returns `true` if either half of the pair is `node`.
    pub fn names(&self, node: NodeId) -> bool {
        match node {
            NodeId::Fact(id) => self.fact == id,
            NodeId::Rule(id) => self.rule == id,
        }
    }

    /// The half of the pair that is not `node`.
    fn partner(&self, node: NodeId) -> NodeId {
        match node {
            NodeId::Fact(_) => NodeId::Rule(self.rule),
            NodeId::Rule(_) => NodeId::Fact(self.fact),
        }
    }
}

/// A stored fact or rule together with its truth-maintenance bookkeeping.
#[derive(Debug, Clone)]
pub struct Record<T> {
    pub(crate) value: T,
    pub(crate) asserted: bool,
    pub(crate) supported_by: IndexSet<Support>,
    pub(crate) supports_facts: IndexSet<FactId>,
    pub(crate) supports_rules: IndexSet<RuleId>,
}

/// A stored fact.
pub type FactNode = Record<Fact>;
/// A stored rule.
pub type RuleNode = Record<Rule>;

impl<T> Record<T> {
    fn new(value: T, asserted: bool) -> Self {
        Self {
            value,
            asserted,
            supported_by: IndexSet::new(),
            supports_facts: IndexSet::new(),
            supports_rules: IndexSet::new(),
        }
    }

    /// The stored fact or rule.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Whether a caller declared this record true directly.
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// The justifications, in the order they were recorded.
    pub fn supported_by(&self) -> impl Iterator<Item = &Support> {
        self.supported_by.iter()
    }

    /// Returns `true` if at least one justification remains.
    pub fn is_supported(&self) -> bool {
        !self.supported_by.is_empty()
    }

    /// Facts this record helped derive.
    pub fn supports_facts(&self) -> impl Iterator<Item = FactId> + '_ {
        self.supports_facts.iter().copied()
    }

    /// Rules this record helped derive.
    pub fn supports_rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.supports_rules.iter().copied()
    }

    /// A record may stay in the graph only while this holds.
    pub fn is_justified(&self) -> bool {
        self.asserted || self.is_supported()
    }

    fn dependents_mut(&mut self) -> (&mut IndexSet<FactId>, &mut IndexSet<RuleId>) {
        (&mut self.supports_facts, &mut self.supports_rules)
    }
}

impl FactNode {
    /// The fact's statement.
    pub fn statement(&self) -> &Statement {
        &self.value.statement
    }
}

/// What a deletion cascade removed, in removal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removed {
    pub facts: Vec<Fact>,
    pub rules: Vec<Rule>,
}

impl Removed {
    /// Total number of removed records.
    pub fn len(&self) -> usize {
        self.facts.len() + self.rules.len()
    }

    /// Returns `true` if nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.rules.is_empty()
    }
}

/// Arena of facts and rules plus the support edges between them.
#[derive(Debug, Clone, Default)]
pub struct JustificationGraph {
    facts: SlotMap<FactId, FactNode>,
    rules: SlotMap<RuleId, RuleNode>,
    /// Structural lookup; iteration order is storage order.
    fact_index: IndexMap<Fact, FactId>,
    rule_index: IndexMap<Rule, RuleId>,
}

impl JustificationGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored facts.
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Number of stored rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Looks up a fact by structural equality.
    pub fn fact_id(&self, fact: &Fact) -> Option<FactId> {
        self.fact_index.get(fact).copied()
    }

    /// Looks up a rule by structural equality.
    pub fn rule_id(&self, rule: &Rule) -> Option<RuleId> {
        self.rule_index.get(rule).copied()
    }

    /// Fetches a fact record.
    pub fn fact(&self, id: FactId) -> Option<&FactNode> {
        self.facts.get(id)
    }

    /// Fetches a rule record.
    pub fn rule(&self, id: RuleId) -> Option<&RuleNode> {
        self.rules.get(id)
    }

    /// Returns `true` if the handle refers to a stored record.
    pub fn contains(&self, node: NodeId) -> bool {
        match node {
            NodeId::Fact(id) => self.facts.contains_key(id),
            NodeId::Rule(id) => self.rules.contains_key(id),
        }
    }

    /// Fact handles in storage order.
    pub fn fact_ids(&self) -> impl Iterator<Item = FactId> + '_ {
        self.fact_index.values().copied()
    }

    /// Rule handles in storage order.
    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rule_index.values().copied()
    }

    /// The fact handle at `index` in storage order.
    pub(crate) fn fact_id_at(&self, index: usize) -> Option<FactId> {
        self.fact_index.get_index(index).map(|(_, &id)| id)
    }

    /// The rule handle at `index` in storage order.
    pub(crate) fn rule_id_at(&self, index: usize) -> Option<RuleId> {
        self.rule_index.get_index(index).map(|(_, &id)| id)
    }

    /// Fact records in storage order.
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &FactNode)> + '_ {
        self.fact_index.values().map(move |&id| (id, &self.facts[id]))
    }

    /// Rule records in storage order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &RuleNode)> + '_ {
        self.rule_index.values().map(move |&id| (id, &self.rules[id]))
    }

    pub(crate) fn insert_fact(&mut self, fact: Fact, asserted: bool) -> FactId {
        let id = self.facts.insert(Record::new(fact.clone(), asserted));
        self.fact_index.insert(fact, id);
        id
    }

    pub(crate) fn insert_rule(&mut self, rule: Rule, asserted: bool) -> RuleId {
        let id = self.rules.insert(Record::new(rule.clone(), asserted));
        self.rule_index.insert(rule, id);
        id
    }

    pub(crate) fn set_asserted(&mut self, node: NodeId, asserted: bool) {
        match node {
            NodeId::Fact(id) => {
                if let Some(record) = self.facts.get_mut(id) {
                    record.asserted = asserted;
                }
            }
            NodeId::Rule(id) => {
                if let Some(record) = self.rules.get_mut(id) {
                    record.asserted = asserted;
                }
            }
        }
    }

    /// Records `support` as a justification of `node` and adds the matching
    /// forward edges to both sources.
    ///
    /// Returns `false` if the pair was already recorded.
    pub(crate) fn add_support(&mut self, node: NodeId, support: Support) -> bool {
        let inserted = match node {
            NodeId::Fact(id) => self
                .facts
                .get_mut(id)
                .map(|r| r.supported_by.insert(support))
                .unwrap_or(false),
            NodeId::Rule(id) => self
                .rules
                .get_mut(id)
                .map(|r| r.supported_by.insert(support))
                .unwrap_or(false),
        };

        if inserted {
            self.link(NodeId::Fact(support.fact), node);
            self.link(NodeId::Rule(support.rule), node);
        }
        inserted
    }

    fn dependents_of(
        &mut self,
        source: NodeId,
    ) -> Option<(&mut IndexSet<FactId>, &mut IndexSet<RuleId>)> {
        match source {
            NodeId::Fact(id) => self.facts.get_mut(id).map(Record::dependents_mut),
            NodeId::Rule(id) => self.rules.get_mut(id).map(Record::dependents_mut),
        }
    }

    fn link(&mut self, source: NodeId, dependent: NodeId) {
        if let Some((facts, rules)) = self.dependents_of(source) {
            match dependent {
                NodeId::Fact(id) => {
                    facts.insert(id);
                }
                NodeId::Rule(id) => {
                    rules.insert(id);
                }
            }
        }
    }

    fn unlink(&mut self, source: NodeId, dependent: NodeId) {
        if let Some((facts, rules)) = self.dependents_of(source) {
            match dependent {
                NodeId::Fact(id) => {
                    facts.shift_remove(&id);
                }
                NodeId::Rule(id) => {
                    rules.shift_remove(&id);
                }
            }
        }
    }

    /// Drops every justification of `dependent` that names `removed`, along
    /// with the forward edges those pairs implied.
    ///
    /// Returns `true` if `dependent` is left unasserted and unsupported.
    fn withdraw_support(&mut self, dependent: NodeId, removed: NodeId) -> bool {
        let supported_by = match dependent {
            NodeId::Fact(id) => self.facts.get_mut(id).map(|r| (&mut r.supported_by, r.asserted)),
            NodeId::Rule(id) => self.rules.get_mut(id).map(|r| (&mut r.supported_by, r.asserted)),
        };
        let Some((supported_by, asserted)) = supported_by else {
            return false;
        };

        let withdrawn: Vec<Support> = supported_by
            .iter()
            .filter(|s| s.names(removed))
            .copied()
            .collect();
        supported_by.retain(|s| !s.names(removed));

        // A partner keeps its edge while another pair still names it.
        let stale_partners: Vec<NodeId> = withdrawn
            .iter()
            .map(|s| s.partner(removed))
            .filter(|&partner| !supported_by.iter().any(|s| s.names(partner)))
            .collect();
        let orphaned = supported_by.is_empty() && !asserted;

        for partner in stale_partners {
            self.unlink(partner, dependent);
        }
        orphaned
    }

    /// Deletes `start` and everything whose last justification depended on it.
    ///
    /// `start` must already be unasserted and unsupported. The cascade is
    /// driven by an explicit worklist, so deep justification chains do not
    /// grow the call stack.
    pub(crate) fn remove_cascade(&mut self, start: NodeId) -> Removed {
        let mut removed = Removed::default();
        let mut worklist = vec![start];

        while let Some(node) = worklist.pop() {
            if !self.contains(node) {
                continue;
            }

            let Some((facts, rules)) = self.dependents_of(node) else {
                continue;
            };
            let dependent_facts = std::mem::take(facts);
            let dependent_rules = std::mem::take(rules);

            let dependents = dependent_facts
                .into_iter()
                .map(NodeId::Fact)
                .chain(dependent_rules.into_iter().map(NodeId::Rule));

            for dependent in dependents {
                if dependent == node {
                    continue;
                }
                if self.withdraw_support(dependent, node) {
                    log::trace!("Cascade reaches {:?}", dependent);
                    worklist.push(dependent);
                }
            }

            match node {
                NodeId::Fact(id) => {
                    if let Some(record) = self.facts.remove(id) {
                        self.fact_index.shift_remove(&record.value);
                        removed.facts.push(record.value);
                    }
                }
                NodeId::Rule(id) => {
                    if let Some(record) = self.rules.remove(id) {
                        self.rule_index.shift_remove(&record.value);
                        removed.rules.push(record.value);
                    }
                }
            }
        }

        removed
    }

    /// Verifies every structural invariant of the graph.
    ///
    /// Returns `Error::Inconsistent` describing the first violation found.
    pub fn check_consistency(&self) -> Result<()> {
        if self.fact_index.len() != self.facts.len() || self.rule_index.len() != self.rules.len() {
            return Err(Error::Inconsistent(
                "structural index out of step with arena".to_string(),
            ));
        }

        for (id, record) in self.facts() {
            self.check_record(NodeId::Fact(id), record, &record.value.to_string())?;
        }
        for (id, record) in self.rules() {
            self.check_record(NodeId::Rule(id), record, &record.value.to_string())?;
        }
        Ok(())
    }

    fn check_record<T>(&self, node: NodeId, record: &Record<T>, label: &str) -> Result<()> {
        if !record.is_justified() {
            return Err(Error::Inconsistent(format!(
                "{} is neither asserted nor supported",
                label
            )));
        }

        for support in &record.supported_by {
            let fact = self.facts.get(support.fact).ok_or_else(|| {
                Error::Inconsistent(format!("{} is supported by a missing fact", label))
            })?;
            let rule = self.rules.get(support.rule).ok_or_else(|| {
                Error::Inconsistent(format!("{} is supported by a missing rule", label))
            })?;
            let linked = match node {
                NodeId::Fact(id) => {
                    fact.supports_facts.contains(&id) && rule.supports_facts.contains(&id)
                }
                NodeId::Rule(id) => {
                    fact.supports_rules.contains(&id) && rule.supports_rules.contains(&id)
                }
            };
            if !linked {
                return Err(Error::Inconsistent(format!(
                    "{} has a justification without a forward edge",
                    label
                )));
            }
        }

        let dependents = record
            .supports_facts
            .iter()
            .map(|&id| (NodeId::Fact(id), self.facts.get(id).map(|r| &r.supported_by)))
            .chain(
                record
                    .supports_rules
                    .iter()
                    .map(|&id| (NodeId::Rule(id), self.rules.get(id).map(|r| &r.supported_by))),
            );
        for (dependent, supported_by) in dependents {
            let supported_by = supported_by.ok_or_else(|| {
                Error::Inconsistent(format!("{} supports a missing {:?}", label, dependent))
            })?;
            if !supported_by.iter().any(|s| s.names(node)) {
                return Err(Error::Inconsistent(format!(
                    "{} has a forward edge to {:?} without a matching justification",
                    label, dependent
                )));
            }
        }
        Ok(())
    }
}
