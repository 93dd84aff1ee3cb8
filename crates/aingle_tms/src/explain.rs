//! Why-trees for stored facts
//!
//! An [`Explanation`] answers "why is this fact in the knowledge base?". The
//! root names the fact and whether it was asserted; each of its
//! justifications expands into the supporting fact and the supporting rule,
//! each explained the same way:
//!
//! ```text
//! fact: (mortal socrates)
//! └── because
//!     ├── fact: (isa socrates man)                  [asserted]
//!     └── rule: ((isa ?x man)) -> (mortal ?x)       [asserted]
//! ```
//!
//! Each record is expanded at most once. A later occurrence is emitted with
//! `repeated` set and no justifications, which keeps the tree linear in the
//! size of the graph when supports share ancestors.
//!
//! Support may be circular. A record that already appears on the path from
//! the root is emitted once more with `circular` set and is not expanded.
//! Branches deeper than the depth bound are emitted with `truncated` set.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_EXPLAIN_DEPTH;
use crate::error::{Error, Result};
use crate::graph::{FactId, JustificationGraph, NodeId, Record};
use crate::item::{Item, Rule};

/// A serializable why-tree for one fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// The explained fact.
    pub root: ExplanationNode,
    /// Longest chain of justifications below the root.
    depth: usize,
    /// The UTC timestamp when this explanation was generated.
    pub generated_at: DateTime<Utc>,
}

/// One fact or rule in a why-tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationNode {
    pub item: Item,
    pub asserted: bool,
    /// Set when this record already appears higher up the same branch.
    pub circular: bool,
    /// Set when this record was expanded earlier in the tree.
    #[serde(default)]
    pub repeated: bool,
    /// Set when the depth bound stopped expansion here.
    #[serde(default)]
    pub truncated: bool,
    pub justifications: Vec<Justification>,
}

/// One `(fact, rule)` pair that supports the parent node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Justification {
    pub fact: ExplanationNode,
    pub rule: ExplanationNode,
}

impl Explanation {
    /// Builds the why-tree for a stored fact, or `None` if `id` is stale.
    pub fn build(graph: &JustificationGraph, id: FactId) -> Option<Self> {
        Self::build_with_max_depth(graph, id, DEFAULT_MAX_EXPLAIN_DEPTH)
    }

    /// Like [`build`](Self::build), expanding at most `max_depth` levels.
    pub fn build_with_max_depth(
        graph: &JustificationGraph,
        id: FactId,
        max_depth: usize,
    ) -> Option<Self> {
        let mut builder = Builder {
            graph,
            max_depth,
            path: IndexSet::new(),
            heights: IndexMap::new(),
        };
        let (root, depth) = builder.node(NodeId::Fact(id))?;
        Some(Self {
            root,
            depth,
            generated_at: Utc::now(),
        })
    }

    /// Longest chain of justifications below the root; 0 for a fact with none.
    ///
    /// Repeated records count with the height of their first expansion.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Distinct rules appearing anywhere in the tree, in first-seen order.
    pub fn rules_used(&self) -> Vec<&Rule> {
        let mut rules = IndexSet::new();
        self.root.collect_rules(&mut rules);
        rules.into_iter().collect()
    }

    /// Returns `true` if any branch was cut at a support cycle.
    pub fn has_cycle(&self) -> bool {
        self.root.any(&|node| node.circular)
    }

    /// Returns `true` if the depth bound cut any branch.
    pub fn is_truncated(&self) -> bool {
        self.root.any(&|node| node.truncated)
    }

    /// Serializes the explanation into a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }

    /// Deserializes an explanation from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }
}

impl ExplanationNode {
    fn leaf(item: Item, asserted: bool) -> Self {
        Self {
            item,
            asserted,
            circular: false,
            repeated: false,
            truncated: false,
            justifications: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .justifications
            .iter()
            .map(|j| j.fact.node_count() + j.rule.node_count())
            .sum::<usize>()
    }

    fn collect_rules<'a>(&'a self, rules: &mut IndexSet<&'a Rule>) {
        for justification in &self.justifications {
            if let Item::Rule(rule) = &justification.rule.item {
                rules.insert(rule);
            }
            justification.fact.collect_rules(rules);
            justification.rule.collect_rules(rules);
        }
    }

    fn any(&self, test: &impl Fn(&ExplanationNode) -> bool) -> bool {
        test(self)
            || self
                .justifications
                .iter()
                .any(|j| j.fact.any(test) || j.rule.any(test))
    }
}

struct Builder<'g> {
    graph: &'g JustificationGraph,
    max_depth: usize,
    /// Records on the branch currently being expanded.
    path: IndexSet<NodeId>,
    /// Height of every record expanded so far.
    heights: IndexMap<NodeId, usize>,
}

impl Builder<'_> {
    /// Explains `node`, returning the subtree and its height.
    fn node(&mut self, node: NodeId) -> Option<(ExplanationNode, usize)> {
        let graph = self.graph;
        match node {
            NodeId::Fact(id) => {
                let record = graph.fact(id)?;
                Some(self.record(node, Item::Fact(record.value().clone()), record))
            }
            NodeId::Rule(id) => {
                let record = graph.rule(id)?;
                Some(self.record(node, Item::Rule(record.value().clone()), record))
            }
        }
    }

    fn record<T>(
        &mut self,
        node: NodeId,
        item: Item,
        record: &Record<T>,
    ) -> (ExplanationNode, usize) {
        let mut out = ExplanationNode::leaf(item, record.is_asserted());

        if self.path.contains(&node) {
            out.circular = true;
            return (out, 0);
        }
        if let Some(&height) = self.heights.get(&node) {
            out.repeated = record.is_supported();
            return (out, height);
        }
        if self.path.len() >= self.max_depth {
            out.truncated = record.is_supported();
            return (out, 0);
        }

        self.path.insert(node);
        let mut height = 0;
        for support in record.supported_by() {
            let Some((fact, fact_height)) = self.node(NodeId::Fact(support.fact)) else {
                continue;
            };
            let Some((rule, rule_height)) = self.node(NodeId::Rule(support.rule)) else {
                continue;
            };
            height = height.max(1 + fact_height.max(rule_height));
            out.justifications.push(Justification { fact, rule });
        }
        self.path.shift_remove(&node);
        self.heights.insert(node, height);

        (out, height)
    }
}
