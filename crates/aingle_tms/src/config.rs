//! Knowledge base configuration.

use serde::{Deserialize, Serialize};

/// Default upper bound on derivations performed by one `assert` call.
pub const DEFAULT_MAX_DERIVATIONS: usize = 100_000;

/// Default number of levels an explanation expands below its root.
pub const DEFAULT_MAX_EXPLAIN_DEPTH: usize = 256;

/// How much of its activity the knowledge base reports through `log`.
///
/// Levels are ordered: each one includes everything the previous one reports.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Only warnings, such as invalid queries.
    Quiet,
    /// External asserts, retracts and queries.
    #[default]
    Normal,
    /// Every internal add and every inference attempt.
    Verbose,
}

impl Verbosity {
    /// Returns `true` if messages at `level` should be emitted.
    pub fn allows(self, level: Verbosity) -> bool {
        self >= level
    }
}

/// Settings passed to a `KnowledgeBase` at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    /// Logging verbosity.
    pub verbosity: Verbosity,
    /// Upper bound on derivations performed by a single `assert`.
    pub max_derivations: usize,
    /// Levels of support an explanation expands before it truncates a branch.
    pub max_explain_depth: usize,
}

impl KbConfig {
    /// A configuration that only reports warnings.
    pub fn quiet() -> Self {
        Self::default().with_verbosity(Verbosity::Quiet)
    }

    /// A configuration that reports every add and inference attempt.
    pub fn verbose() -> Self {
        Self::default().with_verbosity(Verbosity::Verbose)
    }

    /// Sets the verbosity.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Sets the derivation bound.
    pub fn with_max_derivations(mut self, limit: usize) -> Self {
        self.max_derivations = limit;
        self
    }

    /// Sets the explanation depth bound.
    pub fn with_max_explain_depth(mut self, depth: usize) -> Self {
        self.max_explain_depth = depth;
        self
    }
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            max_derivations: DEFAULT_MAX_DERIVATIONS,
            max_explain_depth: DEFAULT_MAX_EXPLAIN_DEPTH,
        }
    }
}
