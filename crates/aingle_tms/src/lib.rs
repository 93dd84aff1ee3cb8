//! AIngle TMS - Forward-Chaining Knowledge Base with Truth Maintenance
//!
//! This crate stores facts and if-then rules, derives every consequence of
//! them by forward chaining, and remembers why each derived item holds. When
//! an assertion is withdrawn, everything that depended on it alone is
//! withdrawn too, while conclusions with another justification survive.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Knowledge Base                          │
//! │          assert  │  retract  │  ask  │  explain              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                Inference Engine                       │   │
//! │  │  Leading-condition match │ Rule specialization        │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                Justification Graph                    │   │
//! │  │  Fact/rule arenas │ Support pairs │ Retraction cascade│   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                Terms & Unification                    │   │
//! │  │  Statements │ Variables │ Bindings │ Instantiation    │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use aingle_tms::{KnowledgeBase, RetractOutcome};
//! use aingle_tms::syntax::{parse_fact, parse_rule, parse_statement};
//!
//! let mut kb = KnowledgeBase::new();
//! kb.assert(parse_rule("((isa ?x man)) -> (mortal ?x)")?)?;
//! kb.assert(parse_fact("(isa socrates man)")?)?;
//!
//! let answers = kb.ask(parse_statement("(mortal ?who)")?);
//! assert_eq!(answers[0].bindings.to_string(), "?who : socrates");
//!
//! // Withdrawing the premise withdraws the conclusion.
//! let outcome = kb.retract(parse_fact("(isa socrates man)")?);
//! assert!(matches!(outcome, RetractOutcome::Removed(_)));
//! assert!(kb.ask(parse_statement("(mortal ?who)")?).is_empty());
//! # Ok::<(), aingle_tms::Error>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod graph;
pub mod item;
pub mod kb;
pub mod shared;
pub mod syntax;
pub mod term;
pub mod unify;

// Re-exports
pub use config::{KbConfig, Verbosity};
pub use engine::InferenceEngine;
pub use error::{Error, Result};
pub use explain::{Explanation, ExplanationNode, Justification};
pub use graph::{FactId, FactNode, JustificationGraph, NodeId, Removed, RuleId, RuleNode, Support};
pub use item::{Fact, Item, Rule, RuleBuilder};
pub use kb::{Answer, AssertOutcome, KbStats, KnowledgeBase, RetractOutcome};
pub use shared::SharedKnowledgeBase;
pub use term::{Statement, Term};
pub use unify::Bindings;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
