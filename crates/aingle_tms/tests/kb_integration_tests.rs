//! Integration tests for the truth-maintenance knowledge base
//!
//! Exercises chaining, retraction cascades and support bookkeeping through
//! the public API, including text parsed with the `syntax` module.

use aingle_tms::syntax::{parse_fact, parse_program, parse_rule, parse_statement};
use aingle_tms::{
    AssertOutcome, Error, Fact, Item, KbConfig, KnowledgeBase, RetractOutcome, Rule, Statement,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

fn fact(text: &str) -> Fact {
    parse_fact(text).unwrap()
}

fn rule(text: &str) -> Rule {
    parse_rule(text).unwrap()
}

fn statement(text: &str) -> Statement {
    parse_statement(text).unwrap()
}

fn socrates_kb() -> KnowledgeBase {
    KnowledgeBase::with_items(
        vec![fact("(isa socrates man)")],
        vec![rule("((isa ?x man)) -> (mortal ?x)")],
    )
    .unwrap()
}

fn blocks_world() -> KnowledgeBase {
    let program = "\
        ; blocks world\n\
        fact: (isa cube block)\n\
        fact: (isa pyramid block)\n\
        fact: (larger cube pyramid)\n\
        rule: ((isa ?x block) (larger ?x ?y)) -> (bigger ?x ?y)\n";

    let mut kb = KnowledgeBase::with_config(KbConfig::verbose());
    kb.assert_all(parse_program(program).unwrap()).unwrap();
    kb
}

// ============================================================================
// Chaining Tests
// ============================================================================

#[test]
fn test_socrates_is_mortal() {
    init_logging();
    let kb = socrates_kb();

    let mortal = fact("(mortal socrates)");
    let record = kb.fact(&mortal).unwrap();
    assert!(!record.is_asserted());
    assert_eq!(
        kb.justifications(&Item::Fact(mortal.clone())),
        vec![(fact("(isa socrates man)"), rule("((isa ?x man)) -> (mortal ?x)"))]
    );

    let answers = kb.ask(mortal);
    assert_eq!(answers.len(), 1);
    assert!(answers[0].bindings.is_empty());
}

#[test]
fn test_multi_condition_rule_specializes() {
    init_logging();
    let kb = blocks_world();

    let answers = kb.ask(statement("(bigger ?x ?y)"));
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].bindings.to_string(), "?x : cube, ?y : pyramid");

    // One specialized rule per block.
    assert_eq!(kb.rule_count(), 3);
    let partial = rule("((larger cube ?y)) -> (bigger cube ?y)");
    let record = kb.rule(&partial).unwrap();
    assert!(!record.is_asserted());
    assert!(record.is_supported());
    assert!(kb.check_consistency().is_ok());
}

#[test]
fn test_chaining_order_independent() {
    let mut facts_first = KnowledgeBase::new();
    facts_first.assert(fact("(isa cube block)")).unwrap();
    facts_first.assert(fact("(larger cube pyramid)")).unwrap();
    facts_first
        .assert(rule("((isa ?x block) (larger ?x ?y)) -> (bigger ?x ?y)"))
        .unwrap();

    let mut rules_first = KnowledgeBase::new();
    rules_first
        .assert(rule("((isa ?x block) (larger ?x ?y)) -> (bigger ?x ?y)"))
        .unwrap();
    rules_first.assert(fact("(larger cube pyramid)")).unwrap();
    rules_first.assert(fact("(isa cube block)")).unwrap();

    let query = statement("(bigger cube ?y)");
    assert_eq!(facts_first.ask(query.clone()), rules_first.ask(query));
    assert_eq!(facts_first.fact_count(), rules_first.fact_count());
    assert_eq!(facts_first.rule_count(), rules_first.rule_count());
}

#[test]
fn test_nested_terms_chain() {
    let mut kb = KnowledgeBase::new();
    kb.assert(rule("((owns ?who (book ?title))) -> (reader ?who)"))
        .unwrap();
    kb.assert(fact("(owns alice (book moby))")).unwrap();
    kb.assert(fact("(owns bob (car mini))")).unwrap();

    let answers = kb.ask(statement("(reader ?who)"));
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].bindings.to_string(), "?who : alice");
}

// ============================================================================
// Re-assertion Tests
// ============================================================================

#[test]
fn test_idempotent_reassertion() {
    let mut kb = socrates_kb();
    let before = kb.fact_count();

    assert_eq!(
        kb.assert(fact("(isa socrates man)")).unwrap(),
        AssertOutcome::Reasserted
    );
    assert_eq!(
        kb.assert(rule("((isa ?x man)) -> (mortal ?x)")).unwrap(),
        AssertOutcome::Reasserted
    );

    assert_eq!(kb.fact_count(), before);
    let mortal = Item::Fact(fact("(mortal socrates)"));
    assert_eq!(kb.justifications(&mortal).len(), 1);
}

#[test]
fn test_independent_derivations_accumulate() {
    let mut kb = KnowledgeBase::new();
    kb.assert(rule("((isa ?x man)) -> (mortal ?x)")).unwrap();
    kb.assert(rule("((isa ?x greek)) -> (mortal ?x)")).unwrap();
    kb.assert(fact("(isa socrates man)")).unwrap();
    kb.assert(fact("(isa socrates greek)")).unwrap();

    let mortal = Item::Fact(fact("(mortal socrates)"));
    assert_eq!(kb.justifications(&mortal).len(), 2);
    assert_eq!(kb.ask(statement("(mortal ?x)")).len(), 1);
}

// ============================================================================
// Retraction Tests
// ============================================================================

#[test]
fn test_cascade_removes_sole_dependents() {
    init_logging();
    let mut kb = socrates_kb();

    let outcome = kb.retract(fact("(isa socrates man)"));
    let RetractOutcome::Removed(removed) = outcome else {
        panic!("expected a cascade");
    };
    assert_eq!(removed.len(), 2);

    assert!(kb.fact(&fact("(isa socrates man)")).is_none());
    assert!(kb.fact(&fact("(mortal socrates)")).is_none());
    assert!(kb.rule(&rule("((isa ?x man)) -> (mortal ?x)")).is_some());
    assert!(kb.check_consistency().is_ok());
}

#[test]
fn test_cascade_keeps_asserted_dependent() {
    let mut kb = socrates_kb();
    kb.assert(fact("(mortal socrates)")).unwrap();

    kb.retract(fact("(isa socrates man)"));

    let survivor = kb.fact(&fact("(mortal socrates)")).unwrap();
    assert!(survivor.is_asserted());
    assert!(!survivor.is_supported());
    assert!(kb.check_consistency().is_ok());
}

#[test]
fn test_cascade_keeps_alternatively_supported() {
    let mut kb = KnowledgeBase::new();
    kb.assert(rule("((isa ?x man)) -> (mortal ?x)")).unwrap();
    kb.assert(rule("((isa ?x greek)) -> (mortal ?x)")).unwrap();
    kb.assert(fact("(isa socrates man)")).unwrap();
    kb.assert(fact("(isa socrates greek)")).unwrap();

    kb.retract(fact("(isa socrates man)"));

    let mortal = fact("(mortal socrates)");
    assert_eq!(
        kb.justifications(&Item::Fact(mortal.clone())),
        vec![(fact("(isa socrates greek)"), rule("((isa ?x greek)) -> (mortal ?x)"))]
    );
    assert!(kb.check_consistency().is_ok());
}

#[test]
fn test_cascade_through_specialized_rules() {
    let mut kb = blocks_world();

    let outcome = kb.retract(fact("(isa cube block)"));
    let RetractOutcome::Removed(removed) = outcome else {
        panic!("expected a cascade");
    };
    assert_eq!(
        removed.facts,
        vec![fact("(isa cube block)"), fact("(bigger cube pyramid)")]
    );
    assert_eq!(removed.rules, vec![rule("((larger cube ?y)) -> (bigger cube ?y)")]);

    assert!(kb.ask(statement("(bigger ?x ?y)")).is_empty());
    assert_eq!(kb.fact_count(), 2);
    assert_eq!(kb.rule_count(), 2);
    assert!(kb.check_consistency().is_ok());
}

#[test]
fn test_rejected_rule_retract() {
    let mut kb = socrates_kb();
    let mortal_rule = rule("((isa ?x man)) -> (mortal ?x)");

    assert_eq!(kb.retract(mortal_rule.clone()), RetractOutcome::Rejected);
    assert!(kb.rule(&mortal_rule).unwrap().is_asserted());
    assert_eq!(kb.fact_count(), 2);
    assert_eq!(kb.rule_count(), 1);
}

#[test]
fn test_supported_rule_retract_rejected_until_premise_goes() {
    let mut kb = blocks_world();
    let partial = rule("((larger pyramid ?y)) -> (bigger pyramid ?y)");

    assert_eq!(kb.retract(partial.clone()), RetractOutcome::Rejected);
    assert!(kb.rule(&partial).is_some());

    kb.retract(fact("(isa pyramid block)"));
    assert!(kb.rule(&partial).is_none());
    assert_eq!(kb.retract(partial), RetractOutcome::NotFound);
}

#[test]
fn test_try_retract_errors() {
    let mut kb = socrates_kb();

    assert!(matches!(
        kb.try_retract(fact("(isa plato man)")),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        kb.try_retract(rule("((isa ?x man)) -> (mortal ?x)")),
        Err(Error::IllegalRetract(_))
    ));

    kb.assert(fact("(mortal socrates)")).unwrap();
    let removed = kb.try_retract(fact("(mortal socrates)")).unwrap();
    assert!(removed.is_empty());
}

#[test]
fn test_retract_then_reassert_round_trip() {
    let mut kb = KnowledgeBase::new();
    let cube = fact("(isa cube block)");

    kb.assert(cube.clone()).unwrap();
    kb.retract(cube.clone());
    assert!(kb.fact(&cube).is_none());

    kb.assert(cube.clone()).unwrap();
    let record = kb.fact(&cube).unwrap();
    assert_eq!(record.value(), &cube);
    assert!(record.is_asserted());
    assert!(!record.is_supported());
}

#[test]
fn test_self_supporting_cycle_survives_retract() {
    let mut kb = KnowledgeBase::new();
    kb.assert(rule("((p ?x)) -> (q ?x)")).unwrap();
    kb.assert(rule("((q ?x)) -> (p ?x)")).unwrap();
    kb.assert(fact("(p a)")).unwrap();

    assert_eq!(kb.retract(fact("(p a)")), RetractOutcome::StillSupported);
    assert_eq!(kb.fact_count(), 2);
    assert!(kb.check_consistency().is_ok());
}

// ============================================================================
// Query Tests
// ============================================================================

#[test]
fn test_ask_no_match_is_empty() {
    let kb = blocks_world();
    assert!(kb.ask(statement("(isa ?x sphere)")).is_empty());
}

#[test]
fn test_ask_rule_is_invalid() {
    let kb = socrates_kb();
    let query = rule("((isa ?x man)) -> (mortal ?x)");
    assert!(kb.ask(query.clone()).is_empty());
    assert!(matches!(kb.try_ask(query), Err(Error::InvalidQuery(_))));
}

#[test]
fn test_ask_repeated_variable() {
    let mut kb = KnowledgeBase::new();
    kb.assert(fact("(likes alice alice)")).unwrap();
    kb.assert(fact("(likes alice bob)")).unwrap();

    let answers = kb.ask(statement("(likes ?x ?x)"));
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].fact, fact("(likes alice alice)"));
}

// ============================================================================
// Consistency Tests
// ============================================================================

#[test]
fn test_consistency_across_operation_sequence() {
    let mut kb = KnowledgeBase::with_config(KbConfig::quiet());
    let items = parse_program(
        "\
        rule: ((parent ?x ?y)) -> (ancestor ?x ?y)\n\
        rule: ((parent ?x ?y) (ancestor ?y ?z)) -> (ancestor ?x ?z)\n\
        fact: (parent ann bob)\n\
        fact: (parent bob cal)\n\
        fact: (parent cal dee)\n",
    )
    .unwrap();

    for item in items {
        kb.assert(item).unwrap();
        kb.check_consistency().unwrap();
    }

    assert_eq!(kb.ask(statement("(ancestor ann ?who)")).len(), 3);

    let operations = [
        "(parent bob cal)",
        "(ancestor ann bob)",
        "(parent ann bob)",
        "(parent cal dee)",
    ];
    for text in operations {
        kb.retract(fact(text));
        kb.check_consistency().unwrap();
    }

    assert_eq!(kb.fact_count(), 0);
    assert_eq!(kb.rule_count(), 2);
}

#[test]
fn test_display_lists_facts_then_rules() {
    let kb = socrates_kb();
    let text = kb.to_string();
    assert!(text.starts_with("Knowledge Base:\n"));
    let fact_pos = text.find("fact: (mortal socrates)").unwrap();
    let rule_pos = text.find("rule: ((isa ?x man)) -> (mortal ?x)").unwrap();
    assert!(fact_pos < rule_pos);
}
