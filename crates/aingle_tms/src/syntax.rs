//! Textual notation for facts, rules and queries
//!
//! ```text
//! fact: (isa cube block)
//! fact: (owns alice (book moby))
//! rule: ((isa ?x block) (larger ?x ?y)) -> (bigger ?x ?y)
//! (isa ?x block)
//! ```
//!
//! Symbols starting with `?` are variables. A parenthesized group in term
//! position is a compound term. A bare statement parses as a fact, which is
//! the shape `ask` expects.

use regex::Regex;

use crate::error::{Error, Result};
use crate::item::{Fact, Item, Rule};
use crate::term::{Statement, Term, VARIABLE_PREFIX};

const TOKEN_PATTERN: &str = r"\(|\)|->|[^\s()]+";

const FACT_TAG: &str = "fact:";
const RULE_TAG: &str = "rule:";
const ARROW: &str = "->";

fn tokenizer() -> Result<Regex> {
    Regex::new(TOKEN_PATTERN).map_err(|e| Error::Parse(e.to_string()))
}

struct Parser<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(re: &Regex, input: &'a str) -> Self {
        Self {
            tokens: re.find_iter(input).map(|m| m.as_str()).collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<&'a str> {
        self.tokens.get(self.pos + 1).copied()
    }

    fn next(&mut self) -> Result<&'a str> {
        let token = self
            .peek()
            .ok_or_else(|| Error::Parse("unexpected end of input".to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &str) -> Result<()> {
        let token = self.next()?;
        if token != expected {
            return Err(Error::Parse(format!(
                "expected `{}` at token {}, found `{}`",
                expected, self.pos, token
            )));
        }
        Ok(())
    }

    fn skip_tag(&mut self, tag: &str) -> bool {
        if self.peek() == Some(tag) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn finish(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(Error::Parse(format!("unexpected trailing `{}`", token))),
        }
    }

    fn symbol(&mut self) -> Result<&'a str> {
        let token = self.next()?;
        if matches!(token, "(" | ")" | ARROW) {
            return Err(Error::Parse(format!(
                "expected a symbol at token {}, found `{}`",
                self.pos, token
            )));
        }
        Ok(token)
    }

    /// `( predicate term* )`
    fn statement(&mut self) -> Result<Statement> {
        self.expect("(")?;
        let predicate = self.symbol()?;
        if predicate.starts_with(VARIABLE_PREFIX) {
            return Err(Error::Parse(format!(
                "predicate `{}` cannot be a variable",
                predicate
            )));
        }

        let mut terms = Vec::new();
        loop {
            match self.peek() {
                Some(")") => {
                    self.pos += 1;
                    break;
                }
                Some("(") => terms.push(Term::compound(self.statement()?)),
                Some(_) => terms.push(Term::symbol(self.symbol()?)),
                None => return Err(Error::Parse(format!("unclosed statement `({}`", predicate))),
            }
        }
        Ok(Statement::new(predicate, terms))
    }

    /// `( statement+ ) -> statement`
    fn rule(&mut self) -> Result<Rule> {
        self.expect("(")?;
        let mut lhs = Vec::new();
        while self.peek() == Some("(") {
            lhs.push(self.statement()?);
        }
        self.expect(")")?;
        if lhs.is_empty() {
            return Err(Error::Parse("rule has no conditions".to_string()));
        }
        self.expect(ARROW)?;
        let rhs = self.statement()?;
        Rule::new(lhs, rhs)
    }

    fn item(&mut self) -> Result<Item> {
        if self.skip_tag(FACT_TAG) {
            return Ok(Item::Fact(Fact::new(self.statement()?)));
        }
        if self.skip_tag(RULE_TAG) {
            return Ok(Item::Rule(self.rule()?));
        }
        // Untagged: a rule body opens with two parentheses.
        if self.peek() == Some("(") && self.peek_second() == Some("(") {
            Ok(Item::Rule(self.rule()?))
        } else {
            Ok(Item::Fact(Fact::new(self.statement()?)))
        }
    }
}

fn parse_with<'a, T>(input: &'a str, f: impl FnOnce(&mut Parser<'a>) -> Result<T>) -> Result<T> {
    let re = tokenizer()?;
    let mut parser = Parser::new(&re, input);
    let value = f(&mut parser)?;
    parser.finish()?;
    Ok(value)
}

/// Parses a single statement such as `(isa ?x block)`.
pub fn parse_statement(input: &str) -> Result<Statement> {
    parse_with(input, Parser::statement)
}

/// Parses a fact, with or without the `fact:` tag.
pub fn parse_fact(input: &str) -> Result<Fact> {
    parse_with(input, |p| {
        p.skip_tag(FACT_TAG);
        p.statement().map(Fact::new)
    })
}

/// Parses a rule, with or without the `rule:` tag.
///
/// ```
/// use aingle_tms::syntax::parse_rule;
///
/// let rule = parse_rule("rule: ((isa ?x block) (larger ?x ?y)) -> (bigger ?x ?y)")?;
/// assert_eq!(rule.lhs().len(), 2);
/// # Ok::<(), aingle_tms::Error>(())
/// ```
pub fn parse_rule(input: &str) -> Result<Rule> {
    parse_with(input, |p| {
        p.skip_tag(RULE_TAG);
        p.rule()
    })
}

/// Parses a tagged or untagged fact or rule.
pub fn parse_item(input: &str) -> Result<Item> {
    parse_with(input, Parser::item)
}

/// Parses one item per line, skipping blank lines and lines starting with
/// `;` or `#`.
///
/// Errors name the 1-based line they occurred on.
pub fn parse_program(text: &str) -> Result<Vec<Item>> {
    let re = tokenizer()?;
    let mut items = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        let mut parser = Parser::new(&re, line);
        let item = parser
            .item()
            .and_then(|item| parser.finish().map(|_| item))
            .map_err(|e| match e {
                Error::Parse(msg) => Error::Parse(format!("line {}: {}", index + 1, msg)),
                other => other,
            })?;
        items.push(item);
    }

    Ok(items)
}
