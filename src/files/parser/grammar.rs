// Copyright (c) 2016-2021 Fabian Schuiki

//! Construction of rule graphs.
//!
//! Rules are allocated in an arena and refer to each other by reference.
//! Recursive rules are built through forward rules which are resolved once the
//! rule they stand in for exists. Left-recursive rules are not supported.

use crate::parser::rule::{Rule, RuleKind, TokenRule};
use crate::parser::result::Build;
use log::debug;
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::fmt;
use typed_arena::Arena;

/// The arena all rules of a grammar are allocated in.
pub type GrammarArena<'g> = Arena<Rule<'g>>;

/// An error in the structure of a rule graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A forward rule was never resolved.
    Unresolved(String),
    /// A forward rule was resolved twice.
    AlreadyResolved(String),
    /// A rule that is not a forward rule was resolved.
    NotForward(String),
    /// Forward rules that only resolve to each other.
    ForwardCycle(String),
    /// A sequence or choice without any rules.
    Empty(String),
    /// A repetition whose bounds admit no count.
    InvalidBounds { rule: String, min: usize, max: usize },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GrammarError::Unresolved(ref name) => {
                write!(f, "forward rule `{}` was never resolved", name)
            }
            GrammarError::AlreadyResolved(ref name) => {
                write!(f, "forward rule `{}` is already resolved", name)
            }
            GrammarError::NotForward(ref name) => {
                write!(f, "rule `{}` is not a forward rule", name)
            }
            GrammarError::ForwardCycle(ref name) => {
                write!(f, "forward rule `{}` resolves to itself", name)
            }
            GrammarError::Empty(ref name) => write!(f, "rule `{}` has no sub-rules", name),
            GrammarError::InvalidBounds {
                ref rule,
                min,
                max,
            } => write!(
                f,
                "repetition `{}` has invalid bounds {}..{}",
                rule, min, max
            ),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Assembles a rule graph.
pub struct GrammarBuilder<'g> {
    arena: &'g GrammarArena<'g>,
    rules: RefCell<Vec<&'g Rule<'g>>>,
}

impl<'g> GrammarBuilder<'g> {
    pub fn new(arena: &'g GrammarArena<'g>) -> GrammarBuilder<'g> {
        GrammarBuilder {
            arena,
            rules: RefCell::new(Vec::new()),
        }
    }

    fn alloc<S: Into<String>>(&self, name: S, kind: RuleKind<'g>) -> &'g Rule<'g> {
        let rule: &'g Rule<'g> = self.arena.alloc(Rule {
            name: name.into(),
            kind,
        });
        self.rules.borrow_mut().push(rule);
        rule
    }

    /// A rule that looks at tokens directly.
    pub fn token<S: Into<String>>(&self, name: S, token: TokenRule) -> &'g Rule<'g> {
        self.alloc(name, RuleKind::Token(token))
    }

    /// A case-insensitive keyword.
    pub fn keyword(&self, keyword: &'static str) -> &'g Rule<'g> {
        self.token(format!("keyword `{}`", keyword), TokenRule::Keyword(keyword))
    }

    /// A single delimiter character.
    pub fn delimiter(&self, c: char) -> &'g Rule<'g> {
        let name = match c {
            '\n' => "end of line".to_string(),
            '\r' => "carriage return".to_string(),
            c => format!("`{}`", c),
        };
        self.token(name, TokenRule::Delimiter(c))
    }

    /// A sequence without a builder. At most one of the rules may produce a
    /// node, which becomes the node of the sequence.
    pub fn sequence<S: Into<String>>(&self, name: S, rules: Vec<&'g Rule<'g>>) -> &'g Rule<'g> {
        self.alloc(name, RuleKind::Sequence(rules, None))
    }

    /// A sequence whose collected nodes are turned into a new node.
    pub fn collect<S: Into<String>>(
        &self,
        name: S,
        rules: Vec<&'g Rule<'g>>,
        build: Build,
    ) -> &'g Rule<'g> {
        self.alloc(name, RuleKind::Sequence(rules, Some(build)))
    }

    pub fn choice<S: Into<String>>(&self, name: S, rules: Vec<&'g Rule<'g>>) -> &'g Rule<'g> {
        self.alloc(name, RuleKind::Choice(rules))
    }

    /// Repeat a rule `min` to `max` times. A `max` of zero is unbounded.
    pub fn repeat<S: Into<String>>(
        &self,
        name: S,
        rule: &'g Rule<'g>,
        min: usize,
        max: usize,
        build: Option<Build>,
    ) -> &'g Rule<'g> {
        self.alloc(
            name,
            RuleKind::Repeat {
                rule,
                min,
                max,
                build,
            },
        )
    }

    /// Match a rule once or not at all.
    pub fn optional(&self, rule: &'g Rule<'g>) -> &'g Rule<'g> {
        self.repeat(format!("optional {}", rule.name), rule, 0, 1, None)
    }

    /// A placeholder for a rule that is defined later.
    pub fn forward<S: Into<String>>(&self, name: S) -> &'g Rule<'g> {
        self.alloc(name, RuleKind::Forward(OnceCell::new()))
    }

    /// Make a forward rule stand in for `target`.
    pub fn resolve(&self, forward: &'g Rule<'g>, target: &'g Rule<'g>) -> Result<(), GrammarError> {
        match forward.kind {
            RuleKind::Forward(ref cell) => cell
                .set(target)
                .map_err(|_| GrammarError::AlreadyResolved(forward.name.clone())),
            _ => Err(GrammarError::NotForward(forward.name.clone())),
        }
    }

    /// Check the structure of all rules built so far. Returns the number of
    /// rules on success.
    pub fn finish(self) -> Result<usize, GrammarError> {
        let rules = self.rules.into_inner();
        for rule in &rules {
            match rule.kind {
                RuleKind::Sequence(ref children, _) | RuleKind::Choice(ref children) => {
                    if children.is_empty() {
                        return Err(GrammarError::Empty(rule.name.clone()));
                    }
                }
                RuleKind::Repeat { min, max, .. } => {
                    if max != 0 && max < min {
                        return Err(GrammarError::InvalidBounds {
                            rule: rule.name.clone(),
                            min,
                            max,
                        });
                    }
                }
                RuleKind::Forward(_) => {
                    check_forward(rule, rules.len())?;
                }
                RuleKind::Token(_) => (),
            }
        }
        debug!("built grammar with {} rules", rules.len());
        Ok(rules.len())
    }
}

/// Follow a chain of forward rules and make sure it ends in a proper rule.
fn check_forward(rule: &Rule, limit: usize) -> Result<(), GrammarError> {
    let mut current = rule;
    for _ in 0..limit {
        match current.kind {
            RuleKind::Forward(ref cell) => match cell.get() {
                Some(next) => current = *next,
                None => return Err(GrammarError::Unresolved(current.name.clone())),
            },
            _ => return Ok(()),
        }
    }
    Err(GrammarError::ForwardCycle(rule.name.clone()))
}
