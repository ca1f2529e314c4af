// Copyright (c) 2016-2021 Fabian Schuiki

//! Rules and the processes that run them.
//!
//! A `Rule` is an immutable node of the grammar graph. Starting a rule yields
//! a `Process` which is fed one token at a time until it reports a result.
//! Processes never look back at tokens they have already been fed, so a
//! document is parsed in a single pass over its tokens.

use crate::lexer::token::{Token, TokenKind};
use crate::parser::combinators::{ChoiceProcess, RepeatProcess, SequenceProcess};
use crate::parser::result::{Build, Mismatch, Node, ParseResult};
use once_cell::unsync::OnceCell;
use poc_common::source::SourcePosition;
use std::fmt;

/// A running instance of a rule.
pub trait Process {
    /// Feed the next token. Returns `None` while the rule needs more input.
    /// Once a result has been returned, the process must not be fed again.
    fn feed(&mut self, token: &Token) -> Option<ParseResult>;
}

/// A node of the grammar graph.
pub struct Rule<'g> {
    /// Describes what the rule matches, as in "expected {name}".
    pub name: String,
    pub kind: RuleKind<'g>,
}

pub enum RuleKind<'g> {
    /// Matches one or more tokens directly.
    Token(TokenRule),
    /// Matches each rule in turn, passing the collected nodes to the builder.
    Sequence(Vec<&'g Rule<'g>>, Option<Build>),
    /// Matches exactly one of the rules.
    Choice(Vec<&'g Rule<'g>>),
    /// Matches a rule `min` to `max` times. A `max` of zero is unbounded.
    Repeat {
        rule: &'g Rule<'g>,
        min: usize,
        max: usize,
        build: Option<Build>,
    },
    /// Stands in for a rule that is defined later.
    Forward(OnceCell<&'g Rule<'g>>),
}

/// The rules that look at tokens directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRule {
    /// A word that equals the keyword, ignoring case, and is not followed by
    /// further characters of a name.
    Keyword(&'static str),
    /// A specific delimiter character.
    Delimiter(char),
    /// One of the given delimiter characters, collected as text.
    OneOf(&'static [char]),
    /// A run of whitespace.
    Space,
    /// An optional run of whitespace. Matches before any other token.
    OptionalSpace,
    /// A number, collected as text.
    Number,
    /// Any token except the end of input and the given delimiters, collected
    /// as text.
    Text { except: &'static [char] },
    /// A name made up of words, numbers and underscores, collected as text.
    /// The name must not start with a number. The extended form additionally
    /// accepts `.`, `-` and `/` anywhere, and may start with a number.
    Name {
        extended: bool,
        reserved: &'static [&'static str],
    },
    /// The end of input. Consumes the end token.
    End,
    /// The end of input. Matches before the end token without consuming it.
    AtEnd,
}

/// The characters an extended name accepts in addition to a plain one.
const EXTENDED_NAME_CHARS: &[char] = &['.', '-', '/'];

impl<'g> Rule<'g> {
    /// Start a new process for this rule.
    pub fn start(&'g self) -> Box<dyn Process + 'g> {
        match self.kind {
            RuleKind::Token(TokenRule::Keyword(keyword)) => Box::new(KeywordProcess {
                rule: self,
                keyword,
                text: String::new(),
                start: None,
            }),
            RuleKind::Token(TokenRule::Name { extended, reserved }) => Box::new(NameProcess {
                rule: self,
                extended,
                reserved,
                text: String::new(),
                start: None,
            }),
            RuleKind::Token(ref token) => Box::new(TokenProcess { rule: self, token }),
            RuleKind::Sequence(ref rules, _) | RuleKind::Choice(ref rules) if rules.is_empty() => {
                Box::new(BrokenProcess {
                    reason: format!("rule `{}` has no sub-rules", self.name),
                })
            }
            RuleKind::Sequence(ref rules, build) => {
                Box::new(SequenceProcess::new(self, rules, build))
            }
            RuleKind::Choice(ref rules) => Box::new(ChoiceProcess::new(self, rules)),
            RuleKind::Repeat {
                rule,
                min,
                max,
                build,
            } => Box::new(RepeatProcess::new(self, rule, min, max, build)),
            RuleKind::Forward(ref target) => match target.get() {
                Some(rule) => rule.start(),
                None => Box::new(BrokenProcess {
                    reason: format!("forward rule `{}` was never resolved", self.name),
                }),
            },
        }
    }

    /// The mismatch reported when this rule is fed an unexpected token.
    pub fn expected(&self, token: &Token) -> Mismatch {
        Mismatch::new(format!("expected {}, found {}", self.name, token), token.start)
    }
}

impl fmt::Debug for Rule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            RuleKind::Token(ref t) => return write!(f, "{:?}", t),
            RuleKind::Sequence(..) => "Sequence",
            RuleKind::Choice(..) => "Choice",
            RuleKind::Repeat { .. } => "Repeat",
            RuleKind::Forward(..) => "Forward",
        };
        write!(f, "{}(\"{}\")", kind, self.name)
    }
}

/// Runs the single-token rules.
struct TokenProcess<'g> {
    rule: &'g Rule<'g>,
    token: &'g TokenRule,
}

impl Process for TokenProcess<'_> {
    fn feed(&mut self, token: &Token) -> Option<ParseResult> {
        let text = |t: &Token| ParseResult::Collected {
            node: Node::Text(t.text().into_owned()),
            last: true,
        };
        let matched = match (self.token, &token.kind) {
            (&TokenRule::Delimiter(c), &TokenKind::Delimiter(d)) if c == d => ParseResult::LastMatch,
            (TokenRule::OneOf(set), &TokenKind::Delimiter(d)) if set.contains(&d) => text(token),
            (TokenRule::Space, TokenKind::Space(_)) => ParseResult::LastMatch,
            (TokenRule::OptionalSpace, TokenKind::Space(_)) => ParseResult::LastMatch,
            (TokenRule::OptionalSpace, _) => ParseResult::Match,
            (TokenRule::Number, TokenKind::Number(_)) => text(token),
            (TokenRule::Text { except }, &TokenKind::Delimiter(d)) if !except.contains(&d) => {
                text(token)
            }
            (TokenRule::Text { .. }, TokenKind::Space(_))
            | (TokenRule::Text { .. }, TokenKind::Word(_))
            | (TokenRule::Text { .. }, TokenKind::Number(_)) => text(token),
            (TokenRule::End, TokenKind::End) => ParseResult::LastMatch,
            (TokenRule::AtEnd, TokenKind::End) => ParseResult::Match,
            _ => ParseResult::Mismatch(self.rule.expected(token)),
        };
        Some(matched)
    }
}

/// Whether a token can continue a name that has already started.
fn continues_name(token: &Token) -> bool {
    match token.kind {
        TokenKind::Word(_) | TokenKind::Number(_) | TokenKind::Delimiter('_') => true,
        _ => false,
    }
}

/// Matches a keyword. The keyword only matches once the token after it shows
/// that it is not the prefix of a longer name such as `not_used`.
struct KeywordProcess<'g> {
    rule: &'g Rule<'g>,
    keyword: &'static str,
    text: String,
    start: Option<SourcePosition>,
}

impl Process for KeywordProcess<'_> {
    fn feed(&mut self, token: &Token) -> Option<ParseResult> {
        let start = match self.start {
            Some(start) => start,
            None if token.is_keyword(self.keyword) => {
                self.start = Some(token.start);
                self.text.push_str(&token.text());
                return None;
            }
            None => return Some(ParseResult::Mismatch(self.rule.expected(token))),
        };
        if continues_name(token) {
            self.text.push_str(&token.text());
            return None;
        }
        if self.text.eq_ignore_ascii_case(self.keyword) {
            Some(ParseResult::Match)
        } else {
            Some(ParseResult::Mismatch(Mismatch::new(
                format!("expected {}, found `{}`", self.rule.name, self.text),
                start,
            )))
        }
    }
}

/// Accumulates the tokens of a name until a token that cannot be part of it.
struct NameProcess<'g> {
    rule: &'g Rule<'g>,
    extended: bool,
    reserved: &'static [&'static str],
    text: String,
    start: Option<SourcePosition>,
}

impl NameProcess<'_> {
    fn accepts(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Number(_) if self.text.is_empty() => self.extended,
            TokenKind::Delimiter(c) if c != '_' => {
                self.extended && EXTENDED_NAME_CHARS.contains(&c)
            }
            _ => continues_name(token),
        }
    }
}

impl Process for NameProcess<'_> {
    fn feed(&mut self, token: &Token) -> Option<ParseResult> {
        if self.accepts(token) {
            self.text.push_str(&token.text());
            if self.start.is_none() {
                self.start = Some(token.start);
            }
            return None;
        }
        let start = match self.start {
            Some(start) => start,
            None => return Some(ParseResult::Mismatch(self.rule.expected(token))),
        };
        if let Some(word) = self.reserved.iter().find(|w| self.text.eq_ignore_ascii_case(w)) {
            return Some(ParseResult::Mismatch(Mismatch::new(
                format!("expected {}, found reserved word `{}`", self.rule.name, word),
                start,
            )));
        }
        Some(ParseResult::Collected {
            node: Node::Text(std::mem::take(&mut self.text)),
            last: false,
        })
    }
}

/// A rule that cannot run since the grammar was not validated.
struct BrokenProcess {
    reason: String,
}

impl Process for BrokenProcess {
    fn feed(&mut self, token: &Token) -> Option<ParseResult> {
        Some(ParseResult::Mismatch(Mismatch::internal(
            self.reason.clone(),
            token.start,
        )))
    }
}
