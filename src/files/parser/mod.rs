// Copyright (c) 2016-2021 Fabian Schuiki

//! A file list parser. This module implements a push-driven parsing engine
//! made of small combinable rules, and the file list grammar on top of it.
//!
//! Tokens are fed into the rules one at a time. A rule either asks for more
//! input or reports a `ParseResult`. Alternatives of a choice run side by side
//! until only one of them is left, so the engine never needs to rewind the
//! token stream.

pub mod combinators;
pub mod grammar;
pub mod result;
pub mod rule;
mod rules;

#[cfg(test)]
mod test;

pub use self::grammar::{GrammarArena, GrammarBuilder, GrammarError};
pub use self::result::{Mismatch, MismatchKind, Node, ParseResult};
pub use self::rules::RESERVED_WORDS;

use self::rule::Rule;
use crate::ast::{Document, Expression, Statement};
use crate::lexer::token::Token;
use crate::lexer::{tokenize, Lexer};
use log::{debug, trace};
use poc_common::errors::{DiagBuilder2, DiagEmitter, DiagResult2};
use poc_common::source::{Location, Source, SourcePosition};
use poc_common::Session;
use std::fmt;

/// The file list grammar, assembled once and reusable for any number of
/// parses.
pub struct Grammar<'g> {
    document: &'g Rule<'g>,
    statement: &'g Rule<'g>,
    expression: &'g Rule<'g>,
}

impl<'g> Grammar<'g> {
    /// Assemble the grammar in the given arena.
    pub fn build(arena: &'g GrammarArena<'g>) -> Result<Grammar<'g>, GrammarError> {
        let builder = GrammarBuilder::new(arena);
        let rules = rules::build(&builder)?;
        builder.finish()?;
        Ok(Grammar {
            document: rules.document,
            statement: rules.statement,
            expression: rules.expression,
        })
    }

    /// Parse an entire file list.
    pub fn parse(&self, text: &str) -> Result<Document, ParseError> {
        match run(self.document, &mut tokenize(text), false)? {
            Node::Document(doc) => Ok(doc),
            node => Err(unexpected(node)),
        }
    }

    /// Parse a single statement, including its line end.
    pub fn parse_statement(&self, text: &str) -> Result<Statement, ParseError> {
        match run(self.statement, &mut tokenize(text), false)? {
            Node::Statement(stmt) => Ok(stmt),
            node => Err(unexpected(node)),
        }
    }

    /// Parse a single expression which must span the entire text.
    pub fn parse_expression(&self, text: &str) -> Result<Expression, ParseError> {
        match run(self.expression, &mut tokenize(text), false)? {
            Node::Expression(expr) => Ok(expr),
            node => Err(unexpected(node)),
        }
    }

    /// Parse the file list in a source file, reporting failures as
    /// diagnostics that point into the file. Lexer warnings are emitted to
    /// the session.
    pub fn parse_source(&self, sess: &Session, src: Source) -> DiagResult2<Document> {
        let content = src.get_content();
        let text = content.text();
        debug!("parsing {}", src);
        let mut lexer = Lexer::with_source(&text, src);
        let result = run(self.document, &mut lexer, sess.opts.trace_tokens);
        for diag in lexer.take_diagnostics() {
            sess.emit(diag);
        }
        match result {
            Ok(Node::Document(doc)) => Ok(doc),
            Ok(node) => Err(unexpected(node).into_diag(src)),
            Err(e) => Err(e.into_diag(src)),
        }
    }
}

impl Document {
    /// Parse a file list with a freshly assembled grammar.
    pub fn parse(text: &str) -> Result<Document, ParseError> {
        let arena = GrammarArena::new();
        let grammar = Grammar::build(&arena)?;
        grammar.parse(text)
    }
}

/// Feed all tokens and a final end token to a rule. The rule must account
/// for all of the input.
fn run<'g>(rule: &'g Rule<'g>, tokens: &mut Lexer, trace_tokens: bool) -> Result<Node, ParseError> {
    let mut process = rule.start();
    let mut concluded = None;
    while let Some(token) = tokens.next() {
        if trace_tokens {
            debug!("token {:?} at {}", token.kind, token.start);
        }
        if let Some(result) = process.feed(&token) {
            concluded = Some((result, token));
            break;
        }
    }
    let (result, token) = match concluded {
        Some(c) => c,
        None => {
            let end = Token::end(tokens.end_position());
            match process.feed(&end) {
                Some(result) => (result, end),
                None => {
                    return Err(ParseError::Mismatch {
                        reason: format!("unexpected end of input while parsing {}", rule.name),
                        position: end.start,
                    })
                }
            }
        }
    };
    trace!("{} concluded with {:?}", rule.name, result);
    match result {
        ParseResult::Collected { node, last } => {
            let leftover = if last || token.is_end() {
                tokens.next()
            } else {
                Some(token)
            };
            match leftover {
                None => Ok(node),
                Some(token) => Err(ParseError::Mismatch {
                    reason: format!("unexpected {} after {}", token, rule.name),
                    position: token.start,
                }),
            }
        }
        ParseResult::Mismatch(m) => Err(m.into()),
        ParseResult::Match | ParseResult::LastMatch => Err(ParseError::Internal {
            reason: format!("{} produced no node", rule.name),
            position: Some(token.start),
        }),
    }
}

fn unexpected(node: Node) -> ParseError {
    ParseError::Internal {
        reason: format!("parse produced unexpected {} node", node.desc()),
        position: None,
    }
}

/// A failure to parse a file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input does not follow the grammar.
    Mismatch {
        reason: String,
        position: SourcePosition,
    },
    /// The grammar or the engine misbehaved.
    Internal {
        reason: String,
        position: Option<SourcePosition>,
    },
}

impl ParseError {
    pub fn reason(&self) -> &str {
        match *self {
            ParseError::Mismatch { ref reason, .. } | ParseError::Internal { ref reason, .. } => {
                reason
            }
        }
    }

    pub fn position(&self) -> Option<SourcePosition> {
        match *self {
            ParseError::Mismatch { position, .. } => Some(position),
            ParseError::Internal { position, .. } => position,
        }
    }

    /// Convert into a diagnostic pointing into `src`.
    pub fn into_diag(self, src: Source) -> DiagBuilder2 {
        let position = self.position();
        let diag = match self {
            ParseError::Mismatch { reason, .. } => DiagBuilder2::error(reason),
            ParseError::Internal { reason, .. } => DiagBuilder2::bug(reason),
        };
        match position {
            Some(position) => diag.location(Location::new(src, position)),
            None => diag.add_note(format!("while parsing {}", src)),
        }
    }
}

impl From<Mismatch> for ParseError {
    fn from(m: Mismatch) -> ParseError {
        match m.kind {
            MismatchKind::Grammar | MismatchKind::Ambiguous => ParseError::Mismatch {
                reason: m.reason,
                position: m.position,
            },
            MismatchKind::Internal => ParseError::Internal {
                reason: m.reason,
                position: Some(m.position),
            },
        }
    }
}

impl From<GrammarError> for ParseError {
    fn from(e: GrammarError) -> ParseError {
        ParseError::Internal {
            reason: e.to_string(),
            position: None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.position() {
            Some(position) => write!(f, "{}: {}", position, self.reason()),
            None => write!(f, "{}", self.reason()),
        }
    }
}

impl std::error::Error for ParseError {}
