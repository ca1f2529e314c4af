// Copyright (c) 2016-2021 Fabian Schuiki

//! The outcome of feeding a token to a running rule, and the untyped node
//! payloads that travel between rules while a document is being assembled.

use crate::ast::*;
use poc_common::source::SourcePosition;
use std::fmt;

/// The outcome of feeding one token to a running rule. A running rule which
/// needs more tokens reports no result at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    /// The rule matched before the token it was fed. The token was not
    /// consumed and must be handed to whatever comes next.
    Match,
    /// The rule matched and the token it was fed was its last one.
    LastMatch,
    /// The rule matched and produced a node. `last` indicates whether the
    /// token it was fed was consumed, as with `LastMatch`.
    Collected { node: Node, last: bool },
    /// The rule cannot match the input.
    Mismatch(Mismatch),
}

impl ParseResult {
    /// Whether the token that produced this result was consumed by the rule.
    pub fn consumed(&self) -> bool {
        match *self {
            ParseResult::Match | ParseResult::Mismatch(_) => false,
            ParseResult::LastMatch => true,
            ParseResult::Collected { last, .. } => last,
        }
    }

    /// Extract the payload of a `Collected` result.
    pub fn into_node(self) -> Option<Node> {
        match self {
            ParseResult::Collected { node, .. } => Some(node),
            _ => None,
        }
    }

}

/// A failure to match, together with the position where it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub reason: String,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// The input does not follow the grammar.
    Grammar,
    /// More than one alternative of a choice matched on the same token.
    Ambiguous,
    /// A rule or node builder behaved in a way the engine cannot handle.
    Internal,
}

impl Mismatch {
    pub fn new<S: Into<String>>(reason: S, position: SourcePosition) -> Mismatch {
        Mismatch {
            kind: MismatchKind::Grammar,
            reason: reason.into(),
            position,
        }
    }

    pub fn ambiguous<S: Into<String>>(reason: S, position: SourcePosition) -> Mismatch {
        Mismatch {
            kind: MismatchKind::Ambiguous,
            reason: reason.into(),
            position,
        }
    }

    pub fn internal<S: Into<String>>(reason: S, position: SourcePosition) -> Mismatch {
        Mismatch {
            kind: MismatchKind::Internal,
            reason: reason.into(),
            position,
        }
    }
}

impl From<Mismatch> for ParseResult {
    fn from(m: Mismatch) -> ParseResult {
        ParseResult::Mismatch(m)
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.reason)
    }
}

/// A node builder turns the payloads collected by a rule into a new node.
pub type Build = fn(Vec<Node>) -> Result<Node, BuildError>;

/// A failure to build a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The payloads have the expected shape but their content is not
    /// acceptable, such as an integer literal that does not fit.
    Reject(String),
    /// The payloads were not of the expected shape.
    Internal(String),
}

/// An untyped payload produced by a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Operator(BinaryOp),
    /// The operator and right-hand side of a binary expression.
    Operation(BinaryOp, Expression),
    Expression(Expression),
    Statement(Statement),
    Statements(Vec<Statement>),
    Clause(ConditionalClause),
    Clauses(Vec<ConditionalClause>),
    Else(ElseClause),
    Document(Document),
}

impl Node {
    /// A short name of the node variant, for error messages.
    pub fn desc(&self) -> &'static str {
        match *self {
            Node::Text(_) => "text",
            Node::Operator(_) => "operator",
            Node::Operation(..) => "operation",
            Node::Expression(_) => "expression",
            Node::Statement(_) => "statement",
            Node::Statements(_) => "statement list",
            Node::Clause(_) => "conditional clause",
            Node::Clauses(_) => "conditional clause list",
            Node::Else(_) => "else clause",
            Node::Document(_) => "document",
        }
    }

    fn unexpected<T>(self, expected: &str) -> Result<T, BuildError> {
        Err(BuildError::Internal(format!(
            "expected {} node, got {}",
            expected,
            self.desc()
        )))
    }

    pub fn into_text(self) -> Result<String, BuildError> {
        match self {
            Node::Text(t) => Ok(t),
            n => n.unexpected("text"),
        }
    }

    pub fn into_expression(self) -> Result<Expression, BuildError> {
        match self {
            Node::Expression(e) => Ok(e),
            n => n.unexpected("expression"),
        }
    }

    pub fn into_operator(self) -> Result<BinaryOp, BuildError> {
        match self {
            Node::Operator(op) => Ok(op),
            n => n.unexpected("operator"),
        }
    }

    pub fn into_operation(self) -> Result<(BinaryOp, Expression), BuildError> {
        match self {
            Node::Operation(op, rhs) => Ok((op, rhs)),
            n => n.unexpected("operation"),
        }
    }

    pub fn into_statement(self) -> Result<Statement, BuildError> {
        match self {
            Node::Statement(s) => Ok(s),
            n => n.unexpected("statement"),
        }
    }

    pub fn into_statements(self) -> Result<Vec<Statement>, BuildError> {
        match self {
            Node::Statements(s) => Ok(s),
            n => n.unexpected("statement list"),
        }
    }

    pub fn into_clause(self) -> Result<ConditionalClause, BuildError> {
        match self {
            Node::Clause(c) => Ok(c),
            n => n.unexpected("conditional clause"),
        }
    }

    pub fn into_clauses(self) -> Result<Vec<ConditionalClause>, BuildError> {
        match self {
            Node::Clauses(c) => Ok(c),
            n => n.unexpected("conditional clause list"),
        }
    }

    pub fn into_else(self) -> Result<ElseClause, BuildError> {
        match self {
            Node::Else(e) => Ok(e),
            n => n.unexpected("else clause"),
        }
    }
}

/// Pops payloads off the front of a builder's input.
pub(crate) struct Nodes(std::vec::IntoIter<Node>);

impl Nodes {
    pub fn new(nodes: Vec<Node>) -> Nodes {
        Nodes(nodes.into_iter())
    }

    /// Take the next payload, failing if there is none.
    pub fn next(&mut self) -> Result<Node, BuildError> {
        self.0
            .next()
            .ok_or_else(|| BuildError::Internal("missing node".to_string()))
    }

    /// Take the next payload if there is one.
    pub fn maybe(&mut self) -> Option<Node> {
        self.0.next()
    }

    /// Fail if there are payloads left over.
    pub fn finish(mut self) -> Result<(), BuildError> {
        match self.0.next() {
            Some(n) => Err(BuildError::Internal(format!(
                "unexpected {} node",
                n.desc()
            ))),
            None => Ok(()),
        }
    }
}
