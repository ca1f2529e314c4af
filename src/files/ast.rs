// Copyright (c) 2016-2021 Fabian Schuiki

//! The abstract syntax tree of a file list.
//!
//! The tree is owned and immutable once the parser returns it. Printing a
//! `Document` yields a normalized file list which parses back into the same
//! tree.

use poc_common::util::HasDesc;
use serde::Serialize;
use std::fmt;

/// A parsed file list.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Document {
    pub statements: Vec<Statement>,
}

impl Document {
    pub fn new(statements: Vec<Statement>) -> Document {
        Document { statements }
    }

    /// The top-level statements that are neither comments nor empty lines.
    pub fn significant_statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter().filter(|s| s.is_significant())
    }
}

/// A single statement of a file list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// A line with nothing but whitespace.
    Empty,
    /// A line comment. Holds everything after the `#` up to the line end.
    Comment(String),
    /// `include "path"`
    Include(String),
    /// `library name "path"`
    Library { name: String, path: String },
    /// `vhdl library "path"`
    VhdlSource { library: String, path: String },
    /// `verilog "path"`
    VerilogSource(String),
    /// An `if`/`elseif`/`else`/`end if` block.
    Conditional(Conditional),
}

impl Statement {
    /// Whether the statement carries meaning. Comments and empty lines don't.
    pub fn is_significant(&self) -> bool {
        match *self {
            Statement::Empty | Statement::Comment(_) => false,
            _ => true,
        }
    }
}

impl HasDesc for Statement {
    fn desc(&self) -> &'static str {
        match *self {
            Statement::Empty => "empty line",
            Statement::Comment(_) => "comment",
            Statement::Include(_) => "include",
            Statement::Library { .. } => "library reference",
            Statement::VhdlSource { .. } => "VHDL source",
            Statement::VerilogSource(_) => "Verilog source",
            Statement::Conditional(_) => "conditional",
        }
    }

    fn desc_full(&self) -> String {
        match *self {
            Statement::Include(ref path) | Statement::VerilogSource(ref path) => {
                format!("{} `{}`", self.desc(), path)
            }
            Statement::Library { ref name, .. } => format!("{} `{}`", self.desc(), name),
            Statement::VhdlSource { ref path, .. } => format!("{} `{}`", self.desc(), path),
            _ => self.desc().into(),
        }
    }
}

/// A conditional block. Only the first clause whose condition holds applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conditional {
    pub if_clause: ConditionalClause,
    pub elseif_clauses: Vec<ConditionalClause>,
    pub else_clause: Option<ElseClause>,
}

/// An `if` or `elseif` clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalClause {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

/// The `else` clause of a conditional block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElseClause {
    pub body: Vec<Statement>,
}

/// A condition expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Identifier(String),
    Integer(i64),
    String(String),
    Not(Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::Binary(op, Box::new(lhs), Box::new(rhs))
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Equal,
    Unequal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    /// The operator as written in a file list.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Equal => "=",
            BinaryOp::Unequal => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }

    /// Whether the operator combines two booleans.
    pub fn is_logical(self) -> bool {
        match self {
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => true,
            _ => false,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Expression::Identifier(ref name) => write!(f, "{}", name),
            Expression::Integer(value) => write!(f, "{}", value),
            Expression::String(ref value) => write!(f, "\"{}\"", value),
            Expression::Not(ref arg) => write!(f, "not {}", arg),
            Expression::Binary(op, ref lhs, ref rhs) => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_body(f, &self.statements, 0)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_statement(f, self, 0)
    }
}

fn write_body(f: &mut fmt::Formatter, body: &[Statement], level: usize) -> fmt::Result {
    for stmt in body {
        write_statement(f, stmt, level)?;
    }
    Ok(())
}

fn write_statement(f: &mut fmt::Formatter, stmt: &Statement, level: usize) -> fmt::Result {
    let indent = level * 2;
    match *stmt {
        Statement::Empty => writeln!(f),
        Statement::Comment(ref text) => writeln!(f, "{:2$}#{}", "", text, indent),
        Statement::Include(ref path) => writeln!(f, "{:2$}include \"{}\"", "", path, indent),
        Statement::Library { ref name, ref path } => {
            writeln!(f, "{:3$}library {} \"{}\"", "", name, path, indent)
        }
        Statement::VhdlSource {
            ref library,
            ref path,
        } => writeln!(f, "{:3$}vhdl {} \"{}\"", "", library, path, indent),
        Statement::VerilogSource(ref path) => {
            writeln!(f, "{:2$}verilog \"{}\"", "", path, indent)
        }
        Statement::Conditional(ref cond) => {
            writeln!(f, "{:2$}if {} then", "", cond.if_clause.condition, indent)?;
            write_body(f, &cond.if_clause.body, level + 1)?;
            for clause in &cond.elseif_clauses {
                writeln!(f, "{:2$}elseif {} then", "", clause.condition, indent)?;
                write_body(f, &clause.body, level + 1)?;
            }
            if let Some(ref clause) = cond.else_clause {
                writeln!(f, "{:1$}else", "", indent)?;
                write_body(f, &clause.body, level + 1)?;
            }
            writeln!(f, "{:1$}end if", "", indent)
        }
    }
}
