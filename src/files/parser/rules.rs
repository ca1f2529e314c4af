// Copyright (c) 2016-2021 Fabian Schuiki

//! The grammar of file lists.

use crate::ast::*;
use crate::parser::rule::{Rule, TokenRule};
use crate::parser::grammar::{GrammarBuilder, GrammarError};
use crate::parser::result::{BuildError, Node, Nodes};

/// Words that cannot be used as identifiers in expressions.
pub const RESERVED_WORDS: &[&str] = &["not", "and", "or", "xor"];

/// The entry points into the file list grammar.
pub(crate) struct Rules<'g> {
    pub document: &'g Rule<'g>,
    pub statement: &'g Rule<'g>,
    pub expression: &'g Rule<'g>,
}

/// Assemble the file list grammar.
pub(crate) fn build<'g>(b: &GrammarBuilder<'g>) -> Result<Rules<'g>, GrammarError> {
    let ws = b.token("whitespace", TokenRule::OptionalSpace);
    let space = b.token("whitespace", TokenRule::Space);

    // A line end also swallows the indentation of the following line.
    let newline = b.sequence(
        "end of line",
        vec![b.optional(b.delimiter('\r')), b.delimiter('\n'), ws],
    );
    let line_end = b.choice(
        "end of line",
        vec![newline, b.token("end of input", TokenRule::AtEnd)],
    );

    let identifier = b.token(
        "an identifier",
        TokenRule::Name {
            extended: false,
            reserved: RESERVED_WORDS,
        },
    );
    // Reserved words only matter within expressions.
    let library_name = b.token(
        "a library name",
        TokenRule::Name {
            extended: false,
            reserved: &[],
        },
    );
    let quoted = b.sequence(
        "a quoted string",
        vec![
            b.delimiter('"'),
            b.repeat(
                "string characters",
                b.token(
                    "a string character",
                    TokenRule::Text {
                        except: &['"', '\n', '\r'],
                    },
                ),
                0,
                0,
                Some(concat),
            ),
            b.token("closing `\"`", TokenRule::Delimiter('"')),
        ],
    );
    let path = b.choice(
        "a path",
        vec![
            quoted,
            b.token(
                "a path",
                TokenRule::Name {
                    extended: true,
                    reserved: &[],
                },
            ),
        ],
    );

    // Expressions
    let expression = b.forward("an expression");
    let integer = b.collect(
        "an integer",
        vec![
            b.optional(b.token("a sign", TokenRule::OneOf(&['+', '-']))),
            b.repeat("digits", b.token("a number", TokenRule::Number), 1, 0, Some(concat)),
        ],
        build_integer,
    );
    let operator = b.choice(
        "an operator",
        vec![
            b.collect("`=`", vec![b.delimiter('=')], |_| {
                Ok(Node::Operator(BinaryOp::Equal))
            }),
            b.collect("`!=`", vec![b.delimiter('!'), b.delimiter('=')], |_| {
                Ok(Node::Operator(BinaryOp::Unequal))
            }),
            b.collect(
                "`<`",
                vec![
                    b.delimiter('<'),
                    b.optional(b.token("`=`", TokenRule::OneOf(&['=']))),
                ],
                |nodes| match nodes.len() {
                    0 => Ok(Node::Operator(BinaryOp::Less)),
                    _ => Ok(Node::Operator(BinaryOp::LessEqual)),
                },
            ),
            b.collect(
                "`>`",
                vec![
                    b.delimiter('>'),
                    b.optional(b.token("`=`", TokenRule::OneOf(&['=']))),
                ],
                |nodes| match nodes.len() {
                    0 => Ok(Node::Operator(BinaryOp::Greater)),
                    _ => Ok(Node::Operator(BinaryOp::GreaterEqual)),
                },
            ),
            b.collect("`and`", vec![b.keyword("and")], |_| {
                Ok(Node::Operator(BinaryOp::And))
            }),
            b.collect("`or`", vec![b.keyword("or")], |_| {
                Ok(Node::Operator(BinaryOp::Or))
            }),
            b.collect("`xor`", vec![b.keyword("xor")], |_| {
                Ok(Node::Operator(BinaryOp::Xor))
            }),
        ],
    );
    // The right-hand side of a binary expression, up to the closing
    // parenthesis. Plain and binary parenthesized expressions share their
    // prefix so the left-hand side is only parsed once.
    let operation = b.collect(
        "a binary operator",
        vec![operator, ws, expression, ws, b.delimiter(')')],
        |nodes| {
            let mut nodes = Nodes::new(nodes);
            let op = nodes.next()?.into_operator()?;
            let rhs = nodes.next()?.into_expression()?;
            nodes.finish()?;
            Ok(Node::Operation(op, rhs))
        },
    );
    let alternatives = b.choice(
        "an expression",
        vec![
            b.collect("an identifier", vec![identifier], |nodes| {
                let mut nodes = Nodes::new(nodes);
                let name = nodes.next()?.into_text()?;
                nodes.finish()?;
                Ok(Node::Expression(Expression::Identifier(name)))
            }),
            integer,
            b.collect("a string", vec![quoted], |nodes| {
                let mut nodes = Nodes::new(nodes);
                let value = nodes.next()?.into_text()?;
                nodes.finish()?;
                Ok(Node::Expression(Expression::String(value)))
            }),
            b.collect(
                "a negation",
                vec![b.keyword("not"), ws, expression],
                |nodes| {
                    let mut nodes = Nodes::new(nodes);
                    let arg = nodes.next()?.into_expression()?;
                    nodes.finish()?;
                    Ok(Node::Expression(Expression::Not(Box::new(arg))))
                },
            ),
            b.collect(
                "a parenthesized expression",
                vec![
                    b.delimiter('('),
                    ws,
                    expression,
                    ws,
                    b.choice("`)` or an operator", vec![b.delimiter(')'), operation]),
                ],
                build_parenthesized,
            ),
        ],
    );
    b.resolve(expression, alternatives)?;

    // Statements
    let statement = b.forward("a statement");
    let body = b.repeat("statements", statement, 0, 0, Some(build_statements));

    let include = b.collect(
        "an include statement",
        vec![ws, b.keyword("include"), ws, path, ws, line_end],
        |nodes| {
            let mut nodes = Nodes::new(nodes);
            let path = nodes.next()?.into_text()?;
            nodes.finish()?;
            Ok(Node::Statement(Statement::Include(path)))
        },
    );
    let library = b.collect(
        "a library statement",
        vec![
            ws,
            b.keyword("library"),
            ws,
            library_name,
            ws,
            path,
            ws,
            line_end,
        ],
        |nodes| {
            let mut nodes = Nodes::new(nodes);
            let name = nodes.next()?.into_text()?;
            let path = nodes.next()?.into_text()?;
            nodes.finish()?;
            Ok(Node::Statement(Statement::Library { name, path }))
        },
    );
    let vhdl = b.collect(
        "a VHDL source statement",
        vec![ws, b.keyword("vhdl"), ws, library_name, ws, path, ws, line_end],
        |nodes| {
            let mut nodes = Nodes::new(nodes);
            let library = nodes.next()?.into_text()?;
            let path = nodes.next()?.into_text()?;
            nodes.finish()?;
            Ok(Node::Statement(Statement::VhdlSource { library, path }))
        },
    );
    let verilog = b.collect(
        "a Verilog source statement",
        vec![ws, b.keyword("verilog"), ws, path, ws, line_end],
        |nodes| {
            let mut nodes = Nodes::new(nodes);
            let path = nodes.next()?.into_text()?;
            nodes.finish()?;
            Ok(Node::Statement(Statement::VerilogSource(path)))
        },
    );
    let comment = b.collect(
        "a comment",
        vec![
            ws,
            b.delimiter('#'),
            b.repeat(
                "comment text",
                b.token(
                    "comment text",
                    TokenRule::Text {
                        except: &['\n', '\r'],
                    },
                ),
                0,
                0,
                Some(concat),
            ),
            line_end,
        ],
        |nodes| {
            let mut nodes = Nodes::new(nodes);
            let text = nodes.next()?.into_text()?;
            nodes.finish()?;
            Ok(Node::Statement(Statement::Comment(text)))
        },
    );
    let empty = b.choice(
        "an empty line",
        vec![
            b.collect("an empty line", vec![newline], build_empty),
            b.collect("an empty line", vec![space, line_end], build_empty),
        ],
    );

    let if_clause = b.collect(
        "an if clause",
        vec![
            ws,
            b.keyword("if"),
            ws,
            expression,
            ws,
            b.keyword("then"),
            ws,
            line_end,
            body,
        ],
        build_clause,
    );
    let elseif_clause = b.collect(
        "an elseif clause",
        vec![
            ws,
            b.keyword("elseif"),
            ws,
            expression,
            ws,
            b.keyword("then"),
            ws,
            line_end,
            body,
        ],
        build_clause,
    );
    let else_clause = b.collect(
        "an else clause",
        vec![ws, b.keyword("else"), ws, line_end, body],
        |nodes| {
            let mut nodes = Nodes::new(nodes);
            let body = nodes.next()?.into_statements()?;
            nodes.finish()?;
            Ok(Node::Else(ElseClause { body }))
        },
    );
    let end_if = b.sequence(
        "`end if`",
        vec![
            ws,
            b.keyword("end"),
            ws,
            b.keyword("if"),
            ws,
            line_end,
        ],
    );
    let conditional = b.collect(
        "a conditional block",
        vec![
            if_clause,
            b.repeat("elseif clauses", elseif_clause, 0, 0, Some(build_clauses)),
            b.optional(else_clause),
            end_if,
        ],
        build_conditional,
    );

    let alternatives = b.choice(
        "a statement",
        vec![
            conditional,
            vhdl,
            verilog,
            include,
            library,
            comment,
            empty,
        ],
    );
    b.resolve(statement, alternatives)?;

    let document = b.collect(
        "a document",
        vec![
            body,
            b.token("a statement or the end of input", TokenRule::End),
        ],
        |nodes| {
            let mut nodes = Nodes::new(nodes);
            let statements = nodes.next()?.into_statements()?;
            nodes.finish()?;
            Ok(Node::Document(Document::new(statements)))
        },
    );

    Ok(Rules {
        document,
        statement,
        expression,
    })
}

/// Concatenate text nodes.
fn concat(nodes: Vec<Node>) -> Result<Node, BuildError> {
    let mut text = String::new();
    for node in nodes {
        text.push_str(&node.into_text()?);
    }
    Ok(Node::Text(text))
}

fn build_integer(nodes: Vec<Node>) -> Result<Node, BuildError> {
    let mut text = String::new();
    for node in nodes {
        text.push_str(&node.into_text()?);
    }
    match text.parse::<i64>() {
        Ok(value) => Ok(Node::Expression(Expression::Integer(value))),
        Err(_) => Err(BuildError::Reject(format!(
            "integer literal `{}` is out of range",
            text
        ))),
    }
}

/// Either `( expr )` or `( lhs op rhs )`, told apart by whether an operation
/// was collected after the first expression.
fn build_parenthesized(nodes: Vec<Node>) -> Result<Node, BuildError> {
    let mut nodes = Nodes::new(nodes);
    let lhs = nodes.next()?.into_expression()?;
    let expr = match nodes.maybe() {
        Some(node) => {
            let (op, rhs) = node.into_operation()?;
            Expression::binary(op, lhs, rhs)
        }
        None => lhs,
    };
    nodes.finish()?;
    Ok(Node::Expression(expr))
}

fn build_statements(nodes: Vec<Node>) -> Result<Node, BuildError> {
    let statements = nodes
        .into_iter()
        .map(Node::into_statement)
        .collect::<Result<_, _>>()?;
    Ok(Node::Statements(statements))
}

fn build_empty(nodes: Vec<Node>) -> Result<Node, BuildError> {
    Nodes::new(nodes).finish()?;
    Ok(Node::Statement(Statement::Empty))
}

fn build_clause(nodes: Vec<Node>) -> Result<Node, BuildError> {
    let mut nodes = Nodes::new(nodes);
    let condition = nodes.next()?.into_expression()?;
    let body = nodes.next()?.into_statements()?;
    nodes.finish()?;
    Ok(Node::Clause(ConditionalClause { condition, body }))
}

fn build_clauses(nodes: Vec<Node>) -> Result<Node, BuildError> {
    let clauses = nodes
        .into_iter()
        .map(Node::into_clause)
        .collect::<Result<_, _>>()?;
    Ok(Node::Clauses(clauses))
}

fn build_conditional(nodes: Vec<Node>) -> Result<Node, BuildError> {
    let mut nodes = Nodes::new(nodes);
    let if_clause = nodes.next()?.into_clause()?;
    let elseif_clauses = nodes.next()?.into_clauses()?;
    let else_clause = match nodes.maybe() {
        Some(node) => Some(node.into_else()?),
        None => None,
    };
    nodes.finish()?;
    Ok(Node::Statement(Statement::Conditional(Conditional {
        if_clause,
        elseif_clauses,
        else_clause,
    })))
}
