// Copyright (c) 2016-2021 Fabian Schuiki

use crate::ast::*;
use crate::lexer::tokenize;
use crate::parser::result::BuildError;
use crate::parser::rule::TokenRule;
use crate::parser::*;
use poc_common::source::SourcePosition;

macro_rules! parse {
    ($content:expr) => {{
        match Document::parse($content) {
            Ok(doc) => doc,
            Err(e) => panic!("parser failed: {}", e),
        }
    }};
    ($content:expr, $parse_fn:ident) => {{
        let arena = GrammarArena::new();
        let grammar = Grammar::build(&arena).expect("grammar is valid");
        match grammar.$parse_fn($content) {
            Ok(x) => x,
            Err(e) => panic!("parser failed: {}", e),
        }
    }};
}

macro_rules! fails {
    ($content:expr) => {{
        match Document::parse($content) {
            Ok(doc) => panic!("parser accepted invalid input:\n{}", doc),
            Err(e) => e,
        }
    }};
    ($content:expr, $parse_fn:ident) => {{
        let arena = GrammarArena::new();
        let grammar = Grammar::build(&arena).expect("grammar is valid");
        match grammar.$parse_fn($content) {
            Ok(x) => panic!("parser accepted invalid input: {:?}", x),
            Err(e) => e,
        }
    }};
}

fn ident(name: &str) -> Expression {
    Expression::Identifier(name.into())
}

fn string(value: &str) -> Expression {
    Expression::String(value.into())
}

fn vhdl(library: &str, path: &str) -> Statement {
    Statement::VhdlSource {
        library: library.into(),
        path: path.into(),
    }
}

fn join(nodes: Vec<Node>) -> Result<Node, BuildError> {
    let mut text = String::new();
    for node in nodes {
        text.push_str(&node.into_text()?);
    }
    Ok(Node::Text(text))
}

#[test]
fn vhdl_source() {
    let doc = parse!("vhdl poc \"file1.vhdl\"");
    assert_eq!(doc.statements, vec![vhdl("poc", "file1.vhdl")]);
}

#[test]
fn all_statements() {
    let doc = parse!(
        "include \"common.files\"\n\
         library osvvm \"lib/osvvm\"\n\
         vhdl poc \"src/common/utils.vhdl\"\n\
         verilog \"src/top.v\"\n\
         # a comment\n\
         \n"
    );
    assert_eq!(
        doc.statements,
        vec![
            Statement::Include("common.files".into()),
            Statement::Library {
                name: "osvvm".into(),
                path: "lib/osvvm".into(),
            },
            vhdl("poc", "src/common/utils.vhdl"),
            Statement::VerilogSource("src/top.v".into()),
            Statement::Comment(" a comment".into()),
            Statement::Empty,
        ]
    );
}

#[test]
fn single_statement() {
    let stmt = parse!("verilog \"tb/top_tb.v\"\n", parse_statement);
    assert_eq!(stmt, Statement::VerilogSource("tb/top_tb.v".into()));
}

#[test]
fn empty_document() {
    assert_eq!(parse!("").statements, vec![]);
    assert_eq!(parse!("\n").statements, vec![Statement::Empty]);
    assert_eq!(parse!("   ").statements, vec![Statement::Empty]);
}

#[test]
fn keywords_ignore_case() {
    let doc = parse!("VHDL PoC \"A.vhdl\"\nInclude \"X.files\"\n");
    assert_eq!(
        doc.statements,
        vec![vhdl("PoC", "A.vhdl"), Statement::Include("X.files".into())]
    );
}

#[test]
fn crlf_line_ends() {
    let doc = parse!("vhdl poc \"a.vhdl\"\r\nverilog \"b.v\"\r\n");
    assert_eq!(
        doc.statements,
        vec![vhdl("poc", "a.vhdl"), Statement::VerilogSource("b.v".into())]
    );
}

#[test]
fn unquoted_paths() {
    let doc = parse!("vhdl poc src/fifo/fifo_cc_got.vhdl\ninclude ../common-2.files\n");
    assert_eq!(
        doc.statements,
        vec![
            vhdl("poc", "src/fifo/fifo_cc_got.vhdl"),
            Statement::Include("../common-2.files".into()),
        ]
    );
}

#[test]
fn indented_statements() {
    let doc = parse!("  vhdl poc \"a.vhdl\"\n\t\tverilog \"b.v\"  \n");
    assert_eq!(
        doc.statements,
        vec![vhdl("poc", "a.vhdl"), Statement::VerilogSource("b.v".into())]
    );
}

#[test]
fn nested_conditional() {
    let doc = parse!(
        "if (Device = \"Virtex5\") then\n  vhdl poc \"v5.vhdl\"\nelse\n  vhdl poc \"generic.vhdl\"\nend if\n"
    );
    assert_eq!(
        doc.statements,
        vec![Statement::Conditional(Conditional {
            if_clause: ConditionalClause {
                condition: Expression::binary(BinaryOp::Equal, ident("Device"), string("Virtex5")),
                body: vec![vhdl("poc", "v5.vhdl")],
            },
            elseif_clauses: vec![],
            else_clause: Some(ElseClause {
                body: vec![vhdl("poc", "generic.vhdl")],
            }),
        })]
    );
}

#[test]
fn elseif_chain() {
    let doc = parse!(
        "If (Vendor = \"Xilinx\") Then\n\
         \tinclude \"xil.files\"\n\
         ElseIf (Vendor = \"Altera\") then\n\
         \tinclude \"alt.files\"\n\
         elseif (Vendor = \"Lattice\") then\n\
         END IF\n"
    );
    let cond = match doc.statements.as_slice() {
        [Statement::Conditional(cond)] => cond,
        other => panic!("unexpected statements {:?}", other),
    };
    assert_eq!(cond.if_clause.body, vec![Statement::Include("xil.files".into())]);
    assert_eq!(cond.elseif_clauses.len(), 2);
    assert_eq!(
        cond.elseif_clauses[0].condition,
        Expression::binary(BinaryOp::Equal, ident("Vendor"), string("Altera"))
    );
    assert_eq!(cond.elseif_clauses[1].body, vec![]);
    assert_eq!(cond.else_clause, None);
}

#[test]
fn deeply_nested_conditionals() {
    let doc = parse!(
        "if (Sim = true) then\n\
         \x20 if (Tool = \"GHDL\") then\n\
         \x20   # GHDL needs the VITAL library\n\
         \x20   library vital \"lib/vital\"\n\
         \x20 else\n\
         \x20   vhdl sim \"src/sim/generic.vhdl\"\n\
         \x20 end if\n\
         end if\n\
         vhdl poc \"top.vhdl\"\n"
    );
    assert_eq!(doc.statements.len(), 2);
    let outer = match doc.statements[0] {
        Statement::Conditional(ref c) => c,
        ref other => panic!("unexpected statement {:?}", other),
    };
    assert_eq!(outer.if_clause.body.len(), 1);
    let inner = match outer.if_clause.body[0] {
        Statement::Conditional(ref c) => c,
        ref other => panic!("unexpected statement {:?}", other),
    };
    assert_eq!(inner.if_clause.body.len(), 2);
    assert_eq!(
        inner.else_clause.as_ref().map(|e| e.body.clone()),
        Some(vec![vhdl("sim", "src/sim/generic.vhdl")])
    );
    assert_eq!(doc.statements[1], vhdl("poc", "top.vhdl"));
}

#[test]
fn comments_and_empty_lines_are_insignificant() {
    let plain = parse!("vhdl poc \"a.vhdl\"\nverilog \"b.v\"\n");
    let noisy = parse!("# header\n\nvhdl poc \"a.vhdl\"\n   \n# mid\nverilog \"b.v\"\n");
    assert_eq!(noisy.statements.len(), 6);
    assert!(plain
        .significant_statements()
        .eq(noisy.significant_statements()));
}

#[test]
fn expressions() {
    assert_eq!(parse!("Device", parse_expression), ident("Device"));
    assert_eq!(parse!("-42", parse_expression), Expression::Integer(-42));
    assert_eq!(parse!("+7", parse_expression), Expression::Integer(7));
    assert_eq!(parse!("\"Virtex 5\"", parse_expression), string("Virtex 5"));
    assert_eq!(parse!("( Device )", parse_expression), ident("Device"));
    assert_eq!(
        parse!("not (a or b)", parse_expression),
        Expression::Not(Box::new(Expression::binary(
            BinaryOp::Or,
            ident("a"),
            ident("b")
        )))
    );
    assert_eq!(
        parse!("((a = 1) and (b != \"x\"))", parse_expression),
        Expression::binary(
            BinaryOp::And,
            Expression::binary(BinaryOp::Equal, ident("a"), Expression::Integer(1)),
            Expression::binary(BinaryOp::Unequal, ident("b"), string("x")),
        )
    );
    assert_eq!(
        parse!("(a xor b)", parse_expression),
        Expression::binary(BinaryOp::Xor, ident("a"), ident("b"))
    );
}

#[test]
fn relational_operators() {
    let cases = [
        ("(Speed < 2)", BinaryOp::Less),
        ("(Speed <= 2)", BinaryOp::LessEqual),
        ("(Speed > 2)", BinaryOp::Greater),
        ("(Speed >= 2)", BinaryOp::GreaterEqual),
        ("(Speed>=2)", BinaryOp::GreaterEqual),
    ];
    for &(text, op) in &cases {
        assert_eq!(
            parse!(text, parse_expression),
            Expression::binary(op, ident("Speed"), Expression::Integer(2)),
            "parsing {}",
            text
        );
    }
}

#[test]
fn identifiers() {
    assert_eq!(parse!("_tmp1", parse_expression), ident("_tmp1"));
    assert_eq!(parse!("notice", parse_expression), ident("notice"));
    let err = fails!("and", parse_expression);
    assert!(err.reason().contains("reserved word `and`"), "{}", err);
    fails!("1abc", parse_expression);
}

#[test]
fn keywords_do_not_split_names() {
    assert_eq!(parse!("not_used", parse_expression), ident("not_used"));
    assert_eq!(parse!("not1", parse_expression), ident("not1"));
    assert_eq!(
        parse!("(not_used = 1)", parse_expression),
        Expression::binary(BinaryOp::Equal, ident("not_used"), Expression::Integer(1))
    );
    assert_eq!(
        parse!("(and_mode or or_x)", parse_expression),
        Expression::binary(BinaryOp::Or, ident("and_mode"), ident("or_x"))
    );
    let doc = parse!("if (not_synth = 1) then\nend if\n");
    match doc.statements.as_slice() {
        [Statement::Conditional(cond)] => assert_eq!(
            cond.if_clause.condition,
            Expression::binary(BinaryOp::Equal, ident("not_synth"), Expression::Integer(1))
        ),
        other => panic!("unexpected statements {:?}", other),
    }
    let err = fails!("include_x \"a.files\"\n", parse_statement);
    assert_eq!(err.reason(), "expected keyword `include`, found `include_x`");
    assert_eq!(err.position(), Some(SourcePosition::new(1, 1, 1)));
}

#[test]
fn deeply_nested_expressions() {
    let depth = 30;
    let text = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parse!(&text, parse_expression), ident("x"));

    let mut text = "a".to_string();
    let mut expected = ident("a");
    for _ in 0..depth {
        text = format!("( {} or b )", text);
        expected = Expression::binary(BinaryOp::Or, expected, ident("b"));
    }
    assert_eq!(parse!(&text, parse_expression), expected);
}

#[test]
fn invalid_expressions() {
    fails!("(a = )", parse_expression);
    fails!("(a b)", parse_expression);
    fails!("a = b", parse_expression);
    let err = fails!("(a = 99999999999999999999)", parse_expression);
    assert_eq!(
        err,
        ParseError::Mismatch {
            reason: "integer literal `99999999999999999999` is out of range".into(),
            position: SourcePosition::new(1, 6, 6),
        }
    );
}

#[test]
fn unterminated_conditional() {
    let err = fails!("if (a = 1) then\n  vhdl poc \"x.vhdl\"\n");
    assert_eq!(
        err,
        ParseError::Mismatch {
            reason: "expected keyword `end`, found end of input".into(),
            position: SourcePosition::new(3, 1, 37),
        }
    );
}

#[test]
fn trailing_garbage() {
    let err = fails!("vhdl poc \"a.vhdl\" extra\n");
    assert_eq!(err.reason(), "expected end of line, found `extra`");
    assert_eq!(err.position(), Some(SourcePosition::new(1, 19, 19)));
}

#[test]
fn unterminated_string() {
    let err = fails!("include \"abc\nvhdl poc \"x\"\n");
    assert_eq!(err.reason(), "expected closing `\"`, found end of line");
    assert_eq!(err.position(), Some(SourcePosition::new(1, 13, 13)));
}

#[test]
fn stray_clause() {
    let err = fails!("vhdl poc \"a\"\nelse\n");
    assert_eq!(err.reason(), "expected a statement or the end of input, found `else`");
    assert_eq!(err.position(), Some(SourcePosition::new(2, 1, 14)));
}

#[test]
fn missing_library_name() {
    let err = fails!("vhdl \"a.vhdl\"\n");
    assert_eq!(err.reason(), "expected a library name, found `\"`");
}

#[test]
fn library_names_may_be_reserved_words() {
    let doc = parse!("vhdl or \"x.vhdl\"\nlibrary AND \"lib/and\"\n");
    assert_eq!(
        doc.statements,
        vec![
            vhdl("or", "x.vhdl"),
            Statement::Library {
                name: "AND".into(),
                path: "lib/and".into(),
            },
        ]
    );
}

#[test]
fn display_round_trip() {
    let text = "# sources\n\
                vhdl poc \"a.vhdl\"\n\
                if ((Vendor = \"Xilinx\") and not (Speed < -1)) then\n\
                    include \"xil.files\"\n\
                elseif (Vendor != \"Altera\") then\n\
                else\n\
                    verilog \"b.v\"\n\
                end if\n\
                \n\
                library osvvm \"lib/osvvm\"\n";
    let doc = parse!(text);
    let printed = format!("{}", doc);
    assert_eq!(parse!(&printed), doc);
}

#[test]
fn grammar_is_reusable() {
    let arena = GrammarArena::new();
    let grammar = Grammar::build(&arena).expect("grammar is valid");
    let first = grammar.parse("vhdl a \"x\"\n").expect("parses");
    assert!(grammar.parse("vhdl a x y\n").is_err());
    let second = grammar.parse("vhdl a \"x\"\n").expect("parses");
    assert_eq!(first, second);
}

#[test]
fn ambiguous_choice() {
    let arena = GrammarArena::new();
    let b = GrammarBuilder::new(&arena);
    let rule = b.choice("a keyword", vec![b.keyword("vhdl"), b.keyword("VHDL")]);
    b.finish().expect("grammar is valid");
    match run(rule, &mut tokenize("vhdl"), false) {
        Err(ParseError::Mismatch { reason, position }) => {
            assert!(reason.starts_with("ambiguous alternatives"), "{}", reason);
            assert_eq!(position, SourcePosition::new(1, 5, 5));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn repeat_bounds() {
    let arena = GrammarArena::new();
    let b = GrammarBuilder::new(&arena);
    let rule = b.repeat(
        "hashes",
        b.token("a hash", TokenRule::OneOf(&['#'])),
        1,
        3,
        Some(join),
    );
    b.finish().expect("grammar is valid");
    assert!(run(rule, &mut tokenize(""), false).is_err());
    for input in &["#", "##", "###"] {
        assert_eq!(
            run(rule, &mut tokenize(input), false),
            Ok(Node::Text(input.to_string()))
        );
    }
    match run(rule, &mut tokenize("####"), false) {
        Err(ParseError::Mismatch { reason, position }) => {
            assert_eq!(reason, "expected at most 3 a hash");
            assert_eq!(position, SourcePosition::new(1, 4, 4));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn zero_width_repetition_is_internal() {
    let arena = GrammarArena::new();
    let b = GrammarBuilder::new(&arena);
    let rule = b.repeat(
        "spaces",
        b.token("whitespace", TokenRule::OptionalSpace),
        0,
        0,
        None,
    );
    b.finish().expect("grammar is valid");
    match run(rule, &mut tokenize("x"), false) {
        Err(ParseError::Internal { reason, .. }) => {
            assert!(reason.contains("matched empty input"), "{}", reason)
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn grammar_errors() {
    let arena = GrammarArena::new();
    let b = GrammarBuilder::new(&arena);
    b.forward("a dangling rule");
    assert_eq!(
        b.finish(),
        Err(GrammarError::Unresolved("a dangling rule".into()))
    );

    let arena = GrammarArena::new();
    let b = GrammarBuilder::new(&arena);
    let word = b.keyword("x");
    b.repeat("xs", word, 3, 2, None);
    assert_eq!(
        b.finish(),
        Err(GrammarError::InvalidBounds {
            rule: "xs".into(),
            min: 3,
            max: 2,
        })
    );

    let arena = GrammarArena::new();
    let b = GrammarBuilder::new(&arena);
    let fwd = b.forward("x");
    let word = b.keyword("x");
    assert_eq!(b.resolve(fwd, word), Ok(()));
    assert_eq!(
        b.resolve(fwd, word),
        Err(GrammarError::AlreadyResolved("x".into()))
    );
    assert_eq!(
        b.resolve(word, word),
        Err(GrammarError::NotForward("keyword `x`".into()))
    );
    let cyclic = b.forward("cycle");
    assert_eq!(b.resolve(cyclic, cyclic), Ok(()));
    assert_eq!(
        b.finish(),
        Err(GrammarError::ForwardCycle("cycle".into()))
    );
}
