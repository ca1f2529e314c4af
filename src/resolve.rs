// Copyright (c) 2016-2021 Fabian Schuiki

//! Resolution of file lists into the files they describe.
//!
//! A `Resolver` walks the statements of a parsed file list. Conditionals are
//! evaluated against a set of build variables and only the first branch whose
//! condition holds is visited. Include statements are followed into the
//! referenced file lists, which are parsed with the same grammar. All paths
//! are relative to a common root directory.

use crate::common::errors::{DiagBuilder2, DiagEmitter, DiagResult2};
use crate::common::source::{get_source_manager, Source};
use crate::common::util::HasDesc;
use crate::common::Session;
use crate::files::ast::*;
use crate::files::Grammar;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The value of a build variable or an evaluated expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl Value {
    /// Interpret the textual value of a variable definition. Integers and the
    /// words `true` and `false` are recognized, everything else is a string.
    pub fn parse(text: &str) -> Value {
        if let Ok(value) = text.parse() {
            Value::Integer(value)
        } else if text.eq_ignore_ascii_case("true") {
            Value::Boolean(true)
        } else if text.eq_ignore_ascii_case("false") {
            Value::Boolean(false)
        } else {
            Value::String(text.to_string())
        }
    }
}

impl HasDesc for Value {
    fn desc(&self) -> &'static str {
        match *self {
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
        }
    }

    fn desc_full(&self) -> String {
        format!("{} `{}`", self.desc(), self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::String(ref v) => write!(f, "\"{}\"", v),
            Value::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// The build variables conditions are evaluated against.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, Value>,
}

impl Variables {
    pub fn new() -> Variables {
        Default::default()
    }

    /// Set a variable, returning its previous value.
    pub fn set<S: Into<String>>(&mut self, name: S, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    /// Look up a variable. Names are case-sensitive.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Apply a definition of the form `NAME=VALUE`. A lone `NAME` sets the
    /// variable to `true`.
    pub fn define(&mut self, definition: &str) -> DiagResult2<()> {
        let (name, value) = match definition.find('=') {
            Some(index) => (
                &definition[..index],
                Value::parse(&definition[index + 1..]),
            ),
            None => (definition, Value::Boolean(true)),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(DiagBuilder2::error(format!(
                "variable definition `{}` has no name",
                definition
            ))
            .add_note("Variables are defined as `NAME=VALUE`"));
        }
        debug!("defining {} = {}", name, value);
        self.set(name, value);
        Ok(())
    }
}

/// The files described by a file list and everything it includes, in order
/// of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileSet {
    pub libraries: Vec<LibraryReference>,
    pub vhdl_files: Vec<VhdlFile>,
    pub verilog_files: Vec<VerilogFile>,
    /// The file lists named by include statements.
    pub includes: Vec<PathBuf>,
}

/// A VHDL source file and the library it is compiled into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VhdlFile {
    pub library: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerilogFile {
    pub path: PathBuf,
}

/// A precompiled library located in a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryReference {
    pub name: String,
    pub path: PathBuf,
}

/// Walks file lists and collects the files they describe.
pub struct Resolver<'a, 'g> {
    sess: &'a Session,
    grammar: &'a Grammar<'g>,
    variables: &'a Variables,
    root: PathBuf,
    /// The file lists currently being resolved, outermost first.
    stack: Vec<Source>,
    files: FileSet,
}

impl<'a, 'g> Resolver<'a, 'g> {
    /// Create a new resolver. Paths in file lists are relative to `root`.
    pub fn new<P: Into<PathBuf>>(
        sess: &'a Session,
        grammar: &'a Grammar<'g>,
        variables: &'a Variables,
        root: P,
    ) -> Resolver<'a, 'g> {
        Resolver {
            sess,
            grammar,
            variables,
            root: root.into(),
            stack: Vec::new(),
            files: FileSet::default(),
        }
    }

    /// Open, parse, and resolve the file list at `path`. The path is used as
    /// given and not made relative to the root directory.
    pub fn resolve_path<P: AsRef<Path>>(&mut self, path: P) -> DiagResult2<()> {
        let path = path.as_ref();
        match get_source_manager().open(path) {
            Some(src) => self.resolve_source(src),
            None => Err(DiagBuilder2::error(format!(
                "cannot open file list `{}`",
                path.display()
            ))),
        }
    }

    /// Parse and resolve a file list.
    pub fn resolve_source(&mut self, src: Source) -> DiagResult2<()> {
        self.check_cycle(src)?;
        let doc = self.grammar.parse_source(self.sess, src)?;
        self.resolve_document(src, &doc)
    }

    /// Resolve a file list that has already been parsed from `src`.
    pub fn resolve_document(&mut self, src: Source, doc: &Document) -> DiagResult2<()> {
        self.check_cycle(src)?;
        debug!("resolving {}", src);
        self.stack.push(src);
        let result = self.resolve_body(src, &doc.statements);
        self.stack.pop();
        result
    }

    /// Consume the resolver and return the files collected so far.
    pub fn finish(self) -> FileSet {
        self.files
    }

    fn check_cycle(&self, src: Source) -> DiagResult2<()> {
        if !self.stack.contains(&src) {
            return Ok(());
        }
        let mut d = DiagBuilder2::error(format!("file list `{}` includes itself", src));
        for outer in self.stack.iter().rev() {
            d = d.add_note(format!("included from `{}`", outer));
            if *outer == src {
                break;
            }
        }
        Err(d)
    }

    fn resolve_body(&mut self, src: Source, body: &[Statement]) -> DiagResult2<()> {
        for stmt in body {
            match *stmt {
                Statement::Empty | Statement::Comment(_) => (),
                Statement::Include(ref path) => self.include(src, path)?,
                Statement::Library { ref name, ref path } => {
                    self.files.libraries.push(LibraryReference {
                        name: name.clone(),
                        path: self.root.join(path),
                    })
                }
                Statement::VhdlSource {
                    ref library,
                    ref path,
                } => self.files.vhdl_files.push(VhdlFile {
                    library: library.clone(),
                    path: self.root.join(path),
                }),
                Statement::VerilogSource(ref path) => self.files.verilog_files.push(VerilogFile {
                    path: self.root.join(path),
                }),
                Statement::Conditional(ref cond) => {
                    if let Some(body) = self.select(src, cond)? {
                        self.resolve_body(src, body)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn include(&mut self, from: Source, path: &str) -> DiagResult2<()> {
        let path = self.root.join(path);
        self.files.includes.push(path.clone());
        if !self.sess.opts.follow_includes {
            debug!("not following include of `{}`", path.display());
            return Ok(());
        }
        debug!("including `{}` from {}", path.display(), from);
        match get_source_manager().open(&path) {
            Some(src) => self.resolve_source(src),
            None => Err(DiagBuilder2::error(format!(
                "cannot open included file list `{}`",
                path.display()
            ))
            .add_note(format!("included from `{}`", from))),
        }
    }

    /// Pick the body of the first clause whose condition holds.
    fn select<'c>(&self, src: Source, cond: &'c Conditional) -> DiagResult2<Option<&'c [Statement]>> {
        let clauses = std::iter::once(&cond.if_clause).chain(cond.elseif_clauses.iter());
        for clause in clauses {
            if self.condition(src, &clause.condition)? {
                debug!("taking branch `{}`", clause.condition);
                return Ok(Some(&clause.body));
            }
        }
        if cond.else_clause.is_some() {
            debug!("taking else branch of `{}`", cond.if_clause.condition);
        }
        Ok(cond.else_clause.as_ref().map(|c| c.body.as_slice()))
    }

    fn condition(&self, src: Source, expr: &Expression) -> DiagResult2<bool> {
        match self.evaluate(src, expr)? {
            Value::Boolean(v) => Ok(v),
            v => Err(DiagBuilder2::error(format!(
                "condition `{}` is {}, not a boolean",
                expr,
                v.desc_full()
            ))
            .add_note(format!("in `{}`", src))),
        }
    }

    /// Evaluate an expression against the build variables.
    pub fn evaluate(&self, src: Source, expr: &Expression) -> DiagResult2<Value> {
        match *expr {
            Expression::Identifier(ref name) => {
                Ok(self.lookup(src, name)?.unwrap_or(Value::Boolean(false)))
            }
            Expression::Integer(v) => Ok(Value::Integer(v)),
            Expression::String(ref v) => Ok(Value::String(v.clone())),
            Expression::Not(ref arg) => match self.evaluate(src, arg)? {
                Value::Boolean(v) => Ok(Value::Boolean(!v)),
                v => Err(DiagBuilder2::error(format!(
                    "`not` cannot be applied to {}",
                    v.desc_full()
                ))
                .add_note(format!("in expression `{}` in `{}`", expr, src))),
            },
            Expression::Binary(op, ref lhs, ref rhs) => {
                let lhs = self.operand(src, lhs)?;
                let rhs = self.operand(src, rhs)?;
                let result = match (op, lhs, rhs) {
                    // An unknown variable equals no value at all.
                    (BinaryOp::Equal, None, _) | (BinaryOp::Equal, _, None) => {
                        Ok(Value::Boolean(false))
                    }
                    (BinaryOp::Unequal, None, _) | (BinaryOp::Unequal, _, None) => {
                        Ok(Value::Boolean(true))
                    }
                    (op, lhs, rhs) => apply(
                        op,
                        &lhs.unwrap_or(Value::Boolean(false)),
                        &rhs.unwrap_or(Value::Boolean(false)),
                    ),
                };
                result.map_err(|d| d.add_note(format!("in expression `{}` in `{}`", expr, src)))
            }
        }
    }

    /// Evaluate the operand of a binary expression. Yields `None` for an
    /// unknown variable if those are tolerated.
    fn operand(&self, src: Source, expr: &Expression) -> DiagResult2<Option<Value>> {
        match *expr {
            Expression::Identifier(ref name) => self.lookup(src, name),
            _ => self.evaluate(src, expr).map(Some),
        }
    }

    fn lookup(&self, src: Source, name: &str) -> DiagResult2<Option<Value>> {
        if let Some(value) = self.variables.get(name) {
            return Ok(Some(value.clone()));
        }
        if name.eq_ignore_ascii_case("true") {
            return Ok(Some(Value::Boolean(true)));
        }
        if name.eq_ignore_ascii_case("false") {
            return Ok(Some(Value::Boolean(false)));
        }
        let message = format!("unknown variable `{}`", name);
        let note = format!("referenced in `{}`", src);
        if self.sess.opts.strict_variables {
            Err(DiagBuilder2::error(message).add_note(note))
        } else {
            self.sess.emit(
                DiagBuilder2::warning(message)
                    .add_note(note)
                    .add_note("The variable compares unequal to every value and is false otherwise"),
            );
            Ok(None)
        }
    }
}

/// Apply a binary operator to two values.
fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> DiagResult2<Value> {
    let result = match (op, lhs, rhs) {
        (BinaryOp::Equal, l, r) if same_kind(l, r) => l == r,
        (BinaryOp::Unequal, l, r) if same_kind(l, r) => l != r,
        (BinaryOp::Less, &Value::Integer(l), &Value::Integer(r)) => l < r,
        (BinaryOp::LessEqual, &Value::Integer(l), &Value::Integer(r)) => l <= r,
        (BinaryOp::Greater, &Value::Integer(l), &Value::Integer(r)) => l > r,
        (BinaryOp::GreaterEqual, &Value::Integer(l), &Value::Integer(r)) => l >= r,
        (BinaryOp::And, &Value::Boolean(l), &Value::Boolean(r)) => l && r,
        (BinaryOp::Or, &Value::Boolean(l), &Value::Boolean(r)) => l || r,
        (BinaryOp::Xor, &Value::Boolean(l), &Value::Boolean(r)) => l ^ r,
        _ => {
            let required = if op.is_logical() {
                "booleans"
            } else if op == BinaryOp::Equal || op == BinaryOp::Unequal {
                "values of the same kind"
            } else {
                "integers"
            };
            return Err(DiagBuilder2::error(format!(
                "`{}` cannot be applied to {} and {}",
                op,
                lhs.desc_full(),
                rhs.desc_full()
            ))
            .add_note(format!("`{}` requires {}", op, required)));
        }
    };
    Ok(Value::Boolean(result))
}

fn same_kind(lhs: &Value, rhs: &Value) -> bool {
    std::mem::discriminant(lhs) == std::mem::discriminant(rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SessionOptions;
    use crate::files::GrammarArena;

    fn add(path: &str, content: &str) -> Source {
        get_source_manager().add(path, content)
    }

    fn resolve(sess: &Session, vars: &Variables, root: &str, top: &str) -> DiagResult2<FileSet> {
        let arena = GrammarArena::new();
        let grammar = match Grammar::build(&arena) {
            Ok(g) => g,
            Err(e) => panic!("{}", e),
        };
        let mut resolver = Resolver::new(sess, &grammar, vars, root);
        resolver.resolve_path(Path::new(root).join(top))?;
        Ok(resolver.finish())
    }

    fn vhdl(library: &str, path: &str) -> VhdlFile {
        VhdlFile {
            library: library.into(),
            path: path.into(),
        }
    }

    #[test]
    fn values() {
        assert_eq!(Value::parse("42"), Value::Integer(42));
        assert_eq!(Value::parse("-3"), Value::Integer(-3));
        assert_eq!(Value::parse("TRUE"), Value::Boolean(true));
        assert_eq!(Value::parse("false"), Value::Boolean(false));
        assert_eq!(Value::parse("Xilinx"), Value::String("Xilinx".into()));
        assert_eq!(Value::parse(""), Value::String("".into()));
        assert_eq!(Value::String("a".into()).desc_full(), "string `\"a\"`");
    }

    #[test]
    fn definitions() {
        let mut vars = Variables::new();
        assert!(vars.define("Vendor=Xilinx").is_ok());
        assert!(vars.define("Speed=2").is_ok());
        assert!(vars.define("Sim").is_ok());
        assert!(vars.define("=3").is_err());
        assert_eq!(vars.get("Vendor"), Some(&Value::String("Xilinx".into())));
        assert_eq!(vars.get("Speed"), Some(&Value::Integer(2)));
        assert_eq!(vars.get("Sim"), Some(&Value::Boolean(true)));
        assert_eq!(vars.get("vendor"), None);
    }

    #[test]
    fn statements_and_includes() {
        add(
            "resolve-basic/top.files",
            "# top\nlibrary osvvm \"lib/osvvm\"\nvhdl poc \"src/a.vhdl\"\ninclude \"sub.files\"\nverilog \"src/c.v\"\n",
        );
        add("resolve-basic/sub.files", "vhdl poc \"src/b.vhdl\"\n");
        let sess = Session::new();
        let set = resolve(&sess, &Variables::new(), "resolve-basic", "top.files").unwrap();
        assert_eq!(
            set.libraries,
            vec![LibraryReference {
                name: "osvvm".into(),
                path: "resolve-basic/lib/osvvm".into(),
            }]
        );
        assert_eq!(
            set.vhdl_files,
            vec![
                vhdl("poc", "resolve-basic/src/a.vhdl"),
                vhdl("poc", "resolve-basic/src/b.vhdl"),
            ]
        );
        assert_eq!(
            set.verilog_files,
            vec![VerilogFile {
                path: "resolve-basic/src/c.v".into()
            }]
        );
        assert_eq!(set.includes, vec![PathBuf::from("resolve-basic/sub.files")]);
        assert!(!sess.failed());
    }

    #[test]
    fn first_true_branch() {
        add(
            "resolve-branch/top.files",
            "if (Vendor = \"Xilinx\") then\n\
             \x20 vhdl poc \"xil.vhdl\"\n\
             elseif (Speed >= 2) then\n\
             \x20 vhdl poc \"fast.vhdl\"\n\
             elseif (Speed >= 1) then\n\
             \x20 vhdl poc \"medium.vhdl\"\n\
             else\n\
             \x20 vhdl poc \"slow.vhdl\"\n\
             end if\n",
        );
        let sess = Session::new();
        let run = |vendor: &str, speed: i64| {
            let mut vars = Variables::new();
            vars.set("Vendor", Value::String(vendor.into()));
            vars.set("Speed", Value::Integer(speed));
            resolve(&sess, &vars, "resolve-branch", "top.files")
                .unwrap()
                .vhdl_files
        };
        assert_eq!(run("Xilinx", 3), vec![vhdl("poc", "resolve-branch/xil.vhdl")]);
        assert_eq!(run("Altera", 3), vec![vhdl("poc", "resolve-branch/fast.vhdl")]);
        assert_eq!(run("Altera", 1), vec![vhdl("poc", "resolve-branch/medium.vhdl")]);
        assert_eq!(run("xilinx", 0), vec![vhdl("poc", "resolve-branch/slow.vhdl")]);
    }

    #[test]
    fn logic_and_constants() {
        add(
            "resolve-logic/top.files",
            "if ((Sim = true) and not (Tool = \"GHDL\")) then\n\
             \x20 vhdl sim \"a.vhdl\"\n\
             end if\n\
             if (Sim xor false) then\n\
             \x20 vhdl sim \"b.vhdl\"\n\
             end if\n",
        );
        let sess = Session::new();
        let mut vars = Variables::new();
        vars.set("Sim", Value::Boolean(true));
        vars.set("Tool", Value::String("GHDL".into()));
        let set = resolve(&sess, &vars, "resolve-logic", "top.files").unwrap();
        assert_eq!(set.vhdl_files, vec![vhdl("sim", "resolve-logic/b.vhdl")]);
    }

    #[test]
    fn include_cycle() {
        add("resolve-cycle/a.files", "include \"b.files\"\n");
        add("resolve-cycle/b.files", "include \"a.files\"\n");
        let sess = Session::new();
        let err = resolve(&sess, &Variables::new(), "resolve-cycle", "a.files").unwrap_err();
        assert!(err.message.contains("includes itself"), "{}", err.message);
        assert_eq!(err.segments.len(), 2);
    }

    #[test]
    fn missing_include() {
        add("resolve-missing/top.files", "include \"nope.files\"\n");
        let sess = Session::new();
        let err = resolve(&sess, &Variables::new(), "resolve-missing", "top.files").unwrap_err();
        assert!(err.message.contains("nope.files"), "{}", err.message);
    }

    #[test]
    fn includes_not_followed() {
        add("resolve-nofollow/top.files", "include \"nope.files\"\nvhdl poc \"a.vhdl\"\n");
        let sess = Session::with_options(SessionOptions {
            follow_includes: false,
            ..Default::default()
        });
        let set = resolve(&sess, &Variables::new(), "resolve-nofollow", "top.files").unwrap();
        assert_eq!(set.includes, vec![PathBuf::from("resolve-nofollow/nope.files")]);
        assert_eq!(set.vhdl_files.len(), 1);
    }

    #[test]
    fn unknown_variables() {
        add(
            "resolve-unknown/top.files",
            "if (Board = \"KC705\") then\nvhdl poc \"kc705.vhdl\"\nelse\nvhdl poc \"other.vhdl\"\nend if\n",
        );
        let sess = Session::new();
        let err = resolve(&sess, &Variables::new(), "resolve-unknown", "top.files").unwrap_err();
        assert_eq!(err.message, "unknown variable `Board`");

        let sess = Session::with_options(SessionOptions {
            strict_variables: false,
            ..Default::default()
        });
        let set = resolve(&sess, &Variables::new(), "resolve-unknown", "top.files").unwrap();
        assert_eq!(set.vhdl_files, vec![vhdl("poc", "resolve-unknown/other.vhdl")]);
        assert!(!sess.failed());
    }

    #[test]
    fn lenient_unknown_variables() {
        add(
            "resolve-lenient/top.files",
            "if Board then\n\
             \x20 vhdl poc \"board.vhdl\"\n\
             end if\n\
             if (\"KC705\" != Board) then\n\
             \x20 vhdl poc \"generic.vhdl\"\n\
             end if\n\
             if (not Sim or (Speed = 2)) then\n\
             \x20 vhdl poc \"fallback.vhdl\"\n\
             end if\n",
        );
        add("resolve-lenient/cmp.files", "if (Speed < 2) then\nend if\n");
        let sess = Session::with_options(SessionOptions {
            strict_variables: false,
            ..Default::default()
        });
        let set = resolve(&sess, &Variables::new(), "resolve-lenient", "top.files").unwrap();
        assert_eq!(
            set.vhdl_files,
            vec![
                vhdl("poc", "resolve-lenient/generic.vhdl"),
                vhdl("poc", "resolve-lenient/fallback.vhdl"),
            ]
        );
        let err = resolve(&sess, &Variables::new(), "resolve-lenient", "cmp.files").unwrap_err();
        assert_eq!(
            err.message,
            "`<` cannot be applied to boolean `false` and integer `2`"
        );
        assert!(!sess.failed());
    }

    #[test]
    fn type_errors() {
        add("resolve-types/cmp.files", "if (Vendor < 2) then\nend if\n");
        add("resolve-types/cond.files", "if Speed then\nend if\n");
        add("resolve-types/eq.files", "if (Speed = \"2\") then\nend if\n");
        let sess = Session::new();
        let mut vars = Variables::new();
        vars.set("Vendor", Value::String("Xilinx".into()));
        vars.set("Speed", Value::Integer(2));
        for &(file, expected) in &[
            ("cmp.files", "`<` cannot be applied to string `\"Xilinx\"` and integer `2`"),
            ("cond.files", "condition `Speed` is integer `2`, not a boolean"),
            ("eq.files", "`=` cannot be applied to integer `2` and string `\"2\"`"),
        ] {
            let err = resolve(&sess, &vars, "resolve-types", file).unwrap_err();
            assert_eq!(err.message, expected);
        }
    }

    #[test]
    fn parse_errors_point_into_the_file() {
        let src = add("resolve-syntax/top.files", "vhdl poc \"a.vhdl\"\nvhdl \"b.vhdl\"\n");
        let sess = Session::new();
        let err = resolve(&sess, &Variables::new(), "resolve-syntax", "top.files").unwrap_err();
        assert_eq!(err.message, "expected a library name, found `\"`");
        match err.segments.as_slice() {
            [crate::common::errors::DiagSegment::Location(loc)] => {
                assert_eq!(loc.source, src);
                assert_eq!((loc.position.row, loc.position.column), (2, 6));
            }
            other => panic!("unexpected segments {:?}", other),
        }
    }
}
