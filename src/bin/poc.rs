// Copyright (c) 2016-2021 Fabian Schuiki

//! Parse and resolve PoC file lists.

use clap::{App, Arg, ArgMatches};
use log::{debug, LevelFilter};
use poc::errors::*;
use poc::files::lexer::Lexer;
use poc::files::{Grammar, GrammarArena};
use poc::resolve::{FileSet, Resolver, Variables};
use poc::source::{get_source_manager, Source};
use poc::*;

fn main() {
    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Parses and resolves the file lists of the PoC library.")
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help("Increase message verbosity"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .help("Silence all output"),
        )
        .arg(
            Arg::with_name("define")
                .short("D")
                .value_name("NAME=VALUE")
                .help("Define a variable for the conditions in file lists")
                .multiple(true)
                .takes_value(true)
                .number_of_values(1),
        )
        .arg(
            Arg::with_name("root")
                .long("root")
                .value_name("DIR")
                .help("Directory the paths in file lists are relative to")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("no_includes")
                .long("no-includes")
                .help("Do not follow include statements"),
        )
        .arg(
            Arg::with_name("lenient")
                .long("lenient")
                .help("Warn about undefined variables instead of failing"),
        )
        .arg(
            Arg::with_name("trace_tokens")
                .long("trace-tokens")
                .help("Log every token fed to the parser"),
        )
        .arg(
            Arg::with_name("dump_tokens")
                .long("dump-tokens")
                .help("Dump the tokens of the input files"),
        )
        .arg(
            Arg::with_name("dump_ast")
                .long("dump-ast")
                .help("Dump the parsed file lists"),
        )
        .arg(
            Arg::with_name("dump_json")
                .long("dump-json")
                .help("Dump the parsed file lists as JSON"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Print the resolved files as JSON"),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("The file lists to process")
                .multiple(true)
                .required(true),
        )
        .get_matches();

    // Configure the logger.
    let level = if matches.is_present("quiet") {
        LevelFilter::Off
    } else {
        match matches.occurrences_of("verbosity") {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    // Configure the session.
    let mut session = Session::new();
    session.opts.follow_includes = !matches.is_present("no_includes");
    session.opts.strict_variables = !matches.is_present("lenient");
    session.opts.trace_tokens = matches.is_present("trace_tokens");

    run(&session, &matches);
    if session.failed() {
        std::process::exit(1);
    }
}

fn run(sess: &Session, matches: &ArgMatches) {
    let mut variables = Variables::new();
    for definition in matches.values_of("define").into_iter().flatten() {
        if let Err(d) = variables.define(definition) {
            sess.emit(d);
        }
    }
    if sess.failed() {
        return;
    }

    let arena = GrammarArena::new();
    let grammar = match Grammar::build(&arena) {
        Ok(g) => g,
        Err(e) => {
            sess.emit(DiagBuilder2::bug(format!("invalid file list grammar: {}", e)));
            return;
        }
    };

    // Open the input files.
    let mut sources = Vec::new();
    for filename in matches.values_of("INPUT").into_iter().flatten() {
        match get_source_manager().open(filename) {
            Some(src) => sources.push(src),
            None => sess.emit(DiagBuilder2::error(format!(
                "unable to open input file `{}`",
                filename
            ))),
        }
    }

    let dump = ["dump_tokens", "dump_ast", "dump_json"]
        .iter()
        .any(|&flag| matches.is_present(flag));
    if dump {
        for &src in &sources {
            dump_source(sess, &grammar, matches, src);
        }
        return;
    }

    let root = matches.value_of("root").unwrap_or("");
    debug!("resolving {} file lists relative to `{}`", sources.len(), root);
    let mut resolver = Resolver::new(sess, &grammar, &variables, root);
    for &src in &sources {
        if let Err(d) = resolver.resolve_source(src) {
            sess.emit(d);
        }
    }
    if sess.failed() {
        return;
    }
    let files = resolver.finish();
    if matches.is_present("json") {
        match serde_json::to_string_pretty(&files) {
            Ok(json) => println!("{}", json),
            Err(e) => sess.emit(DiagBuilder2::bug(format!("cannot serialize file set: {}", e))),
        }
    } else {
        print_files(&files);
    }
}

fn dump_source(sess: &Session, grammar: &Grammar, matches: &ArgMatches, src: Source) {
    if matches.is_present("dump_tokens") {
        let content = src.get_content();
        let text = content.text();
        let mut lexer = Lexer::with_source(&text, src);
        for token in lexer.by_ref() {
            println!("{}-{}\t{:?}\t{}", token.start, token.end, token.kind, token);
        }
        for diag in lexer.take_diagnostics() {
            sess.emit(diag);
        }
    }
    if !matches.is_present("dump_ast") && !matches.is_present("dump_json") {
        return;
    }
    let doc = match grammar.parse_source(sess, src) {
        Ok(doc) => doc,
        Err(d) => return sess.emit(d),
    };
    if matches.is_present("dump_ast") {
        print!("{}", doc);
    }
    if matches.is_present("dump_json") {
        match serde_json::to_string_pretty(&doc) {
            Ok(json) => println!("{}", json),
            Err(e) => sess.emit(DiagBuilder2::bug(format!("cannot serialize {}: {}", src, e))),
        }
    }
}

fn print_files(files: &FileSet) {
    for lib in &files.libraries {
        println!("library {} {}", lib.name, lib.path.display());
    }
    for file in &files.vhdl_files {
        println!("vhdl {} {}", file.library, file.path.display());
    }
    for file in &files.verilog_files {
        println!("verilog {}", file.path.display());
    }
}
