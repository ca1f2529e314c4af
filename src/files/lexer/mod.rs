// Copyright (c) 2016-2021 Fabian Schuiki

//! A file list lexer. This module converts the characters of a file list into
//! a stream of coarse tokens: runs of whitespace, words, and numbers, as well
//! as single delimiter characters. Every character of the input ends up in
//! exactly one token. Suspicious characters produce warnings, which the
//! lexer collects until they are taken with `take_diagnostics`.

pub mod categorizer;
pub mod token;
pub mod tokenizer;

use self::categorizer::Categorizer;
use self::token::Token;
use self::tokenizer::Tokenizer;
use poc_common::errors::DiagBuilder2;
use poc_common::grind::{self, Grinder, Iter, Vent};
use poc_common::source::{Source, SourcePosition, INVALID_SOURCE};
use std::cell::RefCell;
use std::rc::Rc;
use std::str::Chars;

type Chain<'a> = Vent<Iter<Chars<'a>>, Box<dyn Fn(DiagBuilder2) + 'a>, DiagBuilder2>;

/// A file list lexer. Lazily converts a string into tokens.
pub struct Lexer<'a> {
    inner: Tokenizer<Categorizer<Chain<'a>>>,
    diagnostics: Rc<RefCell<Vec<DiagBuilder2>>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for text that does not belong to a source file.
    pub fn new(text: &'a str) -> Lexer<'a> {
        Lexer::with_source(text, INVALID_SOURCE)
    }

    /// Create a new lexer for the content of `source`. Warnings point into
    /// the source.
    pub fn with_source(text: &'a str, source: Source) -> Lexer<'a> {
        let diagnostics = Rc::new(RefCell::new(Vec::new()));
        let sink = diagnostics.clone();
        let vent: Box<dyn Fn(DiagBuilder2) + 'a> =
            Box::new(move |diag: DiagBuilder2| sink.borrow_mut().push(diag));
        let chars: Chain<'a> = grind::from_iter(text.chars()).vent(vent);
        let cat = Categorizer::new(chars);
        let tokens = Tokenizer::new(cat, source);
        Lexer {
            inner: tokens,
            diagnostics,
        }
    }

    /// Take the warnings produced for the tokens lexed so far.
    pub fn take_diagnostics(&self) -> Vec<DiagBuilder2> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }

    /// The position right after the last character consumed so far. Once the
    /// lexer is exhausted, this is where the end-of-input token sits.
    pub fn end_position(&self) -> SourcePosition {
        self.inner.position()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        Grinder::next(&mut self.inner)
    }
}

/// Convert a string into tokens.
pub fn tokenize(text: &str) -> Lexer {
    Lexer::new(text)
}
