// Copyright (c) 2016-2021 Fabian Schuiki

//! This module defines the tokens produced by the file list tokenizer.

use poc_common::source::SourcePosition;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// A token together with the positions of its first and last character.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

/// The different kinds of tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// A run of spaces and tabs.
    Space(String),
    /// A single character that is neither a space, a letter, nor a digit.
    /// Line feeds and carriage returns are delimiters.
    Delimiter(char),
    /// A run of letters.
    Word(String),
    /// A run of decimal digits.
    Number(String),
    /// The synthetic token appended after the last character of the input.
    End,
}

impl Token {
    pub fn new(kind: TokenKind, start: SourcePosition, end: SourcePosition) -> Token {
        Token { kind, start, end }
    }

    /// Create the end-of-input token located at `position`.
    pub fn end(position: SourcePosition) -> Token {
        Token {
            kind: TokenKind::End,
            start: position,
            end: position,
        }
    }

    /// The number of characters covered by this token.
    pub fn length(&self) -> usize {
        match self.kind {
            TokenKind::End => 0,
            _ => self.end.absolute - self.start.absolute + 1,
        }
    }

    /// The characters covered by this token.
    pub fn text(&self) -> Cow<str> {
        match self.kind {
            TokenKind::Space(ref s) | TokenKind::Word(ref s) | TokenKind::Number(ref s) => {
                Cow::Borrowed(s.as_str())
            }
            TokenKind::Delimiter(c) => Cow::Owned(c.to_string()),
            TokenKind::End => Cow::Borrowed(""),
        }
    }

    /// Check whether this is a word token matching `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        match self.kind {
            TokenKind::Word(ref w) => w.eq_ignore_ascii_case(keyword),
            _ => false,
        }
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TokenKind::Space(_) => write!(f, "whitespace"),
            TokenKind::Delimiter('\n') => write!(f, "end of line"),
            TokenKind::Delimiter('\r') => write!(f, "carriage return"),
            TokenKind::Delimiter(c) => write!(f, "`{}`", c),
            TokenKind::Word(ref w) => write!(f, "`{}`", w),
            TokenKind::Number(ref n) => write!(f, "number `{}`", n),
            TokenKind::End => write!(f, "end of input"),
        }
    }
}
