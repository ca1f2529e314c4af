// Copyright (c) 2016-2021 Fabian Schuiki

use crate::lexer::categorizer::Category;
use crate::lexer::token::{Token, TokenKind};
use poc_common::errors::DiagBuilder2;
use poc_common::grind::{Grinder, Peekable};
use poc_common::source::{Location, Source, SourcePosition};

/// A grinder that bundles runs of categorized characters into tokens and
/// stamps each token with the position of its first and last character.
pub struct Tokenizer<T: Grinder> {
    inner: Peekable<T>,
    /// The file warnings point into.
    source: Source,
    row: usize,
    column: usize,
    absolute: usize,
}

impl<T> Tokenizer<T>
where
    T: Grinder<Item = Option<(char, Category)>, Error = DiagBuilder2>,
{
    /// Create a new tokenizer for the characters of `source`.
    pub fn new(inner: T, source: Source) -> Tokenizer<T> {
        Tokenizer {
            inner: inner.peekable(),
            source,
            row: 1,
            column: 0,
            absolute: 0,
        }
    }

    /// The position the next character would be stamped with.
    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.row, self.column + 1, self.absolute + 1)
    }

    /// Advance over a character and return its position.
    fn advance(&mut self, c: char) -> SourcePosition {
        self.absolute += 1;
        self.column += 1;
        let pos = SourcePosition::new(self.row, self.column, self.absolute);
        if c == '\n' {
            self.column = 0;
            self.row += 1;
        }
        pos
    }

    /// Warn about delimiters that are most likely accidents, such as control
    /// characters or a carriage return that does not end a line.
    fn check_delimiter(&mut self, c: char, at: SourcePosition) {
        let message = match c {
            '\n' => return,
            '\r' => match *self.inner.peek() {
                Some(('\n', _)) => return,
                _ => "carriage return without a line feed".to_string(),
            },
            c if c.is_control() => format!("control character U+{:04X} in file list", c as u32),
            _ => return,
        };
        self.emit(DiagBuilder2::warning(message).location(Location::new(self.source, at)));
    }
}

impl<T> Grinder for Tokenizer<T>
where
    T: Grinder<Item = Option<(char, Category)>, Error = DiagBuilder2>,
{
    type Item = Option<Token>;
    type Error = DiagBuilder2;

    fn emit(&mut self, err: Self::Error) {
        self.inner.emit(err);
    }

    fn next(&mut self) -> Self::Item {
        let (c, cat) = self.inner.next()?;
        let start = self.advance(c);
        if cat == Category::Other {
            self.check_delimiter(c, start);
            return Some(Token::new(TokenKind::Delimiter(c), start, start));
        }

        // Bundle all subsequent characters of the same category.
        let mut text = String::new();
        text.push(c);
        let mut end = start;
        while let Some((c, next)) = *self.inner.peek() {
            if next != cat {
                break;
            }
            self.inner.next();
            text.push(c);
            end = self.advance(c);
        }

        let kind = match cat {
            Category::Space => TokenKind::Space(text),
            Category::Letter => TokenKind::Word(text),
            Category::Digit => TokenKind::Number(text),
            Category::Other => unreachable!(),
        };
        Some(Token::new(kind, start, end))
    }
}
