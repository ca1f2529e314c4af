// Copyright (c) 2016-2021 Fabian Schuiki

use poc_common::errors::DiagBuilder2;
use poc_common::grind::Grinder;

/// A grinder that categorizes characters into the groups the tokenizer bundles
/// into tokens.
pub struct Categorizer<T> {
    inner: T,
}

impl<T> Categorizer<T>
where
    T: Grinder<Item = Option<char>, Error = DiagBuilder2>,
{
    /// Create a new categorizer.
    pub fn new(inner: T) -> Categorizer<T> {
        Categorizer { inner: inner }
    }
}

impl<T> Grinder for Categorizer<T>
where
    T: Grinder<Item = Option<char>, Error = DiagBuilder2>,
{
    type Item = Option<(char, Category)>;
    type Error = DiagBuilder2;

    fn emit(&mut self, err: Self::Error) {
        self.inner.emit(err);
    }

    fn next(&mut self) -> Self::Item {
        let c = self.inner.next()?;
        Some((c, Category::of(c)))
    }
}

/// A character category. Runs of space, letter, and digit characters are
/// bundled into a single token. Every other character stands on its own.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Category {
    Space,
    Letter,
    Digit,
    Other,
}

impl Category {
    /// Determine the category of a character.
    pub fn of(c: char) -> Category {
        match c {
            ' ' | '\t' => Category::Space,
            c if c.is_alphabetic() => Category::Letter,
            c if c.is_ascii_digit() => Category::Digit,
            _ => Category::Other,
        }
    }
}
