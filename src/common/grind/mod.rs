// Copyright (c) 2016-2021 Fabian Schuiki

//! This module provides an abstraction similar to iterators. Elements are
//! produced in one direction, while errors bubble backwards until they are
//! vented. This allows transformation chains such as the file list tokenizer
//! to be constructed, where warnings or notices might be emitted without
//! disturbing the transformation.

use std::marker::PhantomData;

/// An element produced by a grinder, which may signal the end of the stream.
pub trait Chisel {
    fn is_end(&self) -> bool;
}

impl<T> Chisel for Option<T> {
    fn is_end(&self) -> bool {
        self.is_none()
    }
}

pub trait Grinder {
    type Item: Chisel;
    type Error;

    fn next(&mut self) -> Self::Item;
    fn emit(&mut self, err: Self::Error);

    #[inline]
    fn vent<F, E>(self, f: F) -> Vent<Self, F, E>
    where
        Self: Sized,
        F: Fn(E),
    {
        Vent {
            inner: self,
            ventfn: f,
            phantom: PhantomData,
        }
    }

    #[inline]
    fn peekable(self) -> Peekable<Self>
    where
        Self: Sized,
    {
        Peekable {
            inner: self,
            peeked: None,
        }
    }
}

/// A grinder that hands all emitted errors to a function.
pub struct Vent<T: Grinder, F, E> {
    inner: T,
    ventfn: F,
    phantom: PhantomData<E>,
}

impl<T: Grinder, E, F> Grinder for Vent<T, F, E>
where
    F: Fn(E),
{
    type Item = T::Item;
    type Error = E;

    fn next(&mut self) -> Self::Item {
        self.inner.next()
    }

    fn emit(&mut self, err: E) {
        (self.ventfn)(err)
    }
}

/// A grinder that holds back the next element so it can be inspected before
/// it is consumed.
pub struct Peekable<T: Grinder> {
    inner: T,
    peeked: Option<T::Item>,
}

impl<T: Grinder> Peekable<T> {
    /// The next element, without consuming it.
    pub fn peek(&mut self) -> &T::Item {
        let inner = &mut self.inner;
        self.peeked.get_or_insert_with(|| inner.next())
    }
}

impl<T: Grinder> Grinder for Peekable<T> {
    type Item = T::Item;
    type Error = T::Error;

    fn next(&mut self) -> Self::Item {
        match self.peeked.take() {
            Some(item) => item,
            None => self.inner.next(),
        }
    }

    fn emit(&mut self, err: Self::Error) {
        self.inner.emit(err)
    }
}

/// A grinder that produces the elements of an iterator. It cannot fail.
pub struct Iter<I: Iterator> {
    inner: I,
}

impl<I: Iterator> Grinder for Iter<I> {
    type Item = Option<I::Item>;
    type Error = ();

    fn next(&mut self) -> Option<I::Item> {
        self.inner.next()
    }

    fn emit(&mut self, _: ()) {}
}

pub fn from_iter<I: Iterator>(iter: I) -> Iter<I> {
    Iter { inner: iter }
}
