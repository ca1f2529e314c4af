// Copyright (c) 2016-2021 Fabian Schuiki

//! This crate contains the fundamental utilities used by the rest of the PoC
//! file list tooling: source file management, diagnostics, and the grinder
//! pipeline abstraction.

pub mod errors;
pub mod grind;
pub mod source;
pub mod util;

use crate::errors::{DiagBuilder2, DiagEmitter, Severity};
use std::cell::Cell;

/// Central book-keeping of a file list processing run.
pub struct Session {
    pub opts: SessionOptions,
    /// Whether any error diagnostics were produced.
    pub failed: Cell<bool>,
}

impl Session {
    /// Create a new session.
    pub fn new() -> Session {
        Session {
            opts: Default::default(),
            failed: Cell::new(false),
        }
    }

    /// Create a new session with the given options.
    pub fn with_options(opts: SessionOptions) -> Session {
        Session {
            opts,
            failed: Cell::new(false),
        }
    }

    /// Check whether an error has been emitted.
    pub fn failed(&self) -> bool {
        self.failed.get()
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

impl DiagEmitter for Session {
    fn emit(&self, diag: DiagBuilder2) {
        if diag.severity >= Severity::Error {
            self.failed.set(true);
        }
        eprintln!("{}", diag);
    }
}

/// A set of options for a session.
///
/// The arguments passed on the command line are intended to modify these
/// values in order to configure the execution of the program.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Follow `include` statements and resolve the referenced file lists.
    pub follow_includes: bool,
    /// Treat references to undefined variables as errors. If disabled, they
    /// produce a warning, compare unequal to every value, and are false
    /// otherwise.
    pub strict_variables: bool,
    /// Print every token consumed by the parser.
    pub trace_tokens: bool,
}

impl Default for SessionOptions {
    fn default() -> SessionOptions {
        SessionOptions {
            follow_includes: true,
            strict_variables: true,
            trace_tokens: false,
        }
    }
}
