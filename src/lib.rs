// Copyright (c) 2016-2021 Fabian Schuiki

//! Build tooling for the PoC hardware IP library.
//!
//! File lists are parsed by the `files` crate and resolved into the set of
//! libraries and source files they describe by the `resolve` module.

// Re-export everything from the common crate.
pub extern crate poc_common as common;
pub use crate::common::*;

pub extern crate poc_files as files;

pub mod resolve;
