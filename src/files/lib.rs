// Copyright (c) 2016-2021 Fabian Schuiki

//! This crate implements the file list format of the PoC library. A file list
//! names the VHDL and Verilog sources of an IP core, the libraries they are
//! compiled into, and other file lists to include, optionally guarded by
//! conditions on build variables:
//!
//! ```text
//! # Sources of the FIFO
//! vhdl poc "src/fifo/fifo_cc_got.vhdl"
//! if (Vendor = "Xilinx") then
//!   include "src/xil/xil.files"
//! elseif (Vendor = "Altera") then
//!   include "src/alt/alt.files"
//! end if
//! ```
//!
//! The `lexer` turns text into tokens, the `parser` drives them through the
//! file list grammar, and the result is a `Document` as defined in `ast`.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use crate::ast::Document;
pub use crate::parser::{Grammar, GrammarArena, ParseError};
