// Copyright (c) 2016-2021 Fabian Schuiki

//! A collection of utility traits shared by the file list crates.

#![deny(missing_docs)]

/// Describes syntax nodes and values in diagnostics.
pub trait HasDesc {
    /// Obtain a short name for the kind of this node, such as "integer".
    fn desc(&self) -> &'static str;

    /// Obtain a description that also shows the node's name or payload.
    /// Defaults to `desc()`.
    fn desc_full(&self) -> String {
        self.desc().into()
    }
}
