//! Bagel: a front end for a small typed scripting language.
//!
//! The heavy lifting lives in the workspace crates: `bagel-ast` parses,
//! `bagel-check` resolves names, infers types and checks modules. This crate
//! wires them into salsa queries and a command-line driver.

pub mod diagnostics;
pub mod driver;
pub mod pipeline;

pub use bagel_ast::{Module, Node, NodeId, NodeKind, parse_module};
pub use bagel_check::{BagelError, Binding, Type};
pub use bagel_core::{
    BagelDatabaseImpl, Db, Diagnostic, DiagnosticKind, DiagnosticSeverity, SourceFile, Span,
};
pub use pipeline::{DbLoader, check_file, check_with_diagnostics, node_type};
