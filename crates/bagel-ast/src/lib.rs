//! Syntax tree for Bagel.
//!
//! A parsed file is a [`Module`]: an immutable arena of nodes addressed by
//! [`NodeId`], with parent links and a [`SpanMap`] beside it. [`Node`] pairs
//! an id with its module and is the handle the checker walks.

mod error;
mod kind;
pub mod lexer;
mod module;
mod node_id;
mod parser;
mod query;
mod span_map;

pub use error::ParseError;
pub use kind::{Access, BinaryOp, LiteralValue, Name, NodeKind, Primitive, UnaryOp};
pub use module::{Module, ModuleBuilder, Node, NodeData};
pub use node_id::NodeId;
pub use parser::parse;
pub use query::parse_module;
pub use span_map::{SpanMap, SpanMapBuilder};
