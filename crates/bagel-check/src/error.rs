//! Errors reported by the checking pass.

use bagel_ast::{BinaryOp, Node, UnaryOp};
use bagel_core::DiagnosticKind;
use derive_more::{Display, Error};

use crate::types::Type;

#[derive(Clone, Debug, PartialEq, Display, Error)]
pub enum BagelError {
    #[display("Type '{value}' is not assignable to type '{destination}'")]
    AssignableTo {
        node: Node,
        destination: Type,
        value: Type,
    },

    #[display("Couldn't find name '{name}'")]
    CannotFindName {
        node: Node,
        name: String,
    },

    #[display("'{name}' is already declared in this scope")]
    AlreadyDeclared {
        node: Node,
        name: String,
    },

    #[display("{problem}")]
    Misc {
        node: Node,
        problem: Problem,
    },

    #[display("Couldn't find module '{path}'")]
    CannotFindModule {
        node: Node,
        path: String,
    },

    #[display("Module '{path}' has no exported member named '{name}'")]
    CannotFindExport {
        node: Node,
        path: String,
        name: String,
    },
}

/// The rule behind a `misc` error.
#[derive(Clone, Debug, PartialEq, Display)]
pub enum Problem {
    #[display("'{_0}' is used before it is initialized")]
    UsedBeforeInitialization(String),

    #[display("'{_0}' is referenced in its own initializer")]
    UsedInOwnInitializer(String),

    #[display("Condition must be a boolean, but has type '{_0}'")]
    NonBooleanCondition(Type),

    #[display("Expected an iterator, but found type '{_0}'")]
    NotIterable(Type),

    #[display("Property '{property}' does not exist on type '{ty}'")]
    PropertyNotFound { property: String, ty: Type },

    #[display("Type '{base}' can't be indexed with type '{index}'")]
    InvalidIndexer { base: Type, index: Type },

    #[display("Cannot assign to '{_0}' because it is not mutable")]
    NotMutable(String),

    #[display("Invalid assignment target")]
    InvalidAssignmentTarget,

    #[display("Type '{_0}' is not callable")]
    NotCallable(Type),

    #[display("Expected {expected} arguments, but got {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[display("Expected {expected} type arguments, but got {found}")]
    TypeArgumentCount { expected: usize, found: usize },

    #[display("Operator '{op}' cannot be applied to types '{left}' and '{right}'")]
    OperatorMismatch { op: BinaryOp, left: Type, right: Type },

    #[display("Operator '{op}' cannot be applied to type '{operand}'")]
    UnaryOperatorMismatch { op: UnaryOp, operand: Type },

    #[display("Property '{_0}' is private to its store")]
    PrivateMember(String),

    #[display("Procs can't be called in an expression context")]
    ProcInExpression,

    #[display("Func results must be used; a func call can't be a statement")]
    FuncAsStatement,

    #[display("'this' can only be used inside a store")]
    ThisOutsideStore,
}

impl BagelError {
    pub fn node(&self) -> &Node {
        match self {
            BagelError::AssignableTo { node, .. }
            | BagelError::CannotFindName { node, .. }
            | BagelError::AlreadyDeclared { node, .. }
            | BagelError::Misc { node, .. }
            | BagelError::CannotFindModule { node, .. }
            | BagelError::CannotFindExport { node, .. } => node,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            BagelError::AssignableTo { .. } => DiagnosticKind::AssignableTo,
            BagelError::CannotFindName { .. } => DiagnosticKind::CannotFindName,
            BagelError::AlreadyDeclared { .. } => DiagnosticKind::AlreadyDeclared,
            BagelError::Misc { .. } => DiagnosticKind::Misc,
            BagelError::CannotFindModule { .. } => DiagnosticKind::CannotFindModule,
            BagelError::CannotFindExport { .. } => DiagnosticKind::CannotFindExport,
        }
    }

    pub(crate) fn misc(node: &Node, problem: Problem) -> Self {
        BagelError::Misc {
            node: node.clone(),
            problem,
        }
    }
}
