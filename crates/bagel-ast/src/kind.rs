//! Node kinds of the Bagel AST.
//!
//! Children are referenced by [`NodeId`] into the owning module's arena, so a
//! kind is a flat, cheap-to-clone description of one node. Kinds fall into four
//! families: declarations, expressions, statements and type expressions.

use super::NodeId;

/// An identifier as written in source.
pub type Name = String;

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Root of every module.
    Module { declarations: Vec<NodeId> },

    // === Declarations ===
    /// `import { a, b as c } from './path'`
    ImportDeclaration { path: String, items: Vec<NodeId> },
    ImportItem { name: Name, alias: Option<Name> },
    /// `import './path' as alias`
    ImportAllDeclaration { path: String, alias: Name },
    /// `type Name<T> = ...` or `nominal type Name(T)`
    TypeDeclaration {
        name: Name,
        type_params: Vec<NodeId>,
        value: NodeId,
        nominal: bool,
        exported: bool,
    },
    FuncDeclaration {
        name: Name,
        func: NodeId,
        exported: bool,
    },
    ProcDeclaration {
        name: Name,
        proc: NodeId,
        exported: bool,
    },
    /// Module-level `const`/`let`.
    ValueDeclaration {
        name: Name,
        type_annotation: Option<NodeId>,
        value: NodeId,
        is_const: bool,
        exported: bool,
    },
    StoreDeclaration {
        name: Name,
        members: Vec<NodeId>,
        exported: bool,
    },
    StoreMember {
        access: Access,
        name: Name,
        type_annotation: Option<NodeId>,
        value: NodeId,
    },
    AutorunDeclaration { body: NodeId, forever: bool },
    TestExprDeclaration { name: String, expr: NodeId },
    TestBlockDeclaration { name: String, block: NodeId },

    // === Signature pieces ===
    GenericParam { name: Name, extends: Option<NodeId> },
    Param {
        name: Name,
        type_annotation: Option<NodeId>,
    },

    // === Expressions ===
    NumberLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    NilLiteral,
    /// Raw host-language code: `js# ... #js`
    JavascriptEscape(String),
    LocalIdentifier(Name),
    This,
    BinaryOperation {
        left: NodeId,
        op: BinaryOp,
        right: NodeId,
    },
    UnaryOperation { op: UnaryOp, operand: NodeId },
    Invocation {
        subject: NodeId,
        type_args: Vec<NodeId>,
        args: Vec<NodeId>,
    },
    /// `value |> function`
    Pipe { value: NodeId, function: NodeId },
    PropertyAccessor {
        subject: NodeId,
        property: Name,
        optional: bool,
    },
    IndexerAccess {
        subject: NodeId,
        index: NodeId,
        optional: bool,
    },
    Func {
        type_params: Vec<NodeId>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
    },
    Proc {
        type_params: Vec<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
    },
    IfElseExpression {
        cases: Vec<NodeId>,
        default: Option<NodeId>,
    },
    /// One `if`/`else if` arm, shared by the expression and statement forms.
    IfElseCase { condition: NodeId, outcome: NodeId },
    SwitchExpression {
        value: NodeId,
        cases: Vec<NodeId>,
        default: Option<NodeId>,
    },
    SwitchCase { test: NodeId, outcome: NodeId },
    ArrayLiteral(Vec<NodeId>),
    ObjectLiteral(Vec<NodeId>),
    ObjectEntry { key: Name, value: NodeId },
    Parenthesized(NodeId),
    /// `const name = value, body`
    InlineConst {
        name: Name,
        type_annotation: Option<NodeId>,
        value: NodeId,
        body: NodeId,
    },
    /// `start..end`
    Range { start: NodeId, end: NodeId },
    AsCast { inner: NodeId, type_expr: NodeId },

    // === Statements ===
    Block(Vec<NodeId>),
    DeclarationStatement {
        name: Name,
        type_annotation: Option<NodeId>,
        value: NodeId,
        is_const: bool,
    },
    Assignment { target: NodeId, value: NodeId },
    ExpressionStatement(NodeId),
    IfElseStatement {
        cases: Vec<NodeId>,
        default: Option<NodeId>,
    },
    ForLoop {
        item: Name,
        iterator: NodeId,
        body: NodeId,
    },
    WhileLoop { condition: NodeId, body: NodeId },

    // === Type expressions ===
    PrimitiveType(Primitive),
    LiteralType(LiteralValue),
    NamedType { name: Name, type_args: Vec<NodeId> },
    UnionType(Vec<NodeId>),
    ArrayType(NodeId),
    TupleType(Vec<NodeId>),
    ObjectType(Vec<NodeId>),
    ObjectTypeEntry {
        name: Name,
        optional: bool,
        value: NodeId,
    },
    IndexerType { key: NodeId, value: NodeId },
    FuncType {
        type_params: Vec<NodeId>,
        params: Vec<NodeId>,
        return_type: NodeId,
    },
    ProcType {
        type_params: Vec<NodeId>,
        params: Vec<NodeId>,
    },
    IteratorType(NodeId),
    PlanType(NodeId),
    ReadonlyType(NodeId),
    ParenthesizedType(NodeId),
}

/// Visibility of a store member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    /// Readable and writable anywhere.
    Public,
    /// Readable anywhere, writable only inside the store.
    Visible,
    /// Only reachable inside the store.
    Private,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Nil,
    Unknown,
    Any,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Eq,
    NotEq,
    And,
    Or,
    NullishCoalescing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::NullishCoalescing => "??",
        }
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::String(s) => write!(f, "'{s}'"),
            LiteralValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl NodeKind {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;

        let mut out = Vec::new();
        match self {
            Module { declarations } => out.extend(declarations),
            ImportDeclaration { items, .. } => out.extend(items),
            TypeDeclaration {
                type_params, value, ..
            } => {
                out.extend(type_params);
                out.push(*value);
            }
            FuncDeclaration { func, .. } => out.push(*func),
            ProcDeclaration { proc, .. } => out.push(*proc),
            ValueDeclaration {
                type_annotation,
                value,
                ..
            }
            | StoreMember {
                type_annotation,
                value,
                ..
            }
            | DeclarationStatement {
                type_annotation,
                value,
                ..
            } => {
                out.extend(type_annotation);
                out.push(*value);
            }
            StoreDeclaration { members, .. } => out.extend(members),
            AutorunDeclaration { body, .. } => out.push(*body),
            TestExprDeclaration { expr, .. } => out.push(*expr),
            TestBlockDeclaration { block, .. } => out.push(*block),
            GenericParam { extends, .. } => out.extend(extends),
            Param {
                type_annotation, ..
            } => out.extend(type_annotation),
            BinaryOperation { left, right, .. } => out.extend([*left, *right]),
            UnaryOperation { operand, .. } => out.push(*operand),
            Invocation {
                subject,
                type_args,
                args,
            } => {
                out.push(*subject);
                out.extend(type_args);
                out.extend(args);
            }
            Pipe { value, function } => out.extend([*value, *function]),
            PropertyAccessor { subject, .. } => out.push(*subject),
            IndexerAccess { subject, index, .. } => out.extend([*subject, *index]),
            Func {
                type_params,
                params,
                return_type,
                body,
            } => {
                out.extend(type_params);
                out.extend(params);
                out.extend(return_type);
                out.push(*body);
            }
            Proc {
                type_params,
                params,
                body,
            } => {
                out.extend(type_params);
                out.extend(params);
                out.push(*body);
            }
            IfElseExpression { cases, default } | IfElseStatement { cases, default } => {
                out.extend(cases);
                out.extend(default);
            }
            IfElseCase { condition, outcome } => out.extend([*condition, *outcome]),
            SwitchExpression {
                value,
                cases,
                default,
            } => {
                out.push(*value);
                out.extend(cases);
                out.extend(default);
            }
            SwitchCase { test, outcome } => out.extend([*test, *outcome]),
            ArrayLiteral(entries) | ObjectLiteral(entries) | Block(entries) => {
                out.extend(entries)
            }
            ObjectEntry { value, .. } => out.push(*value),
            Parenthesized(inner)
            | ExpressionStatement(inner)
            | ArrayType(inner)
            | IteratorType(inner)
            | PlanType(inner)
            | ReadonlyType(inner)
            | ParenthesizedType(inner) => out.push(*inner),
            InlineConst {
                type_annotation,
                value,
                body,
                ..
            } => {
                out.extend(type_annotation);
                out.extend([*value, *body]);
            }
            Range { start, end } => out.extend([*start, *end]),
            AsCast { inner, type_expr } => out.extend([*inner, *type_expr]),
            Assignment { target, value } => out.extend([*target, *value]),
            ForLoop { iterator, body, .. } => out.extend([*iterator, *body]),
            WhileLoop { condition, body } => out.extend([*condition, *body]),
            NamedType { type_args, .. } => out.extend(type_args),
            UnionType(members) | TupleType(members) | ObjectType(members) => {
                out.extend(members)
            }
            ObjectTypeEntry { value, .. } => out.push(*value),
            IndexerType { key, value } => out.extend([*key, *value]),
            FuncType {
                type_params,
                params,
                return_type,
            } => {
                out.extend(type_params);
                out.extend(params);
                out.push(*return_type);
            }
            ProcType {
                type_params,
                params,
            } => {
                out.extend(type_params);
                out.extend(params);
            }
            ImportItem { .. }
            | ImportAllDeclaration { .. }
            | NumberLiteral(_)
            | StringLiteral(_)
            | BooleanLiteral(_)
            | NilLiteral
            | JavascriptEscape(_)
            | LocalIdentifier(_)
            | This
            | PrimitiveType(_)
            | LiteralType(_) => {}
        }
        out
    }

    /// Whether this kind is a type expression.
    pub fn is_type_expression(&self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            PrimitiveType(_)
                | LiteralType(_)
                | NamedType { .. }
                | UnionType(_)
                | ArrayType(_)
                | TupleType(_)
                | ObjectType(_)
                | IndexerType { .. }
                | FuncType { .. }
                | ProcType { .. }
                | IteratorType(_)
                | PlanType(_)
                | ReadonlyType(_)
                | ParenthesizedType(_)
        )
    }

    /// Short, stable name of the kind (used in debug output).
    pub fn name(&self) -> &'static str {
        use NodeKind::*;
        match self {
            Module { .. } => "module",
            ImportDeclaration { .. } => "import-declaration",
            ImportItem { .. } => "import-item",
            ImportAllDeclaration { .. } => "import-all-declaration",
            TypeDeclaration { .. } => "type-declaration",
            FuncDeclaration { .. } => "func-declaration",
            ProcDeclaration { .. } => "proc-declaration",
            ValueDeclaration { .. } => "value-declaration",
            StoreDeclaration { .. } => "store-declaration",
            StoreMember { .. } => "store-member",
            AutorunDeclaration { .. } => "autorun-declaration",
            TestExprDeclaration { .. } => "test-expr-declaration",
            TestBlockDeclaration { .. } => "test-block-declaration",
            GenericParam { .. } => "generic-param",
            Param { .. } => "param",
            NumberLiteral(_) => "number-literal",
            StringLiteral(_) => "string-literal",
            BooleanLiteral(_) => "boolean-literal",
            NilLiteral => "nil-literal",
            JavascriptEscape(_) => "javascript-escape",
            LocalIdentifier(_) => "local-identifier",
            This => "this",
            BinaryOperation { .. } => "binary-operation",
            UnaryOperation { .. } => "unary-operation",
            Invocation { .. } => "invocation",
            Pipe { .. } => "pipe",
            PropertyAccessor { .. } => "property-accessor",
            IndexerAccess { .. } => "indexer",
            Func { .. } => "func",
            Proc { .. } => "proc",
            IfElseExpression { .. } => "if-else-expression",
            IfElseCase { .. } => "if-else-case",
            SwitchExpression { .. } => "switch-expression",
            SwitchCase { .. } => "switch-case",
            ArrayLiteral(_) => "array-literal",
            ObjectLiteral(_) => "object-literal",
            ObjectEntry { .. } => "object-entry",
            Parenthesized(_) => "parenthesized-expression",
            InlineConst { .. } => "inline-const",
            Range { .. } => "range",
            AsCast { .. } => "as-cast",
            Block(_) => "block",
            DeclarationStatement { .. } => "declaration-statement",
            Assignment { .. } => "assignment",
            ExpressionStatement(_) => "expression-statement",
            IfElseStatement { .. } => "if-else-statement",
            ForLoop { .. } => "for-loop",
            WhileLoop { .. } => "while-loop",
            PrimitiveType(_) => "primitive-type",
            LiteralType(_) => "literal-type",
            NamedType { .. } => "named-type",
            UnionType(_) => "union-type",
            ArrayType(_) => "array-type",
            TupleType(_) => "tuple-type",
            ObjectType(_) => "object-type",
            ObjectTypeEntry { .. } => "object-type-entry",
            IndexerType { .. } => "indexer-type",
            FuncType { .. } => "func-type",
            ProcType { .. } => "proc-type",
            IteratorType(_) => "iterator-type",
            PlanType(_) => "plan-type",
            ReadonlyType(_) => "readonly-type",
            ParenthesizedType(_) => "parenthesized-type",
        }
    }
}
