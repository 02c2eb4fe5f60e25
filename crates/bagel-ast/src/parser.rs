//! Recursive-descent parser from tokens to the arena AST.
//!
//! Binary precedence, loosest first: `|>`, `??`, `||`, `&&`, `== !=`,
//! comparisons, `..`, `+ -`, `* /`, unary `! -`, `as`, then postfix calls,
//! property accesses and indexers.
//!
//! Three spots need lookahead beyond one token: explicit type arguments
//! (`f<T>(x)` vs. `a < b`), function literals vs. parenthesized expressions,
//! and function types vs. parenthesized types. They are resolved by trying the
//! longer reading first and rewinding the token cursor and the node arena if
//! it does not pan out.

use std::path::PathBuf;

use bagel_core::Span;

use crate::lexer::{Token, TokenKind, tokenize};
use crate::{
    Access, BinaryOp, LiteralValue, Module, ModuleBuilder, NodeId, NodeKind, ParseError,
    Primitive, UnaryOp,
};

type PResult<T> = Result<T, ParseError>;

/// Parse a whole source file.
pub fn parse(path: impl Into<PathBuf>, source: &str) -> Result<Module, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        builder: ModuleBuilder::new(path),
        no_proc_literal: false,
    };
    let root = parser.module(source.len())?;
    Ok(parser.builder.finish(root))
}

const BINARY_LEVELS: &[&[(&str, BinaryOp)]] = &[
    &[("??", BinaryOp::NullishCoalescing)],
    &[("||", BinaryOp::Or)],
    &[("&&", BinaryOp::And)],
    &[("==", BinaryOp::Eq), ("!=", BinaryOp::NotEq)],
    &[
        ("<=", BinaryOp::LessEq),
        (">=", BinaryOp::GreaterEq),
        ("<", BinaryOp::Less),
        (">", BinaryOp::Greater),
    ],
    &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
    &[("*", BinaryOp::Mul), ("/", BinaryOp::Div)],
];

/// `..` sits between comparisons and additive operators.
const RANGE_LEVEL: usize = 5;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: ModuleBuilder,
    /// Set while parsing an `if`/`while`/`for`/`switch` head, where `(x) {`
    /// is a parenthesized condition followed by a block.
    no_proc_literal: bool,
}

struct Checkpoint {
    pos: usize,
    nodes: usize,
}

impl Parser {
    // === Token cursor ===

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn start(&self) -> usize {
        self.tokens[self.pos].span.start
    }

    fn prev_end(&self) -> usize {
        match self.pos {
            0 => 0,
            pos => self.tokens[pos - 1].span.end,
        }
    }

    fn bump(&mut self) -> TokenKind {
        let kind = self.tokens[self.pos].kind.clone();
        if kind != TokenKind::Eof {
            self.pos += 1;
        }
        kind
    }

    fn at(&self, punct: &str) -> bool {
        matches!(self.peek(), TokenKind::Punct(p) if *p == punct)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Keyword(k) if *k == keyword)
    }

    fn eat(&mut self, punct: &str) -> bool {
        let found = self.at(punct);
        if found {
            self.bump();
        }
        found
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = self.at_keyword(keyword);
        if found {
            self.bump();
        }
        found
    }

    /// Contextual keywords lex as identifiers.
    fn eat_contextual(&mut self, word: &str) -> bool {
        let found = matches!(self.peek(), TokenKind::Ident(name) if name == word);
        if found {
            self.bump();
        }
        found
    }

    fn expect(&mut self, punct: &str) -> PResult<()> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{punct}`")))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> PResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{keyword}`")))
        }
    }

    fn expect_contextual(&mut self, word: &str) -> PResult<()> {
        if self.eat_contextual(word) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{word}`")))
        }
    }

    fn ident(&mut self) -> PResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    /// Property names and object keys may be reserved words.
    fn property_name(&mut self) -> PResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) | TokenKind::Str(name) => {
                self.bump();
                Ok(name)
            }
            TokenKind::Keyword(word) => {
                self.bump();
                Ok(word.to_string())
            }
            _ => Err(self.unexpected("a property name")),
        }
    }

    fn string(&mut self) -> PResult<String> {
        match self.peek().clone() {
            TokenKind::Str(value) => {
                self.bump();
                Ok(value)
            }
            _ => Err(self.unexpected("a string literal")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = &self.tokens[self.pos];
        ParseError::new(
            format!("expected {expected}, found {}", token.kind.describe()),
            token.span,
        )
    }

    fn finish(&mut self, kind: NodeKind, start: usize) -> NodeId {
        let end = self.prev_end().max(start);
        self.builder.alloc(kind, Span::new(start, end))
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            nodes: self.builder.len(),
        }
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.builder.truncate(checkpoint.nodes);
    }

    /// Run `f`, undoing everything it consumed if it fails.
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> Option<T> {
        let checkpoint = self.checkpoint();
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.rewind(checkpoint);
                None
            }
        }
    }

    fn with_proc_literals<T>(
        &mut self,
        allowed: bool,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let saved = std::mem::replace(&mut self.no_proc_literal, !allowed);
        let result = f(self);
        self.no_proc_literal = saved;
        result
    }

    /// Comma-separated items up to `close`; a trailing comma is allowed.
    fn comma_list<T>(
        &mut self,
        close: &str,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut items = Vec::new();
        while !self.at(close) {
            items.push(item(self)?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    // === Declarations ===

    fn module(&mut self, len: usize) -> PResult<NodeId> {
        let mut declarations = Vec::new();
        while *self.peek() != TokenKind::Eof {
            declarations.push(self.declaration()?);
            while self.eat(";") {}
        }
        Ok(self
            .builder
            .alloc(NodeKind::Module { declarations }, Span::new(0, len)))
    }

    fn declaration(&mut self) -> PResult<NodeId> {
        let start = self.start();
        if self.eat_keyword("import") {
            return self.import(start);
        }
        if self.eat_keyword("autorun") {
            let body = self.block()?;
            let forever = self.eat_contextual("forever");
            return Ok(self.finish(NodeKind::AutorunDeclaration { body, forever }, start));
        }
        if self.eat_keyword("test") {
            return self.test(start);
        }

        let exported = self.eat_keyword("export");
        let kind = match self.peek() {
            TokenKind::Keyword("type") => {
                self.bump();
                let name = self.ident()?;
                let type_params = self.generic_params()?;
                self.expect("=")?;
                let value = self.type_expr()?;
                NodeKind::TypeDeclaration {
                    name,
                    type_params,
                    value,
                    nominal: false,
                    exported,
                }
            }
            TokenKind::Keyword("nominal") => {
                self.bump();
                self.expect_keyword("type")?;
                let name = self.ident()?;
                self.expect("(")?;
                let value = self.type_expr()?;
                self.expect(")")?;
                NodeKind::TypeDeclaration {
                    name,
                    type_params: Vec::new(),
                    value,
                    nominal: true,
                    exported,
                }
            }
            TokenKind::Keyword("func") => {
                self.bump();
                let name = self.ident()?;
                let func = self.named_func()?;
                NodeKind::FuncDeclaration {
                    name,
                    func,
                    exported,
                }
            }
            TokenKind::Keyword("proc") => {
                self.bump();
                let name = self.ident()?;
                let proc = self.named_proc()?;
                NodeKind::ProcDeclaration {
                    name,
                    proc,
                    exported,
                }
            }
            TokenKind::Keyword(word @ ("const" | "let")) => {
                let is_const = *word == "const";
                self.bump();
                let (name, type_annotation, value) = self.binding_tail()?;
                NodeKind::ValueDeclaration {
                    name,
                    type_annotation,
                    value,
                    is_const,
                    exported,
                }
            }
            TokenKind::Keyword("store") => {
                self.bump();
                let name = self.ident()?;
                self.expect("{")?;
                let mut members = Vec::new();
                while !self.eat("}") {
                    members.push(self.store_member()?);
                    while self.eat(",") || self.eat(";") {}
                }
                NodeKind::StoreDeclaration {
                    name,
                    members,
                    exported,
                }
            }
            _ => return Err(self.unexpected("a declaration")),
        };
        Ok(self.finish(kind, start))
    }

    fn import(&mut self, start: usize) -> PResult<NodeId> {
        if self.eat("{") {
            let items = self.comma_list("}", |p| {
                let start = p.start();
                let name = p.ident()?;
                let alias = if p.eat_keyword("as") {
                    Some(p.ident()?)
                } else {
                    None
                };
                Ok(p.finish(NodeKind::ImportItem { name, alias }, start))
            })?;
            self.expect_contextual("from")?;
            let path = self.string()?;
            return Ok(self.finish(NodeKind::ImportDeclaration { path, items }, start));
        }

        let path = self.string()?;
        self.expect_keyword("as")?;
        let alias = self.ident()?;
        Ok(self.finish(NodeKind::ImportAllDeclaration { path, alias }, start))
    }

    fn test(&mut self, start: usize) -> PResult<NodeId> {
        if self.eat_contextual("expr") {
            let name = self.string()?;
            self.expect("=>")?;
            let expr = self.expression()?;
            Ok(self.finish(NodeKind::TestExprDeclaration { name, expr }, start))
        } else if self.eat_contextual("block") {
            let name = self.string()?;
            let block = self.block()?;
            Ok(self.finish(NodeKind::TestBlockDeclaration { name, block }, start))
        } else {
            Err(self.unexpected("`expr` or `block`"))
        }
    }

    fn store_member(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let access = if self.eat_keyword("public") {
            Access::Public
        } else if self.eat_keyword("visible") {
            Access::Visible
        } else if self.eat_keyword("private") {
            Access::Private
        } else {
            return Err(self.unexpected("`public`, `visible` or `private`"));
        };

        let (name, type_annotation, value) = if self.eat_keyword("func") {
            let name = self.ident()?;
            (name, None, self.named_func()?)
        } else if self.eat_keyword("proc") {
            let name = self.ident()?;
            (name, None, self.named_proc()?)
        } else {
            self.binding_tail()?
        };
        Ok(self.finish(
            NodeKind::StoreMember {
                access,
                name,
                type_annotation,
                value,
            },
            start,
        ))
    }

    /// `name[: T] = value`
    fn binding_tail(&mut self) -> PResult<(String, Option<NodeId>, NodeId)> {
        let name = self.ident()?;
        let type_annotation = self.annotation()?;
        self.expect("=")?;
        let value = self.expression()?;
        Ok((name, type_annotation, value))
    }

    fn annotation(&mut self) -> PResult<Option<NodeId>> {
        if self.eat(":") {
            Ok(Some(self.type_expr()?))
        } else {
            Ok(None)
        }
    }

    fn named_func(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let type_params = self.generic_params()?;
        let params = self.params()?;
        let return_type = self.annotation()?;
        self.expect("=>")?;
        let body = self.expression()?;
        Ok(self.finish(
            NodeKind::Func {
                type_params,
                params,
                return_type,
                body,
            },
            start,
        ))
    }

    fn named_proc(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let type_params = self.generic_params()?;
        let params = self.params()?;
        let body = self.block()?;
        Ok(self.finish(
            NodeKind::Proc {
                type_params,
                params,
                body,
            },
            start,
        ))
    }

    /// Optional `<T extends U, ...>`.
    fn generic_params(&mut self) -> PResult<Vec<NodeId>> {
        if !self.eat("<") {
            return Ok(Vec::new());
        }
        self.comma_list(">", |p| {
            let start = p.start();
            let name = p.ident()?;
            let extends = if p.eat_keyword("extends") {
                Some(p.type_expr()?)
            } else {
                None
            };
            Ok(p.finish(NodeKind::GenericParam { name, extends }, start))
        })
    }

    fn params(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        self.comma_list(")", |p| {
            let start = p.start();
            let name = p.ident()?;
            let type_annotation = p.annotation()?;
            Ok(p.finish(
                NodeKind::Param {
                    name,
                    type_annotation,
                },
                start,
            ))
        })
    }

    // === Statements ===

    fn block(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let statements = self.with_proc_literals(true, |p| {
            let mut statements = Vec::new();
            while !p.eat("}") {
                statements.push(p.statement()?);
                while p.eat(";") {}
            }
            Ok(statements)
        })?;
        Ok(self.finish(NodeKind::Block(statements), start))
    }

    fn statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let kind = match self.peek() {
            TokenKind::Keyword(word @ ("const" | "let")) => {
                let is_const = *word == "const";
                self.bump();
                let (name, type_annotation, value) = self.binding_tail()?;
                NodeKind::DeclarationStatement {
                    name,
                    type_annotation,
                    value,
                    is_const,
                }
            }
            TokenKind::Keyword("if") => {
                self.bump();
                let (cases, default) = self.if_chain(Self::block)?;
                NodeKind::IfElseStatement { cases, default }
            }
            TokenKind::Keyword("for") => {
                self.bump();
                let item = self.ident()?;
                self.expect_keyword("of")?;
                let iterator = self.condition()?;
                let body = self.block()?;
                NodeKind::ForLoop {
                    item,
                    iterator,
                    body,
                }
            }
            TokenKind::Keyword("while") => {
                self.bump();
                let condition = self.condition()?;
                let body = self.block()?;
                NodeKind::WhileLoop { condition, body }
            }
            _ => {
                let target = self.expression()?;
                if self.eat("=") {
                    let value = self.expression()?;
                    NodeKind::Assignment { target, value }
                } else {
                    NodeKind::ExpressionStatement(target)
                }
            }
        };
        Ok(self.finish(kind, start))
    }

    /// Expression in front of a block.
    fn condition(&mut self) -> PResult<NodeId> {
        self.with_proc_literals(false, Self::expression)
    }

    /// The part of an `if` after the keyword, shared by the statement and
    /// expression forms; `outcome` parses each branch.
    fn if_chain(
        &mut self,
        outcome: fn(&mut Self) -> PResult<NodeId>,
    ) -> PResult<(Vec<NodeId>, Option<NodeId>)> {
        let mut cases = Vec::new();
        loop {
            let start = self.start();
            let condition = self.condition()?;
            let outcome_node = outcome(self)?;
            cases.push(self.finish(
                NodeKind::IfElseCase {
                    condition,
                    outcome: outcome_node,
                },
                start,
            ));
            if !self.eat_keyword("else") {
                return Ok((cases, None));
            }
            if !self.eat_keyword("if") {
                return Ok((cases, Some(outcome(self)?)));
            }
        }
    }

    /// `{ expr }`, the branch of an `if` expression.
    fn braced_expression(&mut self) -> PResult<NodeId> {
        self.expect("{")?;
        let expr = self.with_proc_literals(true, Self::expression)?;
        self.expect("}")?;
        Ok(expr)
    }

    // === Expressions ===

    fn expression(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut value = self.binary(0)?;
        while self.eat("|>") {
            let function = self.binary(0)?;
            value = self.finish(NodeKind::Pipe { value, function }, start);
        }
        Ok(value)
    }

    fn binary(&mut self, level: usize) -> PResult<NodeId> {
        if level == BINARY_LEVELS.len() {
            return self.unary();
        }
        let start = self.start();
        let mut left = self.operand(level)?;
        loop {
            let op = BINARY_LEVELS[level]
                .iter()
                .find(|(symbol, _)| self.at(symbol))
                .map(|(_, op)| *op);
            let Some(op) = op else {
                return Ok(left);
            };
            self.bump();
            let right = self.operand(level)?;
            left = self.finish(NodeKind::BinaryOperation { left, op, right }, start);
        }
    }

    fn operand(&mut self, level: usize) -> PResult<NodeId> {
        if level + 1 == RANGE_LEVEL {
            self.range()
        } else {
            self.binary(level + 1)
        }
    }

    fn range(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let lower = self.binary(RANGE_LEVEL)?;
        if !self.eat("..") {
            return Ok(lower);
        }
        let end = self.binary(RANGE_LEVEL)?;
        Ok(self.finish(NodeKind::Range { start: lower, end }, start))
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let op = if self.at("!") {
            UnaryOp::Not
        } else if self.at("-") {
            UnaryOp::Negate
        } else {
            return self.cast();
        };
        self.bump();
        let operand = self.unary()?;
        Ok(self.finish(NodeKind::UnaryOperation { op, operand }, start))
    }

    fn cast(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut inner = self.postfix()?;
        while self.eat_keyword("as") {
            let type_expr = self.type_expr()?;
            inner = self.finish(NodeKind::AsCast { inner, type_expr }, start);
        }
        Ok(inner)
    }

    fn postfix(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut subject = self.primary()?;
        loop {
            let kind = if self.at("(") {
                let args = self.args()?;
                NodeKind::Invocation {
                    subject,
                    type_args: Vec::new(),
                    args,
                }
            } else if self.at("<") {
                let type_args = self.attempt(|p| {
                    let type_args = p.type_args()?;
                    if p.at("(") {
                        Ok(type_args)
                    } else {
                        Err(p.unexpected("`(`"))
                    }
                });
                let Some(type_args) = type_args else {
                    return Ok(subject);
                };
                let args = self.args()?;
                NodeKind::Invocation {
                    subject,
                    type_args,
                    args,
                }
            } else if self.eat(".") {
                let property = self.property_name()?;
                NodeKind::PropertyAccessor {
                    subject,
                    property,
                    optional: false,
                }
            } else if self.eat("?.") {
                if self.eat("[") {
                    let index = self.with_proc_literals(true, Self::expression)?;
                    self.expect("]")?;
                    NodeKind::IndexerAccess {
                        subject,
                        index,
                        optional: true,
                    }
                } else {
                    let property = self.property_name()?;
                    NodeKind::PropertyAccessor {
                        subject,
                        property,
                        optional: true,
                    }
                }
            } else if self.eat("[") {
                let index = self.with_proc_literals(true, Self::expression)?;
                self.expect("]")?;
                NodeKind::IndexerAccess {
                    subject,
                    index,
                    optional: false,
                }
            } else {
                return Ok(subject);
            };
            subject = self.finish(kind, start);
        }
    }

    fn args(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        self.with_proc_literals(true, |p| p.comma_list(")", Self::expression))
    }

    fn type_args(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("<")?;
        self.comma_list(">", Self::type_expr)
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let kind = match self.peek().clone() {
            TokenKind::Number(n) => {
                self.bump();
                NodeKind::NumberLiteral(n)
            }
            TokenKind::Str(s) => {
                self.bump();
                NodeKind::StringLiteral(s)
            }
            TokenKind::Escape(code) => {
                self.bump();
                NodeKind::JavascriptEscape(code)
            }
            TokenKind::Keyword("true") => {
                self.bump();
                NodeKind::BooleanLiteral(true)
            }
            TokenKind::Keyword("false") => {
                self.bump();
                NodeKind::BooleanLiteral(false)
            }
            TokenKind::Keyword("nil") => {
                self.bump();
                NodeKind::NilLiteral
            }
            TokenKind::Keyword("this") => {
                self.bump();
                NodeKind::This
            }
            TokenKind::Ident(name) if self.peek_nth(1) == &TokenKind::Punct("=>") => {
                self.bump();
                let param = self.finish(
                    NodeKind::Param {
                        name,
                        type_annotation: None,
                    },
                    start,
                );
                self.bump();
                let body = self.expression()?;
                NodeKind::Func {
                    type_params: Vec::new(),
                    params: vec![param],
                    return_type: None,
                    body,
                }
            }
            TokenKind::Ident(name) => {
                self.bump();
                NodeKind::LocalIdentifier(name)
            }
            TokenKind::Punct("<") => {
                let type_params = self.generic_params()?;
                return self.function_literal(start, type_params);
            }
            TokenKind::Punct("(") => {
                if let Some(node) = self.lambda(start) {
                    return node;
                }
                self.bump();
                let inner = self.with_proc_literals(true, Self::expression)?;
                self.expect(")")?;
                NodeKind::Parenthesized(inner)
            }
            TokenKind::Punct("[") => {
                self.bump();
                let entries = self.with_proc_literals(true, |p| p.comma_list("]", Self::expression))?;
                NodeKind::ArrayLiteral(entries)
            }
            TokenKind::Punct("{") => {
                self.bump();
                let entries = self.with_proc_literals(true, |p| p.comma_list("}", Self::object_entry))?;
                NodeKind::ObjectLiteral(entries)
            }
            TokenKind::Keyword("if") => {
                self.bump();
                let (cases, default) = self.if_chain(Self::braced_expression)?;
                NodeKind::IfElseExpression { cases, default }
            }
            TokenKind::Keyword("switch") => {
                self.bump();
                return self.switch(start);
            }
            TokenKind::Keyword("const") => {
                self.bump();
                let (name, type_annotation, value) = self.binding_tail()?;
                self.expect(",")?;
                let body = self.expression()?;
                NodeKind::InlineConst {
                    name,
                    type_annotation,
                    value,
                    body,
                }
            }
            _ => return Err(self.unexpected("an expression")),
        };
        Ok(self.finish(kind, start))
    }

    /// A parenthesized parameter list that turns out to start a func or proc
    /// literal. Returns `None` (with nothing consumed) for a plain
    /// parenthesized expression.
    fn lambda(&mut self, start: usize) -> Option<PResult<NodeId>> {
        let head = self.attempt(|p| {
            let params = p.params()?;
            let return_type = p.annotation()?;
            let opens_proc = return_type.is_none() && p.at("{") && !p.no_proc_literal;
            if p.at("=>") || opens_proc {
                Ok((params, return_type))
            } else {
                Err(p.unexpected("`=>`"))
            }
        })?;
        let (params, return_type) = head;
        Some(self.function_body(start, Vec::new(), params, return_type))
    }

    /// `<T>(a: T) => ...` or `<T>(a: T) { ... }` after the type parameters.
    fn function_literal(&mut self, start: usize, type_params: Vec<NodeId>) -> PResult<NodeId> {
        let params = self.params()?;
        let return_type = self.annotation()?;
        self.function_body(start, type_params, params, return_type)
    }

    fn function_body(
        &mut self,
        start: usize,
        type_params: Vec<NodeId>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
    ) -> PResult<NodeId> {
        let kind = if self.eat("=>") {
            let body = self.expression()?;
            NodeKind::Func {
                type_params,
                params,
                return_type,
                body,
            }
        } else if return_type.is_none() && self.at("{") {
            let body = self.block()?;
            NodeKind::Proc {
                type_params,
                params,
                body,
            }
        } else {
            return Err(self.unexpected("`=>`"));
        };
        Ok(self.finish(kind, start))
    }

    fn object_entry(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let key = self.property_name()?;
        let value = if self.eat(":") {
            self.expression()?
        } else {
            // `{ a }` is shorthand for `{ a: a }`
            self.finish(NodeKind::LocalIdentifier(key.clone()), start)
        };
        Ok(self.finish(NodeKind::ObjectEntry { key, value }, start))
    }

    fn switch(&mut self, start: usize) -> PResult<NodeId> {
        let value = self.condition()?;
        self.expect("{")?;
        let mut cases = Vec::new();
        let mut default = None;
        self.with_proc_literals(true, |p| {
            while !p.eat("}") {
                let case_start = p.start();
                if p.eat_keyword("default") {
                    p.expect(":")?;
                    default = Some(p.expression()?);
                } else {
                    p.expect_keyword("case")?;
                    let test = p.expression()?;
                    p.expect(":")?;
                    let outcome = p.expression()?;
                    cases.push(p.finish(NodeKind::SwitchCase { test, outcome }, case_start));
                }
                while p.eat(",") {}
            }
            Ok(())
        })?;
        Ok(self.finish(
            NodeKind::SwitchExpression {
                value,
                cases,
                default,
            },
            start,
        ))
    }

    // === Type expressions ===

    fn type_expr(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.eat("|");
        let first = self.type_postfix()?;
        if !self.at("|") {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat("|") {
            members.push(self.type_postfix()?);
        }
        Ok(self.finish(NodeKind::UnionType(members), start))
    }

    fn type_postfix(&mut self) -> PResult<NodeId> {
        let start = self.start();
        if self.eat_keyword("readonly") {
            let inner = self.type_postfix()?;
            return Ok(self.finish(NodeKind::ReadonlyType(inner), start));
        }
        let mut ty = self.type_atom()?;
        while self.at("[") && self.peek_nth(1) == &TokenKind::Punct("]") {
            self.bump();
            self.bump();
            ty = self.finish(NodeKind::ArrayType(ty), start);
        }
        Ok(ty)
    }

    fn type_atom(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let kind = match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                let primitive = match name.as_str() {
                    "string" => Some(Primitive::String),
                    "number" => Some(Primitive::Number),
                    "boolean" => Some(Primitive::Boolean),
                    "unknown" => Some(Primitive::Unknown),
                    "any" => Some(Primitive::Any),
                    _ => None,
                };
                match (primitive, name.as_str()) {
                    (Some(primitive), _) => NodeKind::PrimitiveType(primitive),
                    (None, "Iterator" | "Plan") if self.at("<") => {
                        self.bump();
                        let inner = self.type_expr()?;
                        self.expect(">")?;
                        if name == "Iterator" {
                            NodeKind::IteratorType(inner)
                        } else {
                            NodeKind::PlanType(inner)
                        }
                    }
                    _ => {
                        let type_args = if self.at("<") {
                            self.type_args()?
                        } else {
                            Vec::new()
                        };
                        NodeKind::NamedType { name, type_args }
                    }
                }
            }
            TokenKind::Keyword("nil") => {
                self.bump();
                NodeKind::PrimitiveType(Primitive::Nil)
            }
            TokenKind::Keyword(word @ ("true" | "false")) => {
                self.bump();
                NodeKind::LiteralType(LiteralValue::Boolean(word == "true"))
            }
            TokenKind::Number(n) => {
                self.bump();
                NodeKind::LiteralType(LiteralValue::Number(n))
            }
            TokenKind::Punct("-") => {
                self.bump();
                match self.peek().clone() {
                    TokenKind::Number(n) => {
                        self.bump();
                        NodeKind::LiteralType(LiteralValue::Number(-n))
                    }
                    _ => return Err(self.unexpected("a number")),
                }
            }
            TokenKind::Str(s) => {
                self.bump();
                NodeKind::LiteralType(LiteralValue::String(s))
            }
            TokenKind::Punct("[") => {
                self.bump();
                NodeKind::TupleType(self.comma_list("]", Self::type_expr)?)
            }
            TokenKind::Punct("{") if self.peek_nth(1) == &TokenKind::Punct("[") => {
                self.bump();
                self.bump();
                let key = self.type_expr()?;
                self.expect("]")?;
                self.expect(":")?;
                let value = self.type_expr()?;
                self.eat(",");
                self.expect("}")?;
                NodeKind::IndexerType { key, value }
            }
            TokenKind::Punct("{") => {
                self.bump();
                NodeKind::ObjectType(self.comma_list("}", |p| {
                    let start = p.start();
                    let name = p.property_name()?;
                    let optional = p.eat("?");
                    p.expect(":")?;
                    let value = p.type_expr()?;
                    Ok(p.finish(
                        NodeKind::ObjectTypeEntry {
                            name,
                            optional,
                            value,
                        },
                        start,
                    ))
                })?)
            }
            TokenKind::Punct("<") => {
                let type_params = self.generic_params()?;
                let params = self.params()?;
                return self.function_type(start, type_params, params);
            }
            TokenKind::Punct("(") => {
                let params = self.attempt(|p| {
                    let params = p.params()?;
                    if p.at("=>") || p.at("{") {
                        Ok(params)
                    } else {
                        Err(p.unexpected("`=>`"))
                    }
                });
                if let Some(params) = params {
                    return self.function_type(start, Vec::new(), params);
                }
                self.bump();
                let inner = self.type_expr()?;
                self.expect(")")?;
                NodeKind::ParenthesizedType(inner)
            }
            _ => return Err(self.unexpected("a type")),
        };
        Ok(self.finish(kind, start))
    }

    /// `=> R` for a func type or `{}` for a proc type.
    fn function_type(
        &mut self,
        start: usize,
        type_params: Vec<NodeId>,
        params: Vec<NodeId>,
    ) -> PResult<NodeId> {
        let kind = if self.eat("=>") {
            let return_type = self.type_expr()?;
            NodeKind::FuncType {
                type_params,
                params,
                return_type,
            }
        } else {
            self.expect("{")?;
            self.expect("}")?;
            NodeKind::ProcType {
                type_params,
                params,
            }
        };
        Ok(self.finish(kind, start))
    }
}
