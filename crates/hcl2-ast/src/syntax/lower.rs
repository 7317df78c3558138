//! CST → AST lowering.
//!
//! `ToAst` is a `Transformer`: one hook per grammar rule, each receiving the
//! already-lowered children of that production. Intermediate results travel
//! upward as `Lowered` values until `start` produces the `Module`. Every hook
//! checks the shape it receives; a mismatch is a `LowerError`, never a
//! configuration error.

use indexmap::IndexMap;
use tracing::trace;

use crate::error::LowerError;
use crate::syntax::ast::*;
use crate::syntax::cst::{Rule, Transformer};
use crate::syntax::token::{Token, TokenKind};

/// Values substituted upward while lowering.
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Token(Token),
    NewLine,
    /// A bare identifier, not yet decided to be a reference, key or label.
    Name(String),
    /// A primitive the AST has not wrapped yet (string literal contents).
    Primitive(LiteralValue),
    Expr(Expression),
    Stmt(Stmt),
    Body(Vec<Stmt>),
    Args(Vec<Expression>),
    ObjectElem(String, Expression),
    Projection(Projection),
    Operator(BinaryOperator),
    BinaryTerm(BinaryOperator, Expression),
    Module(Module),
}

/// The postfix step of a projection term.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Attr(String),
    Index(Literal),
    AttrSplat,
    FullSplat,
}

impl Lowered {
    pub fn describe(&self) -> &'static str {
        match self {
            Lowered::Token(_) => "token",
            Lowered::NewLine => "newline",
            Lowered::Name(_) => "name",
            Lowered::Primitive(_) => "primitive",
            Lowered::Expr(_) => "expression",
            Lowered::Stmt(_) => "statement",
            Lowered::Body(_) => "body",
            Lowered::Args(_) => "arguments",
            Lowered::ObjectElem(..) => "object element",
            Lowered::Projection(_) => "projection",
            Lowered::Operator(_) => "operator",
            Lowered::BinaryTerm(..) => "binary term",
            Lowered::Module(_) => "module",
        }
    }
}

// ─── Transformer ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ToAst;

impl Transformer for ToAst {
    type Output = Lowered;
    type Error = LowerError;

    fn token(&mut self, token: Token) -> Result<Lowered, LowerError> {
        Ok(Lowered::Token(token))
    }

    fn rule(&mut self, rule: Rule, line: usize, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let cx = Hook { rule, line };
        match rule {
            Rule::Start => cx.start(children),
            Rule::Body => cx.body(children),
            Rule::NewLineOrComment => Ok(Lowered::NewLine),
            Rule::Attribute => cx.attribute(children),
            Rule::Block => cx.block(children),
            Rule::Identifier => cx.identifier(children),
            Rule::ExprTerm => cx.expr_term(children),
            Rule::IntLit => cx.int_lit(children),
            Rule::FloatLit => cx.float_lit(children),
            Rule::StringLit => cx.string_lit(children),
            Rule::Tuple => cx.tuple(children),
            Rule::Object => cx.object(children),
            Rule::ObjectElem => cx.object_elem(children),
            Rule::FunctionCall => cx.function_call(children),
            Rule::Arguments => cx.arguments(children),
            Rule::GetAttr => cx.get_attr(children),
            Rule::Index => cx.index(children),
            Rule::AttrSplat => cx.empty(children, Projection::AttrSplat),
            Rule::FullSplat => cx.empty(children, Projection::FullSplat),
            Rule::GetAttrExprTerm
            | Rule::IndexExprTerm
            | Rule::AttrSplatExprTerm
            | Rule::FullSplatExprTerm => cx.projection_term(children),
            Rule::UnaryOp => cx.unary_op(children),
            Rule::BinaryOp => cx.binary_op(children),
            Rule::BinaryTerm => cx.binary_term(children),
            Rule::BinaryOperator => cx.binary_operator(children),
        }
    }
}

// ─── Hooks ────────────────────────────────────────────────────────────────────

/// The rule being lowered, for error attribution.
struct Hook {
    rule: Rule,
    line: usize,
}

impl Hook {
    fn err(&self, msg: impl Into<String>) -> LowerError {
        LowerError::new(self.rule, self.line, msg)
    }

    fn unexpected(&self, what: &Lowered) -> LowerError {
        self.err(format!("unexpected {}", what.describe()))
    }

    /// Wraps a primitive in `Literal`; expressions pass through.
    fn to_expression(&self, value: Lowered) -> Result<Expression, LowerError> {
        match value {
            Lowered::Expr(e) => Ok(e),
            Lowered::Primitive(v) => Ok(Expression::Literal(Literal { value: v })),
            other => Err(self.unexpected(&other)),
        }
    }

    fn exactly<const N: usize>(&self, children: Vec<Lowered>) -> Result<[Lowered; N], LowerError> {
        let children = strip_new_lines(children);
        let count = children.len();
        children.try_into().map_err(|_| self.err(format!("expected {N} children, found {count}")))
    }

    fn only_token(&self, children: Vec<Lowered>) -> Result<TokenKind, LowerError> {
        match self.exactly::<1>(children)? {
            [Lowered::Token(tok)] => Ok(tok.kind),
            [other] => Err(self.unexpected(&other)),
        }
    }

    fn start(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let mut children = strip_new_lines(children);
        match children.pop() {
            None => Ok(Lowered::Module(Module::default())),
            Some(Lowered::Body(body)) if children.is_empty() => Ok(Lowered::Module(Module::new(body))),
            Some(other) => Err(self.unexpected(&other)),
        }
    }

    fn body(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        strip_new_lines(children)
            .into_iter()
            .map(|c| match c {
                Lowered::Stmt(s) => Ok(s),
                other => Err(self.unexpected(&other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Lowered::Body)
    }

    fn attribute(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let [key, value] = self.exactly::<2>(children)?;
        let Lowered::Name(key) = key else { return Err(self.unexpected(&key)) };
        trace!(key = %key, "lowering attribute");
        Ok(Lowered::Stmt(Stmt::Attribute(Attribute { key, value: self.to_expression(value)? })))
    }

    /// A block whose body is empty arrives without a body child: its last
    /// child is then a label, and an empty body is appended.
    fn block(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let mut children = strip_new_lines(children);
        if matches!(children.last(), Some(Lowered::Name(_) | Lowered::Primitive(_))) {
            children.push(Lowered::Body(Vec::new()));
        }
        if children.len() < 2 {
            return Err(self.err("block needs a name and a body"));
        }

        let Some(Lowered::Body(body)) = children.pop() else {
            return Err(self.err("block does not end with a body"));
        };
        let mut children = children.into_iter();
        let name = match children.next() {
            Some(Lowered::Name(name)) => name,
            Some(other) => return Err(self.unexpected(&other)),
            None => return Err(self.err("block has no name")),
        };
        let args = children
            .map(|label| match label {
                Lowered::Name(name) => Ok(Expression::Identifier(Identifier { name })),
                Lowered::Primitive(v @ LiteralValue::String(_)) => Ok(Expression::Literal(Literal { value: v })),
                other => Err(self.unexpected(&other)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        trace!(name = %name, args = args.len(), statements = body.len(), "lowering block");
        Ok(Lowered::Stmt(Stmt::Block(Block { name, args, body })))
    }

    fn identifier(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        match self.only_token(children)? {
            TokenKind::Ident(name) => Ok(Lowered::Name(name)),
            other => Err(self.err(format!("expected identifier token, found {other:?}"))),
        }
    }

    /// `true`, `false` and `null` are literals wherever a term is expected,
    /// before any other name is taken as an identifier.
    fn expr_term(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let [term] = self.exactly::<1>(children)?;
        let expr = match term {
            Lowered::Name(name) => match name.as_str() {
                "true" => Expression::literal(true),
                "false" => Expression::literal(false),
                "null" => Expression::null(),
                _ => Expression::Identifier(Identifier { name }),
            },
            other => self.to_expression(other)?,
        };
        Ok(Lowered::Expr(expr))
    }

    fn int_lit(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        match self.only_token(children)? {
            TokenKind::Int(v) => Ok(Lowered::Expr(Expression::literal(v))),
            other => Err(self.err(format!("expected int token, found {other:?}"))),
        }
    }

    fn float_lit(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        match self.only_token(children)? {
            TokenKind::Float(v) => Ok(Lowered::Expr(Expression::literal(v))),
            other => Err(self.err(format!("expected float token, found {other:?}"))),
        }
    }

    fn string_lit(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        match self.only_token(children)? {
            TokenKind::StringLit(s) => Ok(Lowered::Primitive(LiteralValue::String(s))),
            other => Err(self.err(format!("expected string token, found {other:?}"))),
        }
    }

    fn tuple(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let values = strip_new_lines(children)
            .into_iter()
            .map(|c| self.to_expression(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Lowered::Expr(Expression::Array(Array { values })))
    }

    /// A repeated key keeps its first position and takes the last value.
    fn object(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let mut fields = IndexMap::new();
        for child in strip_new_lines(children) {
            match child {
                Lowered::ObjectElem(key, value) => { fields.insert(key, value); }
                other => return Err(self.unexpected(&other)),
            }
        }
        Ok(Lowered::Expr(Expression::Object(Object { fields })))
    }

    fn object_elem(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let [key, value] = self.exactly::<2>(children)?;
        let key = match key {
            Lowered::Name(name) => name,
            Lowered::Primitive(LiteralValue::String(s)) => s,
            other => return Err(self.unexpected(&other)),
        };
        Ok(Lowered::ObjectElem(key, self.to_expression(value)?))
    }

    fn function_call(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let mut children = strip_new_lines(children).into_iter();
        let name = match children.next() {
            Some(Lowered::Name(name)) => name,
            Some(other) => return Err(self.unexpected(&other)),
            None => return Err(self.err("function call has no name")),
        };
        let args = match children.next() {
            None => Vec::new(),
            Some(Lowered::Args(args)) => args,
            Some(other) => return Err(self.unexpected(&other)),
        };
        if let Some(extra) = children.next() {
            return Err(self.unexpected(&extra));
        }
        Ok(Lowered::Expr(Expression::FunctionCall(FunctionCall { name, args })))
    }

    fn arguments(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        strip_new_lines(children)
            .into_iter()
            .map(|c| self.to_expression(c))
            .collect::<Result<Vec<_>, _>>()
            .map(Lowered::Args)
    }

    fn get_attr(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        match self.exactly::<1>(children)? {
            [Lowered::Name(name)] => Ok(Lowered::Projection(Projection::Attr(name))),
            [other] => Err(self.unexpected(&other)),
        }
    }

    fn index(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let index = match self.exactly::<1>(children)? {
            [Lowered::Expr(Expression::Literal(lit))] => lit,
            [Lowered::Primitive(value)] => Literal { value },
            [other] => return Err(self.unexpected(&other)),
        };
        Ok(Lowered::Projection(Projection::Index(index)))
    }

    fn empty(&self, children: Vec<Lowered>, projection: Projection) -> Result<Lowered, LowerError> {
        let [] = self.exactly::<0>(children)?;
        Ok(Lowered::Projection(projection))
    }

    /// `expr_term projection` for all four projection kinds.
    fn projection_term(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let [on, projection] = self.exactly::<2>(children)?;
        let on = Box::new(self.to_expression(on)?);
        let expr = match (self.rule, projection) {
            (Rule::GetAttrExprTerm, Lowered::Projection(Projection::Attr(name))) => {
                Expression::GetAttr(GetAttr { on, name })
            }
            (Rule::IndexExprTerm, Lowered::Projection(Projection::Index(index))) => {
                Expression::GetIndex(GetIndex { on, index })
            }
            (Rule::AttrSplatExprTerm, Lowered::Projection(Projection::AttrSplat)) => {
                Expression::AttrSplat(AttrSplat { on })
            }
            (Rule::FullSplatExprTerm, Lowered::Projection(Projection::FullSplat)) => {
                Expression::IndexSplat(IndexSplat { on })
            }
            (_, other) => return Err(self.unexpected(&other)),
        };
        Ok(Lowered::Expr(expr))
    }

    fn unary_op(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let [op, expr] = self.exactly::<2>(children)?;
        let op = match &op {
            Lowered::Token(tok) => tok.kind.operator_str().and_then(UnaryOperator::from_symbol),
            _ => None,
        }
        .ok_or_else(|| self.unexpected(&op))?;
        let expr = Box::new(self.to_expression(expr)?);
        Ok(Lowered::Expr(Expression::UnaryOp(UnaryOp { op, expr })))
    }

    fn binary_op(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let [left, term] = self.exactly::<2>(children)?;
        let Lowered::BinaryTerm(op, right) = term else { return Err(self.unexpected(&term)) };
        let left = Box::new(self.to_expression(left)?);
        Ok(Lowered::Expr(Expression::BinaryOp(BinaryOp { op, left, right: Box::new(right) })))
    }

    fn binary_term(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let [op, right] = self.exactly::<2>(children)?;
        let Lowered::Operator(op) = op else { return Err(self.unexpected(&op)) };
        Ok(Lowered::BinaryTerm(op, self.to_expression(right)?))
    }

    fn binary_operator(&self, children: Vec<Lowered>) -> Result<Lowered, LowerError> {
        let kind = self.only_token(children)?;
        kind.operator_str()
            .and_then(BinaryOperator::from_symbol)
            .map(Lowered::Operator)
            .ok_or_else(|| self.err(format!("{kind:?} is not a binary operator")))
    }
}

fn strip_new_lines(children: Vec<Lowered>) -> Vec<Lowered> {
    children
        .into_iter()
        .filter(|c| !matches!(c, Lowered::NewLine | Lowered::Token(Token { kind: TokenKind::Newline, .. })))
        .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
