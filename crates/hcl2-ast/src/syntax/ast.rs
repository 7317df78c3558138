//! Typed, order-preserving AST of an HCL2 document.
//!
//! Nodes compare structurally. Floats compare by bit pattern so that `Eq`
//! and `Hash` agree.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

// ─── Literal values ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl LiteralValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for LiteralValue {}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::String(s) => s.hash(state),
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(v: bool) -> Self { Self::Bool(v) }
}

impl From<i64> for LiteralValue {
    fn from(v: i64) -> Self { Self::Int(v) }
}

impl From<i32> for LiteralValue {
    fn from(v: i32) -> Self { Self::Int(v.into()) }
}

impl From<f64> for LiteralValue {
    fn from(v: f64) -> Self { Self::Float(v) }
}

impl From<&str> for LiteralValue {
    fn from(v: &str) -> Self { Self::String(v.to_string()) }
}

impl From<String> for LiteralValue {
    fn from(v: String) -> Self { Self::String(v) }
}

impl<T: Into<LiteralValue>> From<Option<T>> for LiteralValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

/// Root of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stmt {
    /// `key = value`
    Attribute(Attribute),
    /// `name "label" label { ... }`
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub key: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    pub name: String,
    pub args: Vec<Expression>,
    pub body: Vec<Stmt>,
}

impl Stmt {
    pub fn attribute(key: impl Into<String>, value: impl Into<Expression>) -> Self {
        Stmt::Attribute(Attribute { key: key.into(), value: value.into() })
    }

    pub fn block(name: impl Into<String>, args: Vec<Expression>, body: Vec<Stmt>) -> Self {
        Stmt::Block(Block { name: name.into(), args, body })
    }
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Literal(Literal),
    Array(Array),
    Object(Object),
    FunctionCall(FunctionCall),
    Identifier(Identifier),
    GetAttr(GetAttr),
    GetIndex(GetIndex),
    AttrSplat(AttrSplat),
    IndexSplat(IndexSplat),
    UnaryOp(UnaryOp),
    BinaryOp(BinaryOp),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: LiteralValue,
}

/// `[a, b, c]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Array {
    pub values: Vec<Expression>,
}

/// `{ a = 1, "b": 2 }`, fields in source order.
#[derive(Debug, Clone, Default)]
pub struct Object {
    pub fields: IndexMap<String, Expression>,
}

// IndexMap equality ignores order; node equality must not.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len() && self.fields.iter().eq(other.fields.iter())
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.len().hash(state);
        for (key, value) in &self.fields {
            key.hash(state);
            value.hash(state);
        }
    }
}

/// `name(args...)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: String,
}

/// `on.name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GetAttr {
    pub on: Box<Expression>,
    pub name: String,
}

/// `on[index]` or legacy `on.0`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GetIndex {
    pub on: Box<Expression>,
    pub index: Literal,
}

/// `on.*`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrSplat {
    pub on: Box<Expression>,
}

/// `on[*]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexSplat {
    pub on: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnaryOp {
    pub op: UnaryOperator,
    pub expr: Box<Expression>,
}

/// Operands group exactly as the grammar nested them; there is no
/// precedence table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryOp {
    pub op: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl Expression {
    /// Variant name, as used in diagnostics and pretty output.
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Literal(_) => "Literal",
            Expression::Array(_) => "Array",
            Expression::Object(_) => "Object",
            Expression::FunctionCall(_) => "FunctionCall",
            Expression::Identifier(_) => "Identifier",
            Expression::GetAttr(_) => "GetAttr",
            Expression::GetIndex(_) => "GetIndex",
            Expression::AttrSplat(_) => "AttrSplat",
            Expression::IndexSplat(_) => "IndexSplat",
            Expression::UnaryOp(_) => "UnaryOp",
            Expression::BinaryOp(_) => "BinaryOp",
        }
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Expression::Literal(Literal { value: value.into() })
    }

    pub fn null() -> Self {
        Expression::Literal(Literal { value: LiteralValue::Null })
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier { name: name.into() })
    }

    pub fn array(values: Vec<Expression>) -> Self {
        Expression::Array(Array { values })
    }

    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Expression)>) -> Self {
        Expression::Object(Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCall { name: name.into(), args })
    }

    pub fn get_attr(on: Expression, name: impl Into<String>) -> Self {
        Expression::GetAttr(GetAttr { on: Box::new(on), name: name.into() })
    }

    pub fn get_index(on: Expression, index: impl Into<LiteralValue>) -> Self {
        Expression::GetIndex(GetIndex { on: Box::new(on), index: Literal { value: index.into() } })
    }

    pub fn attr_splat(on: Expression) -> Self {
        Expression::AttrSplat(AttrSplat { on: Box::new(on) })
    }

    pub fn index_splat(on: Expression) -> Self {
        Expression::IndexSplat(IndexSplat { on: Box::new(on) })
    }

    pub fn unary(op: UnaryOperator, expr: Expression) -> Self {
        Expression::UnaryOp(UnaryOp { op, expr: Box::new(expr) })
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp(BinaryOp { op, left: Box::new(left), right: Box::new(right) })
    }
}

impl From<Literal> for Expression {
    fn from(v: Literal) -> Self { Expression::Literal(v) }
}

impl From<Identifier> for Expression {
    fn from(v: Identifier) -> Self { Expression::Identifier(v) }
}

impl From<LiteralValue> for Expression {
    fn from(value: LiteralValue) -> Self { Expression::Literal(Literal { value }) }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Eq, NotEq,
    Lt, Gt, LtEq, GtEq,
    Add, Sub, Mul, Div, Mod,
    And, Or,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "-" => Some(Self::Neg),
            "!" => Some(Self::Not),
            _ => None,
        }
    }
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        let op = match s {
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::LtEq,
            ">=" => Self::GtEq,
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => return None,
        };
        Some(op)
    }
}
