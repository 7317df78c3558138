//! Opt-in evaluator with exact operator semantics.
//!
//! Binary operators are looked up in a registry keyed by
//! `(operator, lhs kind, rhs kind)`. A missing entry is a type mismatch:
//! there is no coercion between kinds, not even int → float. Operands group
//! exactly as parsed, so `1 + 2 * 3 - 1` evaluates as `1 + (2 * (3 - 1))`.

use std::collections::HashMap;

use crate::error::{ConfigurationError, RuntimeError};
use crate::runtime::configurable::Configurable;
use crate::runtime::evaluator::Evaluator;
use crate::runtime::value::{PlainValue, Value};
use crate::syntax::ast::{BinaryOp, BinaryOperator, FunctionCall, GetAttr, UnaryOp, UnaryOperator};

// ─── Function pointer ─────────────────────────────────────────────────────────

pub type BinopFn = fn(BinaryOperator, PlainValue, PlainValue) -> Result<PlainValue, RuntimeError>;

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct BinopRegistry {
    ops: HashMap<(BinaryOperator, &'static str, &'static str), BinopFn>,
}

impl BinopRegistry {
    pub fn new() -> Self {
        Self { ops: HashMap::new() }
    }

    pub fn register(&mut self, op: BinaryOperator, lhs: &'static str, rhs: &'static str, f: BinopFn) {
        self.ops.insert((op, lhs, rhs), f);
    }

    /// Evaluate `l op r`. Returns `None` if no handler is registered for this
    /// kind combination.
    pub fn eval(
        &self,
        op: BinaryOperator,
        l: PlainValue,
        r: PlainValue,
    ) -> Option<Result<PlainValue, RuntimeError>> {
        self.ops.get(&(op, l.kind(), r.kind())).map(|f| f(op, l, r))
    }
}

impl Default for BinopRegistry {
    fn default() -> Self {
        use BinaryOperator::*;

        let mut r = Self::new();
        for op in [Add, Sub, Mul, Div, Mod] {
            r.register(op, "int", "int", int_arith);
            r.register(op, "float", "float", float_arith);
        }
        for op in [Lt, Gt, LtEq, GtEq] {
            for kind in ["int", "float", "string"] {
                r.register(op, kind, kind, compare);
            }
        }
        for op in [Eq, NotEq] {
            for kind in ["null", "bool", "int", "float", "string"] {
                r.register(op, kind, kind, equality);
            }
        }
        r.register(And, "bool", "bool", logic);
        r.register(Or, "bool", "bool", logic);
        r
    }
}

// ─── Implementations ──────────────────────────────────────────────────────────

fn mismatch(op: BinaryOperator, l: &PlainValue, r: &PlainValue) -> RuntimeError {
    RuntimeError::TypeMismatch { op: op.as_str(), left: l.kind(), right: r.kind() }
}

fn int_arith(op: BinaryOperator, l: PlainValue, r: PlainValue) -> Result<PlainValue, RuntimeError> {
    let (PlainValue::Int(a), PlainValue::Int(b)) = (&l, &r) else { return Err(mismatch(op, &l, &r)) };
    let (a, b) = (*a, *b);
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Sub => a.checked_sub(b),
        BinaryOperator::Mul => a.checked_mul(b),
        BinaryOperator::Div => a.checked_div(b),
        BinaryOperator::Mod => a.checked_rem(b),
        _ => return Err(mismatch(op, &l, &r)),
    };
    result.map(PlainValue::Int).ok_or_else(|| {
        let message = if b == 0 && matches!(op, BinaryOperator::Div | BinaryOperator::Mod) {
            "division by zero"
        } else {
            "integer overflow"
        };
        RuntimeError::Arithmetic { op: op.as_str(), message: message.to_string() }
    })
}

fn float_arith(op: BinaryOperator, l: PlainValue, r: PlainValue) -> Result<PlainValue, RuntimeError> {
    let (PlainValue::Float(a), PlainValue::Float(b)) = (&l, &r) else { return Err(mismatch(op, &l, &r)) };
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => a / b,
        BinaryOperator::Mod => a % b,
        _ => return Err(mismatch(op, &l, &r)),
    };
    Ok(PlainValue::Float(result))
}

fn compare(op: BinaryOperator, l: PlainValue, r: PlainValue) -> Result<PlainValue, RuntimeError> {
    let ordering = match (&l, &r) {
        (PlainValue::Int(a), PlainValue::Int(b)) => a.partial_cmp(b),
        (PlainValue::Float(a), PlainValue::Float(b)) => a.partial_cmp(b),
        (PlainValue::String(a), PlainValue::String(b)) => a.partial_cmp(b),
        _ => return Err(mismatch(op, &l, &r)),
    };
    // NaN compares false every way
    let result = ordering.is_some_and(|o| match op {
        BinaryOperator::Lt => o.is_lt(),
        BinaryOperator::Gt => o.is_gt(),
        BinaryOperator::LtEq => o.is_le(),
        BinaryOperator::GtEq => o.is_ge(),
        _ => false,
    });
    Ok(PlainValue::Bool(result))
}

fn equality(op: BinaryOperator, l: PlainValue, r: PlainValue) -> Result<PlainValue, RuntimeError> {
    let equal = match (&l, &r) {
        (PlainValue::Null, PlainValue::Null) => true,
        (PlainValue::Bool(a), PlainValue::Bool(b)) => a == b,
        (PlainValue::Int(a), PlainValue::Int(b)) => a == b,
        (PlainValue::Float(a), PlainValue::Float(b)) => a == b,
        (PlainValue::String(a), PlainValue::String(b)) => a == b,
        _ => return Err(mismatch(op, &l, &r)),
    };
    Ok(PlainValue::Bool(if op == BinaryOperator::Eq { equal } else { !equal }))
}

fn logic(op: BinaryOperator, l: PlainValue, r: PlainValue) -> Result<PlainValue, RuntimeError> {
    let (PlainValue::Bool(a), PlainValue::Bool(b)) = (&l, &r) else { return Err(mismatch(op, &l, &r)) };
    match op {
        BinaryOperator::And => Ok(PlainValue::Bool(*a && *b)),
        BinaryOperator::Or => Ok(PlainValue::Bool(*a || *b)),
        _ => Err(mismatch(op, &l, &r)),
    }
}

// ─── Evaluator ────────────────────────────────────────────────────────────────

/// Adds unary and binary operators, function calls through the context, and
/// attribute access on maps. Indexing and splats stay unsupported.
#[derive(Default)]
pub struct OperatorEvaluator {
    binops: BinopRegistry,
}

impl OperatorEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binops(binops: BinopRegistry) -> Self {
        Self { binops }
    }

    fn plain(&self, value: Value, op: &'static str) -> Result<PlainValue, RuntimeError> {
        value.into_plain().map_err(|v| RuntimeError::InvalidOperand { op, kind: v.kind() })
    }
}

impl Evaluator for OperatorEvaluator {
    fn eval_unary_op(&self, unary: &UnaryOp, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        let op = unary.op.as_str();
        let operand = self.plain(self.evaluate(&unary.expr, ctx)?, op)?;
        let result = match (unary.op, operand) {
            (UnaryOperator::Neg, PlainValue::Int(i)) => i.checked_neg().map(PlainValue::Int).ok_or_else(|| {
                RuntimeError::Arithmetic { op, message: "integer overflow".to_string() }
            })?,
            (UnaryOperator::Neg, PlainValue::Float(f)) => PlainValue::Float(-f),
            (UnaryOperator::Not, PlainValue::Bool(b)) => PlainValue::Bool(!b),
            (_, other) => return Err(RuntimeError::InvalidOperand { op, kind: other.kind() }),
        };
        Ok(Value::Plain(result))
    }

    /// Both sides are always evaluated, left first.
    fn eval_binary_op(&self, binary: &BinaryOp, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        let op = binary.op.as_str();
        let l = self.plain(self.evaluate(&binary.left, ctx)?, op)?;
        let r = self.plain(self.evaluate(&binary.right, ctx)?, op)?;
        let (lk, rk) = (l.kind(), r.kind());
        match self.binops.eval(binary.op, l, r) {
            Some(result) => result.map(Value::Plain),
            None => Err(RuntimeError::TypeMismatch { op, left: lk, right: rk }),
        }
    }

    fn eval_function_call(&self, call: &FunctionCall, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        let args = call.args
            .iter()
            .map(|a| self.evaluate(a, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let function = ctx.get_function(&call.name)?;
        Ok(function.call(&args)?)
    }

    fn eval_get_attr(&self, get: &GetAttr, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        match self.evaluate(&get.on, ctx)? {
            Value::Map(map) => match map.get(&get.name) {
                Some(v) => Ok(Value::Plain(v.clone())),
                None => Err(ConfigurationError::new(&ctx, format!("map has no key {:?}", get.name)).into()),
            },
            other => Err(RuntimeError::InvalidOperand { op: ".", kind: other.kind() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use crate::runtime::configurable::{Bare, Fallback, Function};
    use crate::syntax::ast::{Expression, Stmt};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Vars;

    fn upper(args: &[Value]) -> Result<Value, ConfigurationError> {
        match args {
            [v] => v.as_str()
                .map(|s| Value::from(s.to_uppercase()))
                .ok_or_else(|| ConfigurationError::new(&"upper", "expected one string")),
            _ => Err(ConfigurationError::new(&"upper", "expected one string")),
        }
    }

    impl Configurable for Vars {
        fn set_attribute(&mut self, attr: &str, value: Value) -> Result<(), ConfigurationError> {
            Fallback::of(self).set_attribute(attr, value)
        }
        fn get_attribute(&self, attr: &str) -> Result<Value, ConfigurationError> {
            match attr {
                "addend" => Ok(Value::from(10)),
                "server" => {
                    let map: IndexMap<String, PlainValue> =
                        [("port".to_string(), PlainValue::Int(80))].into_iter().collect();
                    Ok(Value::Map(map))
                }
                _ => Fallback::of(self).get_attribute(attr),
            }
        }
        fn start_block(&mut self, name: &str, args: &[Value]) -> Result<Box<dyn Configurable>, ConfigurationError> {
            Fallback::of(self).start_block(name, args)
        }
        fn end_block(&mut self, name: &str, args: &[Value], block: Box<dyn Configurable>) -> Result<(), ConfigurationError> {
            Fallback::of(self).end_block(name, args, block)
        }
        fn get_function(&self, name: &str) -> Result<&dyn Function, ConfigurationError> {
            match name {
                "upper" => Ok(&upper),
                _ => Fallback::of(self).get_function(name),
            }
        }
        fn validate(&self) -> Result<(), ConfigurationError> {
            Ok(())
        }
    }

    /// Evaluates the value of `v = <src>`.
    fn eval(src: &str) -> Result<Value, RuntimeError> {
        let module = parse(&format!("v = {src}")).expect("parse failed");
        let Some(Stmt::Attribute(attr)) = module.body.first() else { panic!("expected attribute") };
        OperatorEvaluator::new().evaluate(&attr.value, &Vars)
    }

    #[test]
    fn grouping_follows_parse_shape() {
        // 1 + (10 * (2 - 1)), not (1 + 10 * 2) - 1
        assert_eq!(eval("1 + addend * 2 - 1"), Ok(Value::from(11)));
        assert_eq!(eval("1 + (addend * 2) - 1"), Ok(Value::from(20)));
    }

    #[test]
    fn int_and_float_do_not_mix() {
        assert_eq!(eval("1.5 * 2.0"), Ok(Value::from(3.0)));
        assert_eq!(
            eval("1 + 2.0"),
            Err(RuntimeError::TypeMismatch { op: "+", left: "int", right: "float" }),
        );
    }

    #[test]
    fn strings_do_not_concatenate() {
        assert_eq!(
            eval("\"a\" + \"b\""),
            Err(RuntimeError::TypeMismatch { op: "+", left: "string", right: "string" }),
        );
        assert_eq!(eval("\"a\" < \"b\""), Ok(Value::from(true)));
    }

    #[test]
    fn integer_edge_cases() {
        assert_eq!(eval("7 / 2"), Ok(Value::from(3)));
        assert_eq!(eval("7 % 0"), Err(RuntimeError::Arithmetic { op: "%", message: "division by zero".into() }));
        assert_eq!(
            eval("9223372036854775807 + 1"),
            Err(RuntimeError::Arithmetic { op: "+", message: "integer overflow".into() }),
        );
    }

    #[test]
    fn comparison_and_logic() {
        assert_eq!(eval("(addend >= 10) && (addend != 11)"), Ok(Value::from(true)));
        // right-nested: addend >= (10 && true)
        assert_eq!(
            eval("addend >= 10 && true"),
            Err(RuntimeError::TypeMismatch { op: "&&", left: "int", right: "bool" }),
        );
        assert_eq!(eval("null == null"), Ok(Value::from(true)));
        assert_eq!(
            eval("true || 1"),
            Err(RuntimeError::TypeMismatch { op: "||", left: "bool", right: "int" }),
        );
    }

    #[test]
    fn unary() {
        assert_eq!(eval("-addend"), Ok(Value::from(-10)));
        assert_eq!(eval("!false"), Ok(Value::from(true)));
        assert_eq!(eval("!1"), Err(RuntimeError::InvalidOperand { op: "!", kind: "int" }));
    }

    #[test]
    fn collections_are_not_operands() {
        assert_eq!(eval("[1] == [1]"), Err(RuntimeError::InvalidOperand { op: "==", kind: "list" }));
    }

    #[test]
    fn function_calls_go_through_context() {
        assert_eq!(eval("upper(\"hi\")"), Ok(Value::from("HI")));
        let err = eval("lower(\"hi\")").unwrap_err();
        assert_eq!(err.as_configuration().map(|e| e.message.as_str()), Some("function \"lower\" does not exist"));
    }

    #[test]
    fn get_attr_on_maps() {
        assert_eq!(eval("server.port"), Ok(Value::from(80)));
        assert!(eval("server.host").unwrap_err().as_configuration().is_some());
        assert_eq!(eval("addend.x"), Err(RuntimeError::InvalidOperand { op: ".", kind: "int" }));
    }

    #[test]
    fn index_and_splat_stay_unsupported() {
        let expr = Expression::get_index(Expression::ident("server"), 0);
        assert_eq!(
            OperatorEvaluator::new().evaluate(&expr, &Bare),
            Err(RuntimeError::UnsupportedExpression { kind: "GetIndex" }),
        );
    }

    #[test]
    fn custom_registry() {
        fn concat(_: BinaryOperator, l: PlainValue, r: PlainValue) -> Result<PlainValue, RuntimeError> {
            match (l, r) {
                (PlainValue::String(a), PlainValue::String(b)) => Ok(PlainValue::String(a + &b)),
                _ => unreachable!("registered for strings only"),
            }
        }
        let mut binops = BinopRegistry::default();
        binops.register(BinaryOperator::Add, "string", "string", concat);
        let expr = Expression::binary(BinaryOperator::Add, Expression::literal("a"), Expression::literal("b"));
        assert_eq!(OperatorEvaluator::with_binops(binops).evaluate(&expr, &Bare), Ok(Value::from("ab")));
    }
}
