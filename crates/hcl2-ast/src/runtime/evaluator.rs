//! Expression evaluation.
//!
//! `Evaluator::evaluate` is an exhaustive match over the expression variants
//! that calls one hook per variant. Only literals, identifiers, arrays and
//! objects have built-in semantics; the remaining hooks fail with
//! `UnsupportedExpression` until a host overrides them.

use indexmap::IndexMap;

use crate::error::RuntimeError;
use crate::runtime::configurable::Configurable;
use crate::runtime::value::{PlainValue, Value};
use crate::syntax::ast::*;

pub trait Evaluator {
    fn evaluate(&self, expr: &Expression, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        match expr {
            Expression::Literal(e) => self.eval_literal(e, ctx),
            Expression::Identifier(e) => self.eval_identifier(e, ctx),
            Expression::Array(e) => self.eval_array(e, ctx),
            Expression::Object(e) => self.eval_object(e, ctx),
            Expression::FunctionCall(e) => self.eval_function_call(e, ctx),
            Expression::GetAttr(e) => self.eval_get_attr(e, ctx),
            Expression::GetIndex(e) => self.eval_get_index(e, ctx),
            Expression::AttrSplat(e) => self.eval_attr_splat(e, ctx),
            Expression::IndexSplat(e) => self.eval_index_splat(e, ctx),
            Expression::UnaryOp(e) => self.eval_unary_op(e, ctx),
            Expression::BinaryOp(e) => self.eval_binary_op(e, ctx),
        }
    }

    fn eval_literal(&self, literal: &Literal, _ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Ok(Value::Plain(literal.value.clone()))
    }

    /// Resolved by the context; an unknown name is the context's error.
    fn eval_identifier(&self, ident: &Identifier, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Ok(ctx.get_attribute(&ident.name)?)
    }

    fn eval_array(&self, array: &Array, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        array.values
            .iter()
            .map(|v| self.evaluate(v, ctx).and_then(element))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn eval_object(&self, object: &Object, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        object.fields
            .iter()
            .map(|(k, v)| self.evaluate(v, ctx).and_then(element).map(|v| (k.clone(), v)))
            .collect::<Result<IndexMap<_, _>, _>>()
            .map(Value::Map)
    }

    fn eval_function_call(&self, _call: &FunctionCall, _ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Err(unsupported("FunctionCall"))
    }

    fn eval_get_attr(&self, _get: &GetAttr, _ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Err(unsupported("GetAttr"))
    }

    fn eval_get_index(&self, _get: &GetIndex, _ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Err(unsupported("GetIndex"))
    }

    fn eval_attr_splat(&self, _splat: &AttrSplat, _ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Err(unsupported("AttrSplat"))
    }

    fn eval_index_splat(&self, _splat: &IndexSplat, _ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Err(unsupported("IndexSplat"))
    }

    fn eval_unary_op(&self, _op: &UnaryOp, _ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Err(unsupported("UnaryOp"))
    }

    fn eval_binary_op(&self, _op: &BinaryOp, _ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
        Err(unsupported("BinaryOp"))
    }
}

/// Literals, identifiers, arrays and objects only.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseEvaluator;

impl Evaluator for BaseEvaluator {}

fn unsupported(kind: &'static str) -> RuntimeError {
    RuntimeError::UnsupportedExpression { kind }
}

/// Collection members must be scalars.
fn element(value: Value) -> Result<PlainValue, RuntimeError> {
    value.into_plain().map_err(|v| RuntimeError::NestedCollection { kind: v.kind() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use crate::runtime::configurable::{Bare, Fallback, Function};
    use pretty_assertions::assert_eq;

    /// Exposes `port = 8080` and nothing else.
    #[derive(Debug)]
    struct Vars;

    impl Configurable for Vars {
        fn set_attribute(&mut self, attr: &str, value: Value) -> Result<(), ConfigurationError> {
            Fallback::of(self).set_attribute(attr, value)
        }
        fn get_attribute(&self, attr: &str) -> Result<Value, ConfigurationError> {
            match attr {
                "port" => Ok(Value::from(8080)),
                "hosts" => Ok(Value::List(vec!["a".into()])),
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
            Fallback::of(self).get_function(name)
        }
        fn validate(&self) -> Result<(), ConfigurationError> {
            Ok(())
        }
    }

    fn eval(expr: &Expression) -> Result<Value, RuntimeError> {
        BaseEvaluator.evaluate(expr, &Vars)
    }

    #[test]
    fn literal_is_verbatim() {
        assert_eq!(eval(&Expression::literal(42.5)), Ok(Value::from(42.5)));
        assert_eq!(eval(&Expression::null()), Ok(Value::null()));
    }

    #[test]
    fn identifier_resolves_through_context() {
        assert_eq!(eval(&Expression::ident("port")), Ok(Value::from(8080)));
    }

    #[test]
    fn unknown_identifier_is_configuration_error() {
        let err = BaseEvaluator.evaluate(&Expression::ident("nope"), &Bare).unwrap_err();
        let cfg = err.as_configuration().expect("configuration error");
        assert_eq!(cfg.message, "attribute \"nope\" does not exist");
        assert_eq!(cfg.context, "Bare");
    }

    #[test]
    fn array_and_object() {
        let arr = Expression::array(vec![Expression::literal(1), Expression::ident("port")]);
        assert_eq!(eval(&arr), Ok(Value::List(vec![PlainValue::Int(1), PlainValue::Int(8080)])));

        let obj = Expression::object([("b", Expression::literal("x")), ("a", Expression::literal(true))]);
        let value = eval(&obj).expect("object evaluates");
        let keys: Vec<_> = value.as_map().expect("map").keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn failing_element_fails_the_array() {
        let arr = Expression::array(vec![Expression::literal(1), Expression::ident("missing")]);
        assert!(matches!(eval(&arr), Err(RuntimeError::Configuration(_))));
    }

    #[test]
    fn nested_collections_are_rejected() {
        let nested = Expression::array(vec![Expression::array(vec![])]);
        assert_eq!(eval(&nested), Err(RuntimeError::NestedCollection { kind: "list" }));

        let via_ident = Expression::object([("h", Expression::ident("hosts"))]);
        assert_eq!(eval(&via_ident), Err(RuntimeError::NestedCollection { kind: "list" }));
    }

    #[test]
    fn other_variants_are_unsupported() {
        let one = || Expression::literal(1);
        let cases = [
            (Expression::call("f", vec![]), "FunctionCall"),
            (Expression::get_attr(Expression::ident("port"), "x"), "GetAttr"),
            (Expression::get_index(one(), 0), "GetIndex"),
            (Expression::attr_splat(one()), "AttrSplat"),
            (Expression::index_splat(one()), "IndexSplat"),
            (Expression::unary(UnaryOperator::Neg, one()), "UnaryOp"),
            (Expression::binary(BinaryOperator::Add, one(), one()), "BinaryOp"),
        ];
        for (expr, kind) in cases {
            assert_eq!(eval(&expr), Err(RuntimeError::UnsupportedExpression { kind }));
        }
    }

    #[test]
    fn hooks_can_be_overridden() {
        struct Negating;
        impl Evaluator for Negating {
            fn eval_unary_op(&self, op: &UnaryOp, ctx: &dyn Configurable) -> Result<Value, RuntimeError> {
                match self.evaluate(&op.expr, ctx)?.as_int() {
                    Some(i) => Ok(Value::from(-i)),
                    None => Err(RuntimeError::UnsupportedExpression { kind: "UnaryOp" }),
                }
            }
        }
        let expr = Expression::unary(UnaryOperator::Neg, Expression::literal(5));
        assert_eq!(Negating.evaluate(&expr, &Bare), Ok(Value::from(-5)));
        assert_eq!(Negating.evaluate(&Expression::literal("s"), &Bare), Ok(Value::from("s")));
    }
}
