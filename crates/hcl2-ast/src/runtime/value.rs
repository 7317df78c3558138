use std::fmt;

use indexmap::IndexMap;

use crate::syntax::ast::LiteralValue;

/// A scalar value. Same closed set as literal values in the AST.
pub type PlainValue = LiteralValue;

/// What expressions evaluate to and what contexts exchange with the engine.
///
/// Collections hold scalars only; there is no nesting.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Plain(PlainValue),
    List(Vec<PlainValue>),
    Map(IndexMap<String, PlainValue>),
}

impl Value {
    pub fn null() -> Self {
        Value::Plain(PlainValue::Null)
    }

    /// Kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Plain(p) => p.kind(),
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Plain(PlainValue::Null))
    }

    pub fn as_plain(&self) -> Option<&PlainValue> {
        match self {
            Value::Plain(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Plain(PlainValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Plain(PlainValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Floats only; ints are not widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Plain(PlainValue::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Plain(PlainValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PlainValue]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, PlainValue>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Unwraps a scalar, handing collections back unchanged.
    pub fn into_plain(self) -> Result<PlainValue, Value> {
        match self {
            Value::Plain(p) => Ok(p),
            other => Err(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn plain(p: &PlainValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match p {
                PlainValue::Null => f.write_str("null"),
                PlainValue::Bool(b) => write!(f, "{b}"),
                PlainValue::Int(i) => write!(f, "{i}"),
                PlainValue::Float(x) => write!(f, "{x:?}"),
                PlainValue::String(s) => write!(f, "{s:?}"),
            }
        }
        match self {
            Value::Plain(p) => plain(p, f),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    plain(item, f)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{key:?}: ")?;
                    plain(item, f)?;
                }
                f.write_str("}")
            }
        }
    }
}

// ─── Conversions ──────────────────────────────────────────────────────────────

impl From<PlainValue> for Value {
    fn from(v: PlainValue) -> Self { Value::Plain(v) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Plain(v.into()) }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::Plain(v.into()) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::Plain(v.into()) }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Plain(v.into()) }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::Plain(v.into()) }
}

impl From<String> for Value {
    fn from(v: String) -> Self { Value::Plain(v.into()) }
}

impl From<Vec<PlainValue>> for Value {
    fn from(v: Vec<PlainValue>) -> Self { Value::List(v) }
}

impl From<IndexMap<String, PlainValue>> for Value {
    fn from(v: IndexMap<String, PlainValue>) -> Self { Value::Map(v) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_do_not_coerce() {
        let v = Value::from(3);
        assert_eq!(v.as_int(), Some(3));
        assert_eq!(v.as_float(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::null().is_null());
    }

    #[test]
    fn kinds() {
        assert_eq!(Value::from(1.5).kind(), "float");
        assert_eq!(Value::List(vec![]).kind(), "list");
        assert_eq!(Value::Map(IndexMap::new()).kind(), "map");
    }

    #[test]
    fn display() {
        let map: IndexMap<String, PlainValue> =
            [("a".to_string(), PlainValue::Int(1)), ("b".to_string(), PlainValue::Null)].into_iter().collect();
        assert_eq!(Value::from(map).to_string(), r#"{"a": 1, "b": null}"#);
        assert_eq!(Value::from(vec![PlainValue::Bool(true), "s".into()]).to_string(), r#"[true, "s"]"#);
    }

    #[test]
    fn into_plain_keeps_collections() {
        assert_eq!(Value::from(true).into_plain(), Ok(PlainValue::Bool(true)));
        assert_eq!(Value::List(vec![]).into_plain(), Err(Value::List(vec![])));
    }
}
