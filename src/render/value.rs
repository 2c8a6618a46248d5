//! Dynamic values visible to template expressions

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use super::error::EvalError;
use crate::template::ast::BinaryOp;
use crate::theme::Rgb;

/// Largest string (in bytes) or list an expression may build
pub const MAX_SEQUENCE_LEN: usize = 1 << 20;

/// A value in the render context or produced by an expression
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Color(Rgb),
}

impl Value {
    /// Build a map value from key/value pairs, keeping their order
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Color(_) => "color",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Color(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The map key this value addresses, if it can address one.
    ///
    /// Numbers address the key spelled the same way, so `m[5]` finds `"5"`.
    pub fn key_string(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }

    /// Equality used by `==`, `in` and `!=`: numbers compare across int/float
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    fn compare(&self, other: &Value, op: BinaryOp) -> Result<Ordering, EvalError> {
        let ordering = match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        };
        ordering.ok_or_else(|| EvalError::operands(op, self, other))
    }

    /// Apply a binary operator other than the short-circuiting `and`/`or`
    pub fn binary(&self, op: BinaryOp, rhs: &Value) -> Result<Value, EvalError> {
        use Value::*;

        match op {
            BinaryOp::Eq => return Ok(Bool(self.loose_eq(rhs))),
            BinaryOp::NotEq => return Ok(Bool(!self.loose_eq(rhs))),
            BinaryOp::Lt => return Ok(Bool(self.compare(rhs, op)? == Ordering::Less)),
            BinaryOp::LtEq => return Ok(Bool(self.compare(rhs, op)? != Ordering::Greater)),
            BinaryOp::Gt => return Ok(Bool(self.compare(rhs, op)? == Ordering::Greater)),
            BinaryOp::GtEq => return Ok(Bool(self.compare(rhs, op)? != Ordering::Less)),
            BinaryOp::In => return rhs.contains(self).map(Bool),
            BinaryOp::NotIn => return rhs.contains(self).map(|found| Bool(!found)),
            _ => {}
        }

        match (op, self, rhs) {
            (BinaryOp::Add, Str(a), Str(b)) => Ok(Str(format!("{}{}", a, b))),
            (BinaryOp::Add, List(a), List(b)) => Ok(List(a.iter().chain(b).cloned().collect())),
            (BinaryOp::Mul, Str(s), Int(n)) | (BinaryOp::Mul, Int(n), Str(s)) => {
                let count = u128::try_from(*n).unwrap_or(0);
                let size = s.len() as u128 * count;
                if size > MAX_SEQUENCE_LEN as u128 {
                    return Err(EvalError::TooLarge {
                        size,
                        limit: MAX_SEQUENCE_LEN,
                    });
                }
                Ok(Str(s.repeat(count as usize)))
            }
            (_, Int(a), Int(b)) => int_arithmetic(op, *a, *b)
                .ok_or_else(|| EvalError::operands(op, self, rhs))?,
            _ => match (self.as_f64(), rhs.as_f64()) {
                (Some(a), Some(b)) => float_arithmetic(op, a, b)
                    .ok_or_else(|| EvalError::operands(op, self, rhs))?,
                _ => Err(EvalError::operands(op, self, rhs)),
            },
        }
    }

    /// Membership test for `item in self`
    fn contains(&self, item: &Value) -> Result<bool, EvalError> {
        match self {
            Value::List(items) => Ok(items.iter().any(|v| v.loose_eq(item))),
            Value::Map(entries) => Ok(item
                .key_string()
                .is_some_and(|key| entries.contains_key(&key))),
            Value::Str(haystack) => match item {
                Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
                _ => Err(EvalError::operands(BinaryOp::In, item, self)),
            },
            _ => Err(EvalError::operands(BinaryOp::In, item, self)),
        }
    }
}

/// Integer arithmetic; `None` for operators that do not apply.
/// Overflow falls back to float arithmetic.
fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> Option<Result<Value, EvalError>> {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => return float_arithmetic(op, a as f64, b as f64),
        BinaryOp::FloorDiv | BinaryOp::Rem if b == 0 => {
            return Some(Err(EvalError::DivisionByZero))
        }
        BinaryOp::FloorDiv => a
            .checked_div(b)
            .map(|q| if a % b != 0 && ((a < 0) != (b < 0)) { q - 1 } else { q }),
        // The remainder takes the sign of the divisor
        BinaryOp::Rem => a
            .checked_rem(b)
            .map(|r| if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }),
        _ => return None,
    };
    Some(Ok(match checked {
        Some(n) => Value::Int(n),
        None => return float_arithmetic(op, a as f64, b as f64),
    }))
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Option<Result<Value, EvalError>> {
    let divides = matches!(op, BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Rem);
    if divides && b == 0.0 {
        return Some(Err(EvalError::DivisionByZero));
    }
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Rem => a - b * (a / b).floor(),
        _ => return None,
    };
    Some(Ok(Value::Float(result)))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Color(c) => write!(f, "{}", c),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Rgb> for Value {
    fn from(c: Rgb) -> Self {
        Value::Color(c)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::list(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a template value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Value, E> {
        Ok(Value::Int(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Value, E> {
        Ok(i64::try_from(n).map_or(Value::Float(n as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, x: f64) -> Result<Value, E> {
        Ok(Value::Float(x))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Str(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Str(s))
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries = IndexMap::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            entries.insert(key, value);
        }
        Ok(Value::Map(entries))
    }
}
