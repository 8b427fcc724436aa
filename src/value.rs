//! Dynamic host value and scalar coercion.

use core::fmt;
use serde::{Serialize, Serializer};
use std::rc::Rc;

/// Coercion of a host value to the scalar forms used as surrogate keys.
///
/// Returning `None` means the value has no such form; the scalar strategies
/// turn that into `Error::TypeConversion`.
pub trait HostScalar {
    fn as_number(&self) -> Option<f64>;
    fn as_text(&self) -> Option<&str>;
    /// Short type name used in conversion errors.
    fn type_name(&self) -> &'static str;
}

macro_rules! numeric_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl HostScalar for $t {
                #[inline]
                fn as_number(&self) -> Option<f64> {
                    Some(*self as f64)
                }
                fn as_text(&self) -> Option<&str> {
                    None
                }
                fn type_name(&self) -> &'static str {
                    stringify!($t)
                }
            }
        )*
    };
}

numeric_scalar!(i8, i16, i32, u8, u16, u32, f32, f64);

// Integers wider than the f64 mantissa have a number form only when the
// conversion is exact.
macro_rules! wide_integer_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl HostScalar for $t {
                #[inline]
                fn as_number(&self) -> Option<f64> {
                    let n = *self as f64;
                    (n as i128 == *self as i128).then_some(n)
                }
                fn as_text(&self) -> Option<&str> {
                    None
                }
                fn type_name(&self) -> &'static str {
                    stringify!($t)
                }
            }
        )*
    };
}

wide_integer_scalar!(i64, isize, u64, usize);

impl HostScalar for bool {
    fn as_number(&self) -> Option<f64> {
        Some(if *self { 1.0 } else { 0.0 })
    }
    fn as_text(&self) -> Option<&str> {
        None
    }
    fn type_name(&self) -> &'static str {
        "bool"
    }
}

impl HostScalar for str {
    fn as_number(&self) -> Option<f64> {
        None
    }
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
    fn type_name(&self) -> &'static str {
        "str"
    }
}

impl HostScalar for String {
    fn as_number(&self) -> Option<f64> {
        None
    }
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
    fn type_name(&self) -> &'static str {
        "String"
    }
}

impl<T: HostScalar + ?Sized> HostScalar for &T {
    fn as_number(&self) -> Option<f64> {
        (**self).as_number()
    }
    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

/// Opaque handle to a resource owned outside the host heap, such as an
/// open connection. Compares by identity and has no byte form.
#[derive(Clone)]
pub struct ExternalHandle(Rc<str>);

impl ExternalHandle {
    pub fn new(kind: &str) -> Self {
        ExternalHandle(Rc::from(kind))
    }

    pub fn kind(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ExternalHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ExternalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<external {} @ {:p}>", self.0, Rc::as_ptr(&self.0).cast::<u8>())
    }
}

fn refuse_external<S: Serializer>(h: &ExternalHandle, _s: S) -> Result<S::Ok, S::Error> {
    Err(serde::ser::Error::custom(format_args!(
        "external {} handle has no serialized form",
        h.kind()
    )))
}

/// A host value of unknown shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Logical(bool),
    Integer(i32),
    Double(f64),
    Text(String),
    /// Ordered elements, each optionally named.
    List(Vec<(Option<String>, Value)>),
    #[serde(serialize_with = "refuse_external")]
    External(ExternalHandle),
}

impl Value {
    /// Unnamed list of `items`.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Value::List(items.into_iter().map(|v| (None, v)).collect())
    }

    /// List of named elements.
    pub fn record<I, N>(fields: I) -> Self
    where
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        Value::List(
            fields
                .into_iter()
                .map(|(n, v)| (Some(n.into()), v))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl HostScalar for Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Logical(b) => b.as_number(),
            Value::Integer(i) => i.as_number(),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Logical(_) => "logical",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::External(_) => "external",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Logical(true) => f.write_str("TRUE"),
            Value::Logical(false) => f.write_str("FALSE"),
            Value::Integer(i) => write!(f, "{i}L"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("list(")?;
                for (i, (name, v)) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(name) = name {
                        write!(f, "{name} = ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            Value::External(h) => write!(f, "<external {}>", h.kind()),
        }
    }
}
