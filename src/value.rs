//! Dynamic values passed to mixin constructors and members.

use crate::error::CompositionError;

/// A value flowing through constructor arguments, member arguments and results.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats; nothing else converts.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
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

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Typed access to positional arguments.
///
/// Missing arguments and type mismatches both surface as
/// [`CompositionError::BadArgument`].
pub trait Args {
    fn int(&self, index: usize) -> Result<i64, CompositionError>;
    fn float(&self, index: usize) -> Result<f64, CompositionError>;
    fn bool(&self, index: usize) -> Result<bool, CompositionError>;
    fn str(&self, index: usize) -> Result<&str, CompositionError>;
}

impl Args for [Value] {
    fn int(&self, index: usize) -> Result<i64, CompositionError> {
        self.get(index)
            .and_then(Value::as_int)
            .ok_or(CompositionError::BadArgument { index, expected: "int" })
    }

    fn float(&self, index: usize) -> Result<f64, CompositionError> {
        self.get(index)
            .and_then(Value::as_float)
            .ok_or(CompositionError::BadArgument { index, expected: "float" })
    }

    fn bool(&self, index: usize) -> Result<bool, CompositionError> {
        self.get(index)
            .and_then(Value::as_bool)
            .ok_or(CompositionError::BadArgument { index, expected: "bool" })
    }

    fn str(&self, index: usize) -> Result<&str, CompositionError> {
        self.get(index)
            .and_then(Value::as_str)
            .ok_or(CompositionError::BadArgument { index, expected: "string" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_widen_to_floats() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(1.5).as_int(), None);
    }

    #[test]
    fn args_report_index_and_expected_type() {
        let args = [Value::from(5), Value::from("label")];

        assert_eq!(args.int(0).unwrap(), 5);
        assert_eq!(args.str(1).unwrap(), "label");
        assert!(matches!(
            args.int(1),
            Err(CompositionError::BadArgument { index: 1, expected: "int" })
        ));
        assert!(matches!(
            args.bool(7),
            Err(CompositionError::BadArgument { index: 7, expected: "bool" })
        ));
    }
}
