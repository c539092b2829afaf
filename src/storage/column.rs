use crate::errors::Error;
use bincode::{Decode, Encode};
use std::fmt;

/// Declared kind of a table column.
#[derive(Encode, Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Integer, // i64
    Float,   // f64
    Boolean,
}

/// A single stored cell value.
#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ColumnType {
    /// Parses a column type name, accepting the short aliases the shell uses.
    pub fn parse(name: &str) -> Result<ColumnType, Error> {
        match name.to_lowercase().as_str() {
            "string" | "str" | "text" => Ok(ColumnType::String),
            "integer" | "int" => Ok(ColumnType::Integer),
            "float" | "double" => Ok(ColumnType::Float),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            _ => Err(err!(
                Syntax,
                "Unsupported column type: {}. Use string, integer, float or boolean.",
                name
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        }
    }
}

impl ColumnValue {
    /// Equality used by row filters: integers and floats compare numerically,
    /// every other pairing must match in kind and value.
    pub fn matches(&self, other: &ColumnValue) -> bool {
        match (self, other) {
            (ColumnValue::Int(a), ColumnValue::Float(b))
            | (ColumnValue::Float(b), ColumnValue::Int(a)) => {
                // 2^63 is the first float past i64::MAX; `as` saturates there.
                b.fract() == 0.0
                    && *b >= i64::MIN as f64
                    && *b < i64::MAX as f64
                    && *b as i64 == *a
            }
            _ => self == other,
        }
    }

    pub fn type_(&self) -> ColumnType {
        match self {
            ColumnValue::Str(_) => ColumnType::String,
            ColumnValue::Int(_) => ColumnType::Integer,
            ColumnValue::Float(_) => ColumnType::Float,
            ColumnValue::Bool(_) => ColumnType::Boolean,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Str(v) => write!(f, "{}", v),
            ColumnValue::Int(v) => write!(f, "{}", v),
            ColumnValue::Float(v) => write!(f, "{}", v),
            ColumnValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::Str(v.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::Str(v)
    }
}

impl From<i64> for ColumnValue {
    fn from(v: i64) -> Self {
        ColumnValue::Int(v)
    }
}

impl From<f64> for ColumnValue {
    fn from(v: f64) -> Self {
        ColumnValue::Float(v)
    }
}

impl From<bool> for ColumnValue {
    fn from(v: bool) -> Self {
        ColumnValue::Bool(v)
    }
}
