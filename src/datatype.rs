// used for date and date-time literals
use chrono::{NaiveDate, NaiveDateTime};
// used for decimal numbers
use bigdecimal::BigDecimal;

// used to print out readable forms of a data type
use std::fmt;
// used to indicate that data types need to be hashable
use std::hash::{Hash, Hasher};
use std::ops;

use crate::construct::{Literal, Term};
use crate::vocab;

/// A native kind an adapter can hand to the builder. Each kind has a fixed
/// datatype IRI and a canonical lexical form.
pub trait DataType: fmt::Display {
    // static stuff which needs to be implemented downstream
    const DATA_TYPE: &'static str;
    fn lexical(&self) -> String {
        self.to_string()
    }
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn to_literal(&self) -> Literal {
        Literal::new(self.lexical(), Self::DATA_TYPE)
    }
}

// ------------- Data Types --------------
impl DataType for String {
    const DATA_TYPE: &'static str = vocab::XSD_STRING;
}
impl DataType for i64 {
    const DATA_TYPE: &'static str = vocab::XSD_LONG;
}
impl DataType for bool {
    const DATA_TYPE: &'static str = vocab::XSD_BOOLEAN;
}
impl DataType for f64 {
    const DATA_TYPE: &'static str = vocab::XSD_DOUBLE;
    fn lexical(&self) -> String {
        if self.is_nan() {
            "NaN".to_string()
        } else if self.is_infinite() && self.is_sign_positive() {
            "INF".to_string()
        } else if self.is_infinite() {
            "-INF".to_string()
        } else {
            format!("{:E}", self)
        }
    }
}
impl DataType for Decimal {
    const DATA_TYPE: &'static str = vocab::XSD_DECIMAL;
}
impl DataType for NaiveDateTime {
    const DATA_TYPE: &'static str = vocab::XSD_DATE_TIME;
    fn lexical(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}
impl DataType for NaiveDate {
    const DATA_TYPE: &'static str = vocab::XSD_DATE;
    fn lexical(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}
impl DataType for Binary {
    const DATA_TYPE: &'static str = vocab::XSD_HEX_BINARY;
}

// Special types below
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Debug)]
pub struct Decimal(pub BigDecimal);

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.normalized().to_string().hash(state);
    }
}
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl ops::Deref for Decimal {
    type Target = BigDecimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Raw bytes, written as upper case `xsd:hexBinary`.
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Hash, Debug)]
pub struct Binary(pub Vec<u8>);

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

// ------------- Value --------------
/// Anything an adapter may attach to a slot. `Null` is accepted everywhere and
/// writes nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Boolean(bool),
    Double(f64),
    Decimal(Decimal),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Binary(Binary),
    /// A literal the adapter typed itself, e.g. a language tagged string.
    Literal(Literal),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn data_type(&self) -> Option<&str> {
        match self {
            Value::Null => None,
            Value::String(v) => Some(v.data_type()),
            Value::Integer(v) => Some(v.data_type()),
            Value::Boolean(v) => Some(v.data_type()),
            Value::Double(v) => Some(v.data_type()),
            Value::Decimal(v) => Some(v.data_type()),
            Value::DateTime(v) => Some(v.data_type()),
            Value::Date(v) => Some(v.data_type()),
            Value::Binary(v) => Some(v.data_type()),
            Value::Literal(l) => Some(l.datatype()),
        }
    }
    /// The literal term for this value, `None` for `Null`.
    pub fn to_term(&self) -> Option<Term> {
        let literal = match self {
            Value::Null => return None,
            Value::String(v) => v.to_literal(),
            Value::Integer(v) => v.to_literal(),
            Value::Boolean(v) => v.to_literal(),
            Value::Double(v) => v.to_literal(),
            Value::Decimal(v) => v.to_literal(),
            Value::DateTime(v) => v.to_literal(),
            Value::Date(v) => v.to_literal(),
            Value::Binary(v) => v.to_literal(),
            Value::Literal(l) => l.clone(),
        };
        Some(Term::Literal(literal))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}
impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::Decimal(Decimal(v))
    }
}
impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}
impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(Binary(v))
    }
}
impl From<Literal> for Value {
    fn from(v: Literal) -> Self {
        Value::Literal(v)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
