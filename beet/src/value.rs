//! Values read from and written to buffers.
//!
//! Every descriptor operates over the closed [Value] sum type. Typed domain
//! objects cross into it through the `From`/`TryFrom` conversions below and
//! through the getters and constructors of [crate::BeetStruct].

use crate::Error;
use bytes::Bytes;
use paste::paste;
use std::collections::BTreeMap;

/// Named field values of a record, as produced by reading a struct.
pub type Record = BTreeMap<String, Value>;

/// A decoded (or to be encoded) value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Str(String),
    Bytes(Bytes),
    Seq(Vec<Value>),
    Map(BTreeMap<Value, Value>),
    Record(Record),
}

impl Value {
    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::U128(_) => "u128",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::I128(_) => "i128",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Seq(_) => "seq",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }

    fn unexpected(&self, expected: &'static str) -> Error {
        Error::UnexpectedValue {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_str(&self) -> Result<&str, Error> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.unexpected("string")),
        }
    }

    pub fn as_bytes(&self) -> Result<&Bytes, Error> {
        match self {
            Self::Bytes(b) => Ok(b),
            other => Err(other.unexpected("bytes")),
        }
    }

    pub fn as_seq(&self) -> Result<&[Value], Error> {
        match self {
            Self::Seq(items) => Ok(items),
            other => Err(other.unexpected("seq")),
        }
    }

    pub fn as_map(&self) -> Result<&BTreeMap<Value, Value>, Error> {
        match self {
            Self::Map(map) => Ok(map),
            other => Err(other.unexpected("map")),
        }
    }

    pub fn as_record(&self) -> Result<&Record, Error> {
        match self {
            Self::Record(record) => Ok(record),
            other => Err(other.unexpected("record")),
        }
    }
}

// Scalar conversions
macro_rules! impl_scalar_value {
    ($type:ident, $variant:ident) => {
        paste! {
            impl From<$type> for Value {
                #[inline]
                fn from(v: $type) -> Self {
                    Self::$variant(v)
                }
            }

            impl TryFrom<Value> for $type {
                type Error = Error;

                #[inline]
                fn try_from(value: Value) -> Result<Self, Error> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(other.unexpected(stringify!($type))),
                    }
                }
            }

            impl Value {
                #[doc = "Returns the inner `" $type "`, or [Error::UnexpectedValue] for any other variant."]
                #[inline]
                pub fn [<as_ $type>](&self) -> Result<$type, Error> {
                    match self {
                        Self::$variant(v) => Ok(*v),
                        other => Err(other.unexpected(stringify!($type))),
                    }
                }
            }
        }
    };
}

impl_scalar_value!(bool, Bool);
impl_scalar_value!(u8, U8);
impl_scalar_value!(u16, U16);
impl_scalar_value!(u32, U32);
impl_scalar_value!(u64, U64);
impl_scalar_value!(u128, U128);
impl_scalar_value!(i8, I8);
impl_scalar_value!(i16, I16);
impl_scalar_value!(i32, I32);
impl_scalar_value!(i64, I64);
impl_scalar_value!(i128, I128);

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Error> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other.unexpected("string")),
        }
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl TryFrom<Value> for Bytes {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Error> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(other.unexpected("bytes")),
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<T: TryFrom<Value, Error = Error>> TryFrom<Value> for Vec<T> {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Error> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::try_from).collect(),
            other => Err(other.unexpected("seq")),
        }
    }
}

/// Converts to [Value::Map]. A [Record] is a `BTreeMap` too and converts the same
/// way: wrap it in [Value::Record] to encode it as a struct.
impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(v: BTreeMap<K, V>) -> Self {
        Self::Map(v.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V> TryFrom<Value> for BTreeMap<K, V>
where
    K: TryFrom<Value, Error = Error> + Ord,
    V: TryFrom<Value, Error = Error>,
{
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Error> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| Ok((K::try_from(k)?, V::try_from(v)?)))
                .collect(),
            other => Err(other.unexpected("map")),
        }
    }
}

/// Removes the field `name` from `record` and converts it to `T`.
///
/// Intended for the constructor of a typed [crate::BeetStruct].
pub fn field<T>(record: &mut Record, name: &str) -> Result<T, Error>
where
    T: TryFrom<Value, Error = Error>,
{
    let value = record
        .remove(name)
        .ok_or_else(|| Error::MissingField(name.to_string()))?;
    T::try_from(value)
}
