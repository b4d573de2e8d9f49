//! The fixed/fixable type algebra.
//!
//! A [Beet] describes how a value is laid out on the wire. It is either
//! [Beet::Fixed], whose byte size is known up front, or [Beet::Fixable], whose
//! byte size depends on the concrete instance. A fixable beet must be resolved
//! against a value (before writing) or a byte span (before reading) to obtain a
//! [FixedSizeBeet] describing that instance exactly. Only a [FixedSizeBeet] can
//! read or write bytes.
//!
//! Both resolution paths must agree: resolving from a value and resolving from
//! the bytes that value encodes to yield descriptors with identical byte sizes.

use crate::{Error, Value};
use std::{fmt::Debug, sync::Arc};

/// Read/write contract of a codec with a known byte size.
///
/// `write` and `read` operate at an absolute `offset` within a buffer that the
/// caller sized beforehand; neither grows nor shrinks it.
pub trait FixedBeet: Debug + Send + Sync {
    /// Number of bytes this codec occupies in a buffer.
    ///
    /// Constant for the lifetime of the instance.
    fn byte_size(&self) -> usize;

    /// Describes the de/serialized type, for diagnostics only.
    fn description(&self) -> String;

    /// Writes `value` into `buf` starting at `offset`.
    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error>;

    /// Reads a value from `buf` starting at `offset`.
    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error>;
}

/// Additional layout information exposed by arrays, strings, and maps.
pub trait ElementCollection: FixedBeet {
    /// Byte size of each element.
    ///
    /// Only an average for collections whose elements vary in size.
    fn element_byte_size(&self) -> usize;

    /// Number of elements (or bytes, for strings).
    fn length(&self) -> usize;

    /// Byte size of the element count stored before the elements, if any.
    fn len_prefix_byte_size(&self) -> usize;
}

/// A codec whose byte size is known without inspecting any value.
#[derive(Clone, Debug)]
pub enum FixedSizeBeet {
    Scalar(Arc<dyn FixedBeet>),
    Collection(Arc<dyn ElementCollection>),
}

impl FixedSizeBeet {
    /// Wraps a scalar codec.
    pub fn scalar(beet: impl FixedBeet + 'static) -> Self {
        Self::Scalar(Arc::new(beet))
    }

    /// Wraps a collection codec.
    pub fn collection(beet: impl ElementCollection + 'static) -> Self {
        Self::Collection(Arc::new(beet))
    }

    pub fn byte_size(&self) -> usize {
        match self {
            Self::Scalar(beet) => beet.byte_size(),
            Self::Collection(beet) => beet.byte_size(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Scalar(beet) => beet.description(),
            Self::Collection(beet) => beet.description(),
        }
    }

    pub fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        match self {
            Self::Scalar(beet) => beet.write(buf, offset, value),
            Self::Collection(beet) => beet.write(buf, offset, value),
        }
    }

    pub fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        match self {
            Self::Scalar(beet) => beet.read(buf, offset),
            Self::Collection(beet) => beet.read(buf, offset),
        }
    }

    /// Returns the collection layout, if this is a collection codec.
    pub fn as_collection(&self) -> Option<&dyn ElementCollection> {
        match self {
            Self::Scalar(_) => None,
            Self::Collection(beet) => Some(beet.as_ref()),
        }
    }
}

/// A codec whose byte size depends on the value or data it handles.
///
/// It is _fixable_ in the sense that a [FixedSizeBeet] can be derived from it by
/// walking either the serialized data or the value of one particular instance,
/// discovering the sizes of the root and all nested beets on the way.
pub trait FixableBeet: Debug + Send + Sync {
    /// Describes the de/serialized type, for diagnostics only.
    fn description(&self) -> String;

    /// Derives the fixed layout of the instance serialized in `buf` at `offset`.
    fn to_fixed_from_data(&self, buf: &[u8], offset: usize) -> Result<FixedSizeBeet, Error>;

    /// Derives the fixed layout of `value`.
    fn to_fixed_from_value(&self, value: &Value) -> Result<FixedSizeBeet, Error>;
}

/// What to resolve a [Beet] against.
#[derive(Clone, Copy, Debug)]
pub enum Source<'a> {
    /// Serialized data and the offset at which the instance starts.
    Data(&'a [u8], usize),
    /// The instance itself.
    Value(&'a Value),
}

/// Either a fixed or a fixable codec.
#[derive(Clone, Debug)]
pub enum Beet {
    Fixed(FixedSizeBeet),
    Fixable(Arc<dyn FixableBeet>),
}

impl Beet {
    /// Wraps a fixable codec.
    pub fn fixable(beet: impl FixableBeet + 'static) -> Self {
        Self::Fixable(Arc::new(beet))
    }

    pub fn description(&self) -> String {
        match self {
            Self::Fixed(beet) => beet.description(),
            Self::Fixable(beet) => beet.description(),
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    pub fn is_fixable(&self) -> bool {
        matches!(self, Self::Fixable(_))
    }

    /// Returns the fixed codec, or [Error::UnexpectedValue] if this beet is fixable.
    pub fn assert_fixed(&self) -> Result<&FixedSizeBeet, Error> {
        match self {
            Self::Fixed(beet) => Ok(beet),
            Self::Fixable(_) => Err(Error::UnexpectedValue {
                expected: "fixed beet",
                found: "fixable beet",
            }),
        }
    }

    /// Resolves this beet to a fixed codec for the given source.
    ///
    /// A fixed beet is returned as is.
    pub fn resolve(&self, source: Source<'_>) -> Result<FixedSizeBeet, Error> {
        match source {
            Source::Data(buf, offset) => self.fix_from_data(buf, offset),
            Source::Value(value) => self.fix_from_value(value),
        }
    }

    /// Resolves this beet against the instance serialized in `buf` at `offset`.
    pub fn fix_from_data(&self, buf: &[u8], offset: usize) -> Result<FixedSizeBeet, Error> {
        match self {
            Self::Fixed(beet) => Ok(beet.clone()),
            Self::Fixable(beet) => beet.to_fixed_from_data(buf, offset),
        }
    }

    /// Resolves this beet against `value`.
    pub fn fix_from_value(&self, value: &Value) -> Result<FixedSizeBeet, Error> {
        match self {
            Self::Fixed(beet) => Ok(beet.clone()),
            Self::Fixable(beet) => beet.to_fixed_from_value(value),
        }
    }
}

impl From<FixedSizeBeet> for Beet {
    fn from(beet: FixedSizeBeet) -> Self {
        Self::Fixed(beet)
    }
}

/// A named member of a record whose codec may still need resolution.
///
/// Field order is wire order.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub beet: Beet,
}

impl Field {
    pub fn new(name: impl Into<String>, beet: impl Into<Beet>) -> Self {
        Self {
            name: name.into(),
            beet: beet.into(),
        }
    }
}

/// A named member of a record with a resolved codec.
#[derive(Clone, Debug)]
pub struct FixedField {
    pub name: String,
    pub beet: FixedSizeBeet,
}

impl FixedField {
    pub fn new(name: impl Into<String>, beet: impl Into<FixedSizeBeet>) -> Self {
        Self {
            name: name.into(),
            beet: beet.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Utf8String, U16, U8};

    #[test]
    fn test_fixed_resolves_to_itself() {
        let beet = Beet::from(FixedSizeBeet::from(U16));
        assert!(beet.is_fixed());
        let fixed = beet.resolve(Source::Value(&Value::U16(1))).unwrap();
        assert_eq!(fixed.byte_size(), 2);
        let fixed = beet.resolve(Source::Data(&[], 0)).unwrap();
        assert_eq!(fixed.byte_size(), 2);
        assert!(fixed.as_collection().is_none());
    }

    #[test]
    fn test_fixable_resolution() {
        let beet = Beet::fixable(Utf8String::new());
        assert!(beet.is_fixable());
        assert!(beet.assert_fixed().is_err());

        let value = Value::from("abc");
        let from_value = beet.resolve(Source::Value(&value)).unwrap();
        assert_eq!(from_value.byte_size(), 7);

        let mut buf = vec![0u8; from_value.byte_size()];
        from_value.write(&mut buf, 0, &value).unwrap();
        let from_data = beet.resolve(Source::Data(&buf, 0)).unwrap();
        assert_eq!(from_data.byte_size(), from_value.byte_size());
        assert_eq!(from_data.read(&buf, 0).unwrap(), value);

        let collection = from_data.as_collection().unwrap();
        assert_eq!(collection.length(), 3);
        assert_eq!(collection.element_byte_size(), 1);
        assert_eq!(collection.len_prefix_byte_size(), 4);
    }

    #[test]
    fn test_resolution_error_propagates() {
        let beet = Beet::fixable(Utf8String::new());
        // Length prefix claims 9 bytes but only 1 follows.
        let buf = [9u8, 0, 0, 0, b'a'];
        assert!(matches!(
            beet.fix_from_data(&buf, 0),
            Err(Error::EndOfBuffer { .. })
        ));
        assert!(matches!(
            beet.fix_from_value(&Value::U8(1)),
            Err(Error::UnexpectedValue { .. })
        ));
    }

    #[test]
    fn test_fields() {
        let field = Field::new("a", U8);
        assert_eq!(field.name, "a");
        assert!(field.beet.is_fixed());
        let field = FixedField::new("b", U16);
        assert_eq!(field.beet.byte_size(), 2);
    }
}
