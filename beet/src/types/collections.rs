//! Array and byte-buffer codecs.
//!
//! For portability, every element count and byte length stored on the wire must
//! fit within a [u32].

use crate::{
    util::{self, LEN_PREFIX_SIZE},
    Beet, ElementCollection, Error, FixableBeet, FixedBeet, FixedSizeBeet, RangeCfg, Value,
};
use bytes::Bytes;
use tracing::trace;

/// De/Serializes an array with exactly `len` elements which all have the same size.
///
/// If `len_prefix` is set, a 4-byte element count precedes the elements.
#[derive(Clone, Debug)]
pub struct UniformFixedSizeArray {
    element: FixedSizeBeet,
    len: usize,
    len_prefix: bool,
}

impl UniformFixedSizeArray {
    pub fn new(element: impl Into<FixedSizeBeet>, len: usize, len_prefix: bool) -> Self {
        Self {
            element: element.into(),
            len,
            len_prefix,
        }
    }

    fn prefix_size(&self) -> usize {
        if self.len_prefix {
            LEN_PREFIX_SIZE
        } else {
            0
        }
    }
}

impl FixedBeet for UniformFixedSizeArray {
    fn byte_size(&self) -> usize {
        self.prefix_size() + self.len * self.element.byte_size()
    }

    fn description(&self) -> String {
        format!("Array<{}>({})", self.element.description(), self.len)
    }

    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        let items = value.as_seq()?;
        util::expect_len("uniform array", self.len, items.len())?;
        util::room_for(buf, offset, self.byte_size())?;
        if self.len_prefix {
            util::write_len(buf, offset, self.len)?;
        }
        let start = offset + self.prefix_size();
        let stride = self.element.byte_size();
        for (i, item) in items.iter().enumerate() {
            self.element.write(buf, start + i * stride, item)?;
        }
        Ok(())
    }

    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        util::at_least(buf, offset, self.byte_size())?;
        if self.len_prefix {
            let len = util::read_len(buf, offset)?;
            util::expect_len("uniform array", self.len, len)?;
        }
        let start = offset + self.prefix_size();
        let stride = self.element.byte_size();
        let items = (0..self.len)
            .map(|i| self.element.read(buf, start + i * stride))
            .collect::<Result<_, _>>()?;
        Ok(Value::Seq(items))
    }
}

impl ElementCollection for UniformFixedSizeArray {
    fn element_byte_size(&self) -> usize {
        self.element.byte_size()
    }

    fn length(&self) -> usize {
        self.len
    }

    fn len_prefix_byte_size(&self) -> usize {
        self.prefix_size()
    }
}

impl From<UniformFixedSizeArray> for FixedSizeBeet {
    fn from(beet: UniformFixedSizeArray) -> Self {
        FixedSizeBeet::collection(beet)
    }
}

impl From<UniformFixedSizeArray> for Beet {
    fn from(beet: UniformFixedSizeArray) -> Self {
        Beet::Fixed(beet.into())
    }
}

/// De/Serializes an array whose elements each have their own, possibly distinct,
/// fixed codec.
///
/// This is what an [Array] resolves to. Always prefixed with a 4-byte count.
#[derive(Clone, Debug)]
pub struct FixedSizeArray {
    elements: Vec<FixedSizeBeet>,
    elements_byte_size: usize,
}

impl FixedSizeArray {
    pub fn new(elements: Vec<FixedSizeBeet>) -> Self {
        let elements_byte_size = elements.iter().map(FixedSizeBeet::byte_size).sum();
        Self {
            elements,
            elements_byte_size,
        }
    }
}

impl FixedBeet for FixedSizeArray {
    fn byte_size(&self) -> usize {
        LEN_PREFIX_SIZE + self.elements_byte_size
    }

    fn description(&self) -> String {
        let first = self
            .elements
            .first()
            .map(FixedSizeBeet::description)
            .unwrap_or_else(|| "<EMPTY>".to_string());
        format!(
            "Array<{}>({})[4 + {}]",
            first,
            self.elements.len(),
            self.elements_byte_size
        )
    }

    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        let items = value.as_seq()?;
        util::expect_len("array", self.elements.len(), items.len())?;
        util::room_for(buf, offset, self.byte_size())?;
        util::write_len(buf, offset, items.len())?;
        let mut cursor = offset + LEN_PREFIX_SIZE;
        for (element, item) in self.elements.iter().zip(items) {
            element.write(buf, cursor, item)?;
            cursor += element.byte_size();
        }
        Ok(())
    }

    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        let len = util::read_len(buf, offset)?;
        util::expect_len("array", self.elements.len(), len)?;
        let mut cursor = offset + LEN_PREFIX_SIZE;
        let mut items = Vec::with_capacity(len);
        for element in &self.elements {
            items.push(element.read(buf, cursor)?);
            cursor += element.byte_size();
        }
        Ok(Value::Seq(items))
    }
}

impl ElementCollection for FixedSizeArray {
    fn element_byte_size(&self) -> usize {
        if self.elements.is_empty() {
            return 0;
        }
        self.elements_byte_size.div_ceil(self.elements.len())
    }

    fn length(&self) -> usize {
        self.elements.len()
    }

    fn len_prefix_byte_size(&self) -> usize {
        LEN_PREFIX_SIZE
    }
}

impl From<FixedSizeArray> for FixedSizeBeet {
    fn from(beet: FixedSizeArray) -> Self {
        FixedSizeBeet::collection(beet)
    }
}

impl From<FixedSizeArray> for Beet {
    fn from(beet: FixedSizeArray) -> Self {
        Beet::Fixed(beet.into())
    }
}

/// De/Serializes a count-prefixed array of any length whose elements may vary in size.
#[derive(Clone, Debug)]
pub struct Array {
    element: Beet,
    limit: RangeCfg,
}

impl Array {
    pub fn new(element: impl Into<Beet>) -> Self {
        Self {
            element: element.into(),
            limit: RangeCfg::default(),
        }
    }

    /// Restricts the element counts accepted when resolving from data.
    pub fn with_limit(mut self, limit: impl Into<RangeCfg>) -> Self {
        self.limit = limit.into();
        self
    }
}

impl FixableBeet for Array {
    fn description(&self) -> String {
        format!("array<{}>", self.element.description())
    }

    fn to_fixed_from_data(&self, buf: &[u8], offset: usize) -> Result<FixedSizeBeet, Error> {
        let len = self.limit.check(util::read_len(buf, offset)?)?;
        let start = offset + LEN_PREFIX_SIZE;
        let mut cursor = start;

        // The count is untrusted. Every element occupies at least one byte, so the
        // count can never exceed the remaining span.
        util::at_least(buf, start, len)?;
        let mut elements = Vec::with_capacity(len);
        for _ in 0..len {
            let element = self.element.fix_from_data(buf, cursor)?;
            if element.byte_size() == 0 {
                return Err(Error::ZeroSizedElements("array"));
            }
            util::at_least(buf, cursor, element.byte_size())?;
            cursor += element.byte_size();
            elements.push(element);
        }
        trace!(len, offset, byte_size = cursor - offset, "resolved array from data");
        Ok(FixedSizeArray::new(elements).into())
    }

    fn to_fixed_from_value(&self, value: &Value) -> Result<FixedSizeBeet, Error> {
        let items = value.as_seq()?;
        let elements = items
            .iter()
            .map(|item| match self.element.fix_from_value(item)? {
                element if element.byte_size() == 0 => Err(Error::ZeroSizedElements("array")),
                element => Ok(element),
            })
            .collect::<Result<Vec<_>, _>>()?;
        trace!(len = items.len(), "resolved array from value");
        Ok(FixedSizeArray::new(elements).into())
    }
}

impl From<Array> for Beet {
    fn from(beet: Array) -> Self {
        Beet::fixable(beet)
    }
}

/// De/Serializes a raw buffer of exactly `bytes` bytes, copied verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedSizeBuffer {
    bytes: usize,
}

impl FixedSizeBuffer {
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }
}

impl FixedBeet for FixedSizeBuffer {
    fn byte_size(&self) -> usize {
        self.bytes
    }

    fn description(&self) -> String {
        format!("Buffer({})", self.bytes)
    }

    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        let bytes = value.as_bytes()?;
        util::expect_len("buffer", self.bytes, bytes.len())?;
        util::room_for(buf, offset, self.bytes)?.copy_from_slice(bytes);
        Ok(())
    }

    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        let bytes = util::at_least(buf, offset, self.bytes)?;
        Ok(Value::Bytes(Bytes::copy_from_slice(bytes)))
    }
}

impl From<FixedSizeBuffer> for FixedSizeBeet {
    fn from(beet: FixedSizeBuffer) -> Self {
        FixedSizeBeet::scalar(beet)
    }
}

impl From<FixedSizeBuffer> for Beet {
    fn from(beet: FixedSizeBuffer) -> Self {
        Beet::Fixed(beet.into())
    }
}

/// De/Serializes a byte array of exactly `len` bytes, optionally preceded by a
/// 4-byte length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedSizeUint8Array {
    buffer: FixedSizeBuffer,
    len_prefix: bool,
}

impl FixedSizeUint8Array {
    pub fn new(len: usize, len_prefix: bool) -> Self {
        Self {
            buffer: FixedSizeBuffer::new(len),
            len_prefix,
        }
    }

    fn prefix_size(&self) -> usize {
        if self.len_prefix {
            LEN_PREFIX_SIZE
        } else {
            0
        }
    }
}

impl FixedBeet for FixedSizeUint8Array {
    fn byte_size(&self) -> usize {
        self.prefix_size() + self.buffer.byte_size()
    }

    fn description(&self) -> String {
        format!("Uint8Array({})", self.buffer.byte_size())
    }

    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        let len = self.buffer.byte_size();
        util::expect_len("uint8 array", len, value.as_bytes()?.len())?;
        if self.len_prefix {
            util::write_len(buf, offset, len)?;
        }
        self.buffer.write(buf, offset + self.prefix_size(), value)
    }

    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        if self.len_prefix {
            let len = util::read_len(buf, offset)?;
            util::expect_len("uint8 array", self.buffer.byte_size(), len)?;
        }
        self.buffer.read(buf, offset + self.prefix_size())
    }
}

impl From<FixedSizeUint8Array> for FixedSizeBeet {
    fn from(beet: FixedSizeUint8Array) -> Self {
        FixedSizeBeet::scalar(beet)
    }
}

impl From<FixedSizeUint8Array> for Beet {
    fn from(beet: FixedSizeUint8Array) -> Self {
        Beet::Fixed(beet.into())
    }
}

/// De/Serializes a length-prefixed byte array of any size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Uint8Array {
    limit: RangeCfg,
}

impl Uint8Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the byte lengths accepted when resolving from data.
    pub fn with_limit(limit: impl Into<RangeCfg>) -> Self {
        Self {
            limit: limit.into(),
        }
    }
}

impl FixableBeet for Uint8Array {
    fn description(&self) -> String {
        "Uint8Array".to_string()
    }

    fn to_fixed_from_data(&self, buf: &[u8], offset: usize) -> Result<FixedSizeBeet, Error> {
        let len = self.limit.check(util::read_len(buf, offset)?)?;
        util::at_least(buf, offset + LEN_PREFIX_SIZE, len)?;
        trace!(len, offset, "resolved byte array from data");
        Ok(FixedSizeUint8Array::new(len, true).into())
    }

    fn to_fixed_from_value(&self, value: &Value) -> Result<FixedSizeBeet, Error> {
        let len = value.as_bytes()?.len();
        trace!(len, "resolved byte array from value");
        Ok(FixedSizeUint8Array::new(len, true).into())
    }
}

impl From<Uint8Array> for Beet {
    fn from(beet: Uint8Array) -> Self {
        Beet::fixable(beet)
    }
}
