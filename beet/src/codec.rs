//! One-shot encoding and decoding of whole buffers.

use crate::{Beet, BeetWriter, Error, Value};
use bytes::BytesMut;
use tracing::trace;

/// Encodes `value` into a new buffer sized exactly for it.
///
/// Resolves `beet` against the value first, so the buffer is allocated once and
/// never grows.
pub fn encode(beet: &Beet, value: &Value) -> Result<BytesMut, Error> {
    let fixed = beet.fix_from_value(value)?;
    let mut buf = BytesMut::zeroed(fixed.byte_size());
    let mut writer = BeetWriter::new(&mut buf);
    writer.write(&fixed, value)?;
    writer.finish()?;
    trace!(description = %fixed.description(), len = buf.len(), "encoded");
    Ok(buf)
}

/// Decodes a value from `buf`, ensuring the buffer is fully consumed.
pub fn decode(beet: &Beet, buf: &[u8]) -> Result<Value, Error> {
    let fixed = beet.fix_from_data(buf, 0)?;
    let byte_size = fixed.byte_size();
    if buf.len() < byte_size {
        return Err(Error::EndOfBuffer {
            offset: 0,
            needed: byte_size,
            remaining: buf.len(),
        });
    }
    let value = fixed.read(buf, 0)?;

    // Check that the buffer is fully consumed.
    let remaining = buf.len() - byte_size;
    if remaining > 0 {
        return Err(Error::ExtraData(remaining));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Array, Bool, FixedSizeBeet, Map, UniformFixedSizeArray, Utf8String, U32, U8};
    use std::collections::BTreeMap;

    #[test]
    fn test_encode_decode() {
        let beet = Beet::from(Array::new(Utf8String::new()));
        let value = Value::from(vec!["hello", "", "😁"]);
        let buf = encode(&beet, &value).unwrap();
        assert_eq!(buf.len(), 4 + (4 + 5) + 4 + (4 + 4));
        assert_eq!(decode(&beet, &buf).unwrap(), value);
    }

    #[test]
    fn test_fixed_array_without_prefix() {
        let beet = Beet::from(UniformFixedSizeArray::new(U8, 3, false));
        let value = Value::from(vec![1u8, 2, 3]);
        let buf = encode(&beet, &value).unwrap();
        assert_eq!(&buf[..], &[0x01, 0x02, 0x03]);
        assert_eq!(decode(&beet, &buf).unwrap(), value);
    }

    #[test]
    fn test_extra_data() {
        let beet = Beet::from(FixedSizeBeet::from(U32));
        assert_eq!(decode(&beet, &[1, 0, 0, 0, 9, 9]), Err(Error::ExtraData(2)));
        assert!(matches!(
            decode(&beet, &[1, 0]),
            Err(Error::EndOfBuffer { .. })
        ));
    }

    #[test]
    fn test_wrong_value() {
        let beet = Beet::from(Bool);
        assert!(matches!(
            encode(&beet, &Value::U8(1)),
            Err(Error::UnexpectedValue { .. })
        ));
    }

    #[test]
    fn test_map() {
        let beet = Beet::from(Map::new(U8, U8));
        let value = Value::from(BTreeMap::from([(1u8, 10u8), (2, 20)]));
        let buf = encode(&beet, &value).unwrap();
        assert_eq!(&buf[..], &[2, 0, 0, 0, 1, 10, 2, 20]);

        // Either physical ordering decodes to the same mapping
        let swapped = [2u8, 0, 0, 0, 2, 20, 1, 10];
        assert_eq!(decode(&beet, &swapped).unwrap(), value);
    }
}
