//! UTF-8 string codecs.
//!
//! Strings are stored as a 4-byte little-endian byte length followed by that
//! many UTF-8 bytes. The length counts encoded bytes, not characters.

use crate::{
    util::{self, LEN_PREFIX_SIZE},
    Beet, ElementCollection, Error, FixableBeet, FixedBeet, FixedSizeBeet, RangeCfg, Value,
};
use tracing::trace;

/// De/Serializes a UTF-8 string of exactly `string_byte_length` bytes.
///
/// The length prefix is redundant with the configured length and is validated
/// on every read and write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedSizeUtf8String {
    string_byte_length: usize,
}

impl FixedSizeUtf8String {
    pub fn new(string_byte_length: usize) -> Self {
        Self { string_byte_length }
    }
}

impl FixedBeet for FixedSizeUtf8String {
    fn byte_size(&self) -> usize {
        LEN_PREFIX_SIZE + self.string_byte_length
    }

    fn description(&self) -> String {
        format!("Utf8String(4 + {})", self.string_byte_length)
    }

    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        let string = value.as_str()?;
        util::expect_len("utf8 string", self.string_byte_length, string.len())?;
        util::write_len(buf, offset, string.len())?;
        util::room_for(buf, offset + LEN_PREFIX_SIZE, string.len())?
            .copy_from_slice(string.as_bytes());
        Ok(())
    }

    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        let len = util::read_len(buf, offset)?;
        util::expect_len("utf8 string", self.string_byte_length, len)?;
        let bytes = util::at_least(buf, offset + LEN_PREFIX_SIZE, len)?;
        let string = std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
        Ok(Value::Str(string.to_string()))
    }
}

impl ElementCollection for FixedSizeUtf8String {
    fn element_byte_size(&self) -> usize {
        1
    }

    fn length(&self) -> usize {
        self.string_byte_length
    }

    fn len_prefix_byte_size(&self) -> usize {
        LEN_PREFIX_SIZE
    }
}

impl From<FixedSizeUtf8String> for FixedSizeBeet {
    fn from(beet: FixedSizeUtf8String) -> Self {
        FixedSizeBeet::collection(beet)
    }
}

impl From<FixedSizeUtf8String> for Beet {
    fn from(beet: FixedSizeUtf8String) -> Self {
        Beet::Fixed(beet.into())
    }
}

/// De/Serializes a UTF-8 string of any size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Utf8String {
    limit: RangeCfg,
}

impl Utf8String {
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

impl FixableBeet for Utf8String {
    fn description(&self) -> String {
        "Utf8String".to_string()
    }

    fn to_fixed_from_data(&self, buf: &[u8], offset: usize) -> Result<FixedSizeBeet, Error> {
        let len = self.limit.check(util::read_len(buf, offset)?)?;
        util::at_least(buf, offset + LEN_PREFIX_SIZE, len)?;
        trace!(len, offset, "resolved string from data");
        Ok(FixedSizeUtf8String::new(len).into())
    }

    fn to_fixed_from_value(&self, value: &Value) -> Result<FixedSizeBeet, Error> {
        let len = value.as_str()?.len();
        trace!(len, "resolved string from value");
        Ok(FixedSizeUtf8String::new(len).into())
    }
}

impl From<Utf8String> for Beet {
    fn from(beet: Utf8String) -> Self {
        Beet::fixable(beet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn check_fixed(beet: &FixedSizeBeet, value: &str, offset: usize) {
        let value = Value::from(value);
        let mut buf = vec![0u8; offset + beet.byte_size() + offset];
        beet.write(&mut buf, offset, &value).unwrap();
        assert_eq!(beet.read(&buf, offset).unwrap(), value);
    }

    #[test_case(1, "a"; "size 1")]
    #[test_case(1, "z"; "size 1 z")]
    #[test_case(3, "abc"; "size 3")]
    #[test_case(3, "xYz"; "size 3 mixed case")]
    #[test_case(4, "abcd"; "size 4")]
    #[test_case(4, "😁"; "size 4 emoji")]
    fn test_fixed_size_strings(len: usize, value: &str) {
        let beet = FixedSizeBeet::from(FixedSizeUtf8String::new(len));
        assert_eq!(beet.byte_size(), 4 + len);
        for offset in [0, 4] {
            check_fixed(&beet, value, offset);
        }
    }

    #[test_case("abcdefg"; "ascii")]
    #[test_case("😁"; "single emoji")]
    #[test_case("😁😁😁"; "three emoji")]
    #[test_case(""; "empty")]
    fn test_dynamic_strings(value: &str) {
        let beet = Beet::from(Utf8String::new());
        for offset in [0, 4] {
            let fixed = beet.fix_from_value(&Value::from(value)).unwrap();
            assert_eq!(fixed.byte_size(), 4 + value.len());
            check_fixed(&fixed, value, offset);
        }
    }

    #[test]
    fn test_wire_format() {
        let beet = Beet::from(Utf8String::new());
        let value = Value::from("ab");
        let fixed = beet.fix_from_value(&value).unwrap();
        let mut buf = vec![0u8; fixed.byte_size()];
        fixed.write(&mut buf, 0, &value).unwrap();
        assert_eq!(buf, [0x02, 0x00, 0x00, 0x00, 0x61, 0x62]);

        let fixed = beet.fix_from_data(&buf, 0).unwrap();
        assert_eq!(fixed.byte_size(), 6);
        assert_eq!(fixed.read(&buf, 0).unwrap(), value);
    }

    #[test]
    fn test_byte_length_prefix() {
        // One character, four bytes
        let value = Value::from("😁");
        let fixed = Utf8String::new().to_fixed_from_value(&value).unwrap();
        let mut buf = vec![0u8; fixed.byte_size()];
        fixed.write(&mut buf, 0, &value).unwrap();
        assert_eq!(&buf[..4], &[4, 0, 0, 0]);
        assert_eq!(fixed.as_collection().unwrap().length(), 4);
    }

    #[test]
    fn test_length_mismatch() {
        let beet = FixedSizeUtf8String::new(3);
        let mut buf = vec![0u8; 7];
        assert_eq!(
            beet.write(&mut buf, 0, &Value::from("ab")),
            Err(Error::LengthMismatch {
                context: "utf8 string",
                expected: 3,
                found: 2
            })
        );

        let buf = [2u8, 0, 0, 0, b'a', b'b', 0];
        assert_eq!(
            beet.read(&buf, 0),
            Err(Error::LengthMismatch {
                context: "utf8 string",
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let buf = [2u8, 0, 0, 0, 0xC3, 0x28];
        let fixed = Utf8String::new().to_fixed_from_data(&buf, 0).unwrap();
        assert_eq!(fixed.read(&buf, 0), Err(Error::InvalidUtf8));
    }

    #[test]
    fn test_limit() {
        let buf = [3u8, 0, 0, 0, b'a', b'b', b'c'];
        let beet = Utf8String::with_limit(..=2);
        assert_eq!(
            beet.to_fixed_from_data(&buf, 0).unwrap_err(),
            Error::InvalidLength(3)
        );
        // Values are never limited
        assert!(beet.to_fixed_from_value(&Value::from("abc")).is_ok());
    }

    #[test]
    fn test_truncated() {
        let buf = [3u8, 0, 0];
        assert!(matches!(
            Utf8String::new().to_fixed_from_data(&buf, 0),
            Err(Error::EndOfBuffer { .. })
        ));
    }
}
