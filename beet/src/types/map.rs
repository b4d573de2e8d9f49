//! Map codecs.
//!
//! A map is stored as a 4-byte entry count followed by that many key/value
//! pairs. Pair order on the wire is not significant: decoding accepts any
//! order, and encoding writes entries in key order.

use crate::{
    util::{self, LEN_PREFIX_SIZE},
    Beet, ElementCollection, Error, FixableBeet, FixedBeet, FixedSizeBeet, RangeCfg, Value,
};
use std::collections::BTreeMap;
use tracing::trace;

/// Resolved key and value codecs of each entry, by key.
pub type FixedEntries = BTreeMap<Value, (FixedSizeBeet, FixedSizeBeet)>;

/// A map whose layout has been resolved for one particular instance.
///
/// If either the key or the value codec is fixable, the per-entry codecs
/// discovered during resolution are kept in an immutable side-table (see
/// [FixedSizeMap::fixed_elements]) so writing does not need to resolve them again.
#[derive(Clone, Debug)]
pub struct FixedSizeMap {
    key_element: Beet,
    val_element: Beet,
    fixed_elements: FixedEntries,
    len: usize,
    byte_size: usize,
    element_byte_size: usize,
}

impl FixedSizeMap {
    /// Creates a map codec for `len` entries.
    ///
    /// When either codec is fixable, `fixed_elements` must hold the resolved
    /// codecs of every entry.
    pub fn new(
        key_element: impl Into<Beet>,
        val_element: impl Into<Beet>,
        fixed_elements: FixedEntries,
        len: usize,
    ) -> Self {
        let (keys_byte_size, vals_byte_size) = fixed_elements
            .values()
            .fold((0, 0), |(keys, vals), (k, v)| {
                (keys + k.byte_size(), vals + v.byte_size())
            });
        Self::resolved(
            key_element.into(),
            val_element.into(),
            fixed_elements,
            len,
            keys_byte_size,
            vals_byte_size,
        )
    }

    /// Creates a map codec from the total key and value byte sizes observed while
    /// walking the entries. Fixed sides ignore the observed totals.
    fn resolved(
        key_element: Beet,
        val_element: Beet,
        fixed_elements: FixedEntries,
        len: usize,
        keys_byte_size: usize,
        vals_byte_size: usize,
    ) -> Self {
        let keys_byte_size = match &key_element {
            Beet::Fixed(key) => key.byte_size() * len,
            Beet::Fixable(_) => keys_byte_size,
        };
        let vals_byte_size = match &val_element {
            Beet::Fixed(val) => val.byte_size() * len,
            Beet::Fixable(_) => vals_byte_size,
        };

        // With a fixable side, entries vary in size and all we can report is an average.
        let element_byte_size = match (&key_element, &val_element) {
            (Beet::Fixed(key), Beet::Fixed(val)) => key.byte_size() + val.byte_size(),
            _ if len == 0 => 0,
            _ => (keys_byte_size + vals_byte_size).div_ceil(len),
        };

        Self {
            key_element,
            val_element,
            fixed_elements,
            len,
            byte_size: LEN_PREFIX_SIZE + keys_byte_size + vals_byte_size,
            element_byte_size,
        }
    }

    /// Resolved codecs per key, populated when either side is fixable.
    pub fn fixed_elements(&self) -> &FixedEntries {
        &self.fixed_elements
    }

    fn entry_beets(
        &self,
        key: &Value,
        val: &Value,
    ) -> Result<(FixedSizeBeet, FixedSizeBeet), Error> {
        if let (Beet::Fixed(k), Beet::Fixed(v)) = (&self.key_element, &self.val_element) {
            return Ok((k.clone(), v.clone()));
        }
        if let Some(beets) = self.fixed_elements.get(key) {
            return Ok(beets.clone());
        }
        Ok((
            self.key_element.fix_from_value(key)?,
            self.val_element.fix_from_value(val)?,
        ))
    }
}

fn check_entry_size(key: &FixedSizeBeet, val: &FixedSizeBeet) -> Result<(), Error> {
    if key.byte_size() + val.byte_size() == 0 {
        return Err(Error::ZeroSizedElements("map"));
    }
    Ok(())
}

// Duplicate keys would collapse into one entry and re-encode differently.
fn check_unique_keys(len: usize, unique: usize) -> Result<(), Error> {
    if unique != len {
        return Err(Error::CardinalityMismatch {
            expected: len,
            found: unique,
        });
    }
    Ok(())
}

impl FixedBeet for FixedSizeMap {
    fn byte_size(&self) -> usize {
        self.byte_size
    }

    fn description(&self) -> String {
        format!(
            "Map<{}, {}>",
            self.key_element.description(),
            self.val_element.description()
        )
    }

    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        let map = value.as_map()?;
        if map.len() != self.len {
            return Err(Error::CardinalityMismatch {
                expected: self.len,
                found: map.len(),
            });
        }

        // Restrict writes to this map's range so an entry that disagrees with the
        // resolved layout cannot spill into its neighbours.
        util::room_for(buf, offset, self.byte_size)?;
        let buf = &mut buf[..offset + self.byte_size];

        let mut cursor = offset + LEN_PREFIX_SIZE;
        for (key, val) in map {
            let (key_beet, val_beet) = self.entry_beets(key, val)?;
            key_beet.write(buf, cursor, key)?;
            cursor += key_beet.byte_size();
            val_beet.write(buf, cursor, val)?;
            cursor += val_beet.byte_size();
        }
        util::expect_len("map", self.byte_size, cursor - offset)?;
        util::write_len(buf, offset, map.len())
    }

    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        let len = util::read_len(buf, offset)?;
        if len != self.len {
            return Err(Error::CardinalityMismatch {
                expected: self.len,
                found: len,
            });
        }

        // The side-table is keyed by values we have not decoded yet, so each
        // entry is resolved from the data instead.
        let mut cursor = offset + LEN_PREFIX_SIZE;
        util::at_least(buf, cursor, len)?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key_beet = self.key_element.fix_from_data(buf, cursor)?;
            let key = key_beet.read(buf, cursor)?;
            cursor += key_beet.byte_size();

            let val_beet = self.val_element.fix_from_data(buf, cursor)?;
            let val = val_beet.read(buf, cursor)?;
            cursor += val_beet.byte_size();

            check_entry_size(&key_beet, &val_beet)?;
            map.insert(key, val);
        }
        check_unique_keys(len, map.len())?;
        Ok(Value::Map(map))
    }
}

impl ElementCollection for FixedSizeMap {
    fn element_byte_size(&self) -> usize {
        self.element_byte_size
    }

    fn length(&self) -> usize {
        self.len
    }

    fn len_prefix_byte_size(&self) -> usize {
        LEN_PREFIX_SIZE
    }
}

impl From<FixedSizeMap> for FixedSizeBeet {
    fn from(beet: FixedSizeMap) -> Self {
        FixedSizeBeet::collection(beet)
    }
}

impl From<FixedSizeMap> for Beet {
    fn from(beet: FixedSizeMap) -> Self {
        Beet::Fixed(beet.into())
    }
}

/// De/Serializes a map of any size whose keys and values may each be fixed or fixable.
#[derive(Clone, Debug)]
pub struct Map {
    key_element: Beet,
    val_element: Beet,
    limit: RangeCfg,
}

impl Map {
    pub fn new(key_element: impl Into<Beet>, val_element: impl Into<Beet>) -> Self {
        Self {
            key_element: key_element.into(),
            val_element: val_element.into(),
            limit: RangeCfg::default(),
        }
    }

    /// Restricts the entry counts accepted when resolving from data.
    pub fn with_limit(mut self, limit: impl Into<RangeCfg>) -> Self {
        self.limit = limit.into();
        self
    }

    fn is_fixed(&self) -> bool {
        self.key_element.is_fixed() && self.val_element.is_fixed()
    }

    /// Resolves the layout of the map serialized in `buf` at `offset`.
    pub fn resolve_from_data(&self, buf: &[u8], offset: usize) -> Result<FixedSizeMap, Error> {
        let len = self.limit.check(util::read_len(buf, offset)?)?;
        let start = offset + LEN_PREFIX_SIZE;
        // The count is untrusted. Every entry occupies at least one byte, so the
        // count can never exceed the remaining span.
        util::at_least(buf, start, len)?;
        if self.is_fixed() {
            let map = self.fixed(FixedEntries::new(), len, 0, 0);
            if len > 0 && map.element_byte_size == 0 {
                return Err(Error::ZeroSizedElements("map"));
            }
            util::at_least(buf, start, map.byte_size - LEN_PREFIX_SIZE)?;
            return Ok(map);
        }

        let mut cursor = start;
        let mut fixed_elements = FixedEntries::new();
        let (mut keys_byte_size, mut vals_byte_size) = (0, 0);
        for _ in 0..len {
            let key_beet = self.key_element.fix_from_data(buf, cursor)?;
            let key = key_beet.read(buf, cursor)?;
            cursor += key_beet.byte_size();
            keys_byte_size += key_beet.byte_size();

            let val_beet = self.val_element.fix_from_data(buf, cursor)?;
            util::at_least(buf, cursor, val_beet.byte_size())?;
            cursor += val_beet.byte_size();
            vals_byte_size += val_beet.byte_size();

            check_entry_size(&key_beet, &val_beet)?;
            fixed_elements.insert(key, (key_beet, val_beet));
        }
        check_unique_keys(len, fixed_elements.len())?;
        trace!(len, offset, byte_size = cursor - offset, "resolved map from data");
        Ok(self.fixed(fixed_elements, len, keys_byte_size, vals_byte_size))
    }

    /// Resolves the layout of `value`, which must be a [Value::Map].
    pub fn resolve_from_value(&self, value: &Value) -> Result<FixedSizeMap, Error> {
        let map = value.as_map()?;
        if self.is_fixed() {
            let fixed = self.fixed(FixedEntries::new(), map.len(), 0, 0);
            if !map.is_empty() && fixed.element_byte_size == 0 {
                return Err(Error::ZeroSizedElements("map"));
            }
            return Ok(fixed);
        }

        let mut fixed_elements = FixedEntries::new();
        let (mut keys_byte_size, mut vals_byte_size) = (0, 0);
        for (key, val) in map {
            let key_beet = self.key_element.fix_from_value(key)?;
            let val_beet = self.val_element.fix_from_value(val)?;
            check_entry_size(&key_beet, &val_beet)?;
            keys_byte_size += key_beet.byte_size();
            vals_byte_size += val_beet.byte_size();
            fixed_elements.insert(key.clone(), (key_beet, val_beet));
        }
        trace!(len = map.len(), "resolved map from value");
        Ok(self.fixed(fixed_elements, map.len(), keys_byte_size, vals_byte_size))
    }

    fn fixed(
        &self,
        fixed_elements: FixedEntries,
        len: usize,
        keys_byte_size: usize,
        vals_byte_size: usize,
    ) -> FixedSizeMap {
        FixedSizeMap::resolved(
            self.key_element.clone(),
            self.val_element.clone(),
            fixed_elements,
            len,
            keys_byte_size,
            vals_byte_size,
        )
    }
}

impl FixableBeet for Map {
    fn description(&self) -> String {
        format!(
            "FixableMap<{}, {}>",
            self.key_element.description(),
            self.val_element.description()
        )
    }

    fn to_fixed_from_data(&self, buf: &[u8], offset: usize) -> Result<FixedSizeBeet, Error> {
        Ok(self.resolve_from_data(buf, offset)?.into())
    }

    fn to_fixed_from_value(&self, value: &Value) -> Result<FixedSizeBeet, Error> {
        Ok(self.resolve_from_value(value)?.into())
    }
}

impl From<Map> for Beet {
    fn from(beet: Map) -> Self {
        Beet::fixable(beet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Array, FixedSizeBuffer, Utf8String, I32, I8, U8};
    use bytes::Bytes;

    fn encode(beet: &FixedSizeBeet, value: &Value) -> Vec<u8> {
        let mut buf = vec![0u8; beet.byte_size()];
        beet.write(&mut buf, 0, value).unwrap();
        buf
    }

    fn u8_map(entries: &[(u8, u8)]) -> Value {
        Value::from(entries.iter().copied().collect::<BTreeMap<u8, u8>>())
    }

    #[test]
    fn test_fixed_key_fixed_val() {
        let beet = Map::new(U8, U8);
        let value = u8_map(&[(1, 10), (2, 20)]);

        let from_value = beet.to_fixed_from_value(&value).unwrap();
        assert_eq!(from_value.byte_size(), 4 + 2 * 2);
        let buf = encode(&from_value, &value);
        assert_eq!(buf, [2, 0, 0, 0, 1, 10, 2, 20]);

        let from_data = beet.to_fixed_from_data(&buf, 0).unwrap();
        assert_eq!(from_data.byte_size(), from_value.byte_size());
        assert_eq!(from_data.read(&buf, 0).unwrap(), value);

        let collection = from_data.as_collection().unwrap();
        assert_eq!(collection.element_byte_size(), 2);
        assert_eq!(collection.length(), 2);
        assert_eq!(collection.len_prefix_byte_size(), 4);
    }

    #[test]
    fn test_pair_order_is_not_significant() {
        let beet = Map::new(U8, U8);
        let expected = u8_map(&[(1, 10), (2, 20)]);
        for buf in [
            [2u8, 0, 0, 0, 1, 10, 2, 20],
            [2u8, 0, 0, 0, 2, 20, 1, 10],
        ] {
            let fixed = beet.to_fixed_from_data(&buf, 0).unwrap();
            assert_eq!(fixed.read(&buf, 0).unwrap(), expected);
        }
    }

    #[test]
    fn test_fixable_key_fixed_val() {
        let beet = Map::new(Utf8String::new(), I32);
        let value = Value::Map(
            [
                (Value::from("a"), Value::I32(-1)),
                (Value::from("bcd"), Value::I32(7)),
            ]
            .into_iter()
            .collect(),
        );

        let from_value = beet.resolve_from_value(&value).unwrap();
        // 4 + (4 + 1) + (4 + 3) + 2 * 4
        assert_eq!(from_value.byte_size(), 24);
        // (12 key bytes + 8 value bytes) / 2 entries
        assert_eq!(from_value.element_byte_size(), 10);
        assert_eq!(from_value.fixed_elements().len(), 2);
        let buf = encode(&from_value.clone().into(), &value);
        assert_eq!(
            buf,
            [
                2, 0, 0, 0, // count
                1, 0, 0, 0, b'a', 0xFF, 0xFF, 0xFF, 0xFF, // "a" => -1
                3, 0, 0, 0, b'b', b'c', b'd', 7, 0, 0, 0, // "bcd" => 7
            ]
        );

        let from_data = beet.resolve_from_data(&buf, 0).unwrap();
        assert_eq!(from_data.byte_size(), from_value.byte_size());
        assert_eq!(from_data.read(&buf, 0).unwrap(), value);
    }

    #[test]
    fn test_fixable_key_fixable_val() {
        let beet = Map::new(Utf8String::new(), Array::new(I8));
        let value = Value::Map(
            [
                (Value::from("x"), Value::from(vec![1i8, -2])),
                (Value::from("yy"), Value::from(Vec::<i8>::new())),
            ]
            .into_iter()
            .collect(),
        );
        let from_value = beet.resolve_from_value(&value).unwrap();
        // 4 + (5 + 6) + (6 + 4)
        assert_eq!(from_value.byte_size(), 25);
        assert_eq!(from_value.element_byte_size(), 21_usize.div_ceil(2));

        let buf = encode(&from_value.into(), &value);
        let from_data = beet.to_fixed_from_data(&buf, 0).unwrap();
        assert_eq!(from_data.byte_size(), 25);
        assert_eq!(from_data.read(&buf, 0).unwrap(), value);
    }

    #[test]
    fn test_fixed_key_fixable_val() {
        let beet = Map::new(U8, Utf8String::new());
        let value = Value::Map([(Value::U8(3), Value::from("three"))].into_iter().collect());
        let fixed = beet.resolve_from_value(&value).unwrap();
        assert_eq!(fixed.byte_size(), 4 + 1 + 4 + 5);
        assert_eq!(fixed.element_byte_size(), 1 + 9);
        let buf = encode(&fixed.into(), &value);
        let fixed = beet.to_fixed_from_data(&buf, 0).unwrap();
        assert_eq!(fixed.read(&buf, 0).unwrap(), value);
    }

    #[test]
    fn test_empty_map() {
        let beet = Map::new(Utf8String::new(), I32);
        let value = Value::Map(BTreeMap::new());
        let fixed = beet.resolve_from_value(&value).unwrap();
        assert_eq!(fixed.byte_size(), 4);
        assert_eq!(fixed.element_byte_size(), 0);
        let buf = encode(&fixed.into(), &value);
        assert_eq!(buf, [0, 0, 0, 0]);
    }

    #[test]
    fn test_cardinality_mismatch() {
        let beet = Map::new(U8, U8);
        let fixed = beet
            .to_fixed_from_value(&u8_map(&[(1, 1), (2, 2)]))
            .unwrap();
        let mut buf = vec![0u8; fixed.byte_size()];
        assert_eq!(
            fixed.write(&mut buf, 0, &u8_map(&[(1, 1)])),
            Err(Error::CardinalityMismatch {
                expected: 2,
                found: 1
            })
        );

        let buf = [1u8, 0, 0, 0, 1, 1];
        assert_eq!(
            fixed.read(&buf, 0),
            Err(Error::CardinalityMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_duplicate_keys() {
        let buf = [2u8, 0, 0, 0, 1, 10, 1, 20];
        let beet = Beet::from(Map::new(U8, U8));
        assert_eq!(
            crate::decode(&beet, &buf),
            Err(Error::CardinalityMismatch {
                expected: 2,
                found: 1
            })
        );

        let fixed = Map::new(U8, U8)
            .to_fixed_from_value(&u8_map(&[(1, 10), (2, 20)]))
            .unwrap();
        assert_eq!(
            fixed.read(&buf, 0),
            Err(Error::CardinalityMismatch {
                expected: 2,
                found: 1
            })
        );

        let beet = Map::new(Utf8String::new(), U8);
        let buf = [
            2u8, 0, 0, 0, // count
            1, 0, 0, 0, b'a', 10, // "a" => 10
            1, 0, 0, 0, b'a', 20, // "a" => 20
        ];
        assert_eq!(
            beet.resolve_from_data(&buf, 0).unwrap_err(),
            Error::CardinalityMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_zero_sized_entries() {
        // A huge count over zero-sized entries is bounded by the remaining bytes
        let beet = Map::new(FixedSizeBuffer::new(0), FixedSizeBuffer::new(0));
        let buf = 20_000_000u32.to_le_bytes();
        assert!(matches!(
            beet.resolve_from_data(&buf, 0),
            Err(Error::EndOfBuffer { .. })
        ));

        let buf = [2u8, 0, 0, 0, 0xaa, 0xbb];
        assert_eq!(
            beet.resolve_from_data(&buf, 0).unwrap_err(),
            Error::ZeroSizedElements("map")
        );
        assert!(beet.resolve_from_data(&[0, 0, 0, 0], 0).is_ok());

        let value = Value::Map(
            [(Value::Bytes(Bytes::new()), Value::Bytes(Bytes::new()))]
                .into_iter()
                .collect(),
        );
        assert_eq!(
            beet.resolve_from_value(&value).unwrap_err(),
            Error::ZeroSizedElements("map")
        );

        // Fixable keys resolving to nothing are rejected entry by entry
        let beet = Map::new(
            crate::FixableBeetArgsStruct::args(vec![]).unwrap(),
            FixedSizeBuffer::new(0),
        );
        let buf = [1u8, 0, 0, 0, 0];
        assert_eq!(
            beet.resolve_from_data(&buf, 0).unwrap_err(),
            Error::ZeroSizedElements("map")
        );
    }

    #[test]
    fn test_write_with_foreign_layout() {
        // A layout resolved for one map cannot write a same-sized map with longer strings.
        let beet = Map::new(Utf8String::new(), U8);
        let resolved_for = Value::Map([(Value::from("a"), Value::U8(1))].into_iter().collect());
        let fixed = beet.to_fixed_from_value(&resolved_for).unwrap();
        let other = Value::Map([(Value::from("abc"), Value::U8(1))].into_iter().collect());
        let mut buf = vec![0u8; fixed.byte_size() + 8];
        assert!(matches!(
            fixed.write(&mut buf, 0, &other),
            Err(Error::BufferOverflow { .. })
        ));
        assert_eq!(&buf[fixed.byte_size()..], &[0u8; 8]);
    }

    #[test]
    fn test_truncated_data() {
        let beet = Map::new(U8, U8);
        let buf = [3u8, 0, 0, 0, 1, 2];
        assert!(matches!(
            beet.to_fixed_from_data(&buf, 0),
            Err(Error::EndOfBuffer { .. })
        ));

        let beet = Map::new(Utf8String::new(), U8).with_limit(..2);
        let buf = [2u8, 0, 0, 0];
        assert_eq!(
            beet.to_fixed_from_data(&buf, 0).unwrap_err(),
            Error::InvalidLength(2)
        );
    }
}
