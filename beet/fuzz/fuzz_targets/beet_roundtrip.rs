#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use commonware_beet::{
    decode, encode, Array, Beet, Bool, Field, FixableBeetArgsStruct, Map, Record,
    Uint8Array, UniformFixedSizeArray, Utf8String, Value, I128, I16, I32, I64, I8, U128, U16, U32,
    U64, U8,
};
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeMap;

fn roundtrip(beet: Beet, value: Value) {
    let fixed = beet
        .fix_from_value(&value)
        .expect("Failed to resolve a valid value!");
    let encoded = encode(&beet, &value).expect("Failed to encode a valid value!");
    assert_eq!(fixed.byte_size(), encoded.len());

    // Resolving from the encoded bytes must agree with resolving from the value
    let from_data = beet
        .fix_from_data(&encoded, 0)
        .expect("Failed to resolve a successfully encoded input!");
    assert_eq!(from_data.byte_size(), encoded.len());

    let decoded = decode(&beet, &encoded).expect("Failed to decode a successfully encoded input!");
    assert_eq!(value, decoded);
}

fn record_beet() -> Beet {
    Beet::from(FixableBeetArgsStruct::args(vec![
        Field::new("id", U64),
        Field::new("name", Utf8String::new()),
        Field::new("tags", Array::new(Utf8String::new())),
        Field::new("payload", Uint8Array::new()),
    ])
    .expect("Failed to build the record struct!"))
}

fn descriptors() -> Vec<Beet> {
    vec![
        Beet::from(U32),
        Beet::from(Bool),
        Beet::from(Utf8String::new()),
        Beet::from(Uint8Array::new()),
        Beet::from(Array::new(Utf8String::new())),
        Beet::from(Array::new(Array::new(U8))),
        Beet::from(UniformFixedSizeArray::new(U16, 4, true)),
        Beet::from(Map::new(U8, U8)),
        Beet::from(Map::new(Utf8String::new(), I32)),
        Beet::from(Map::new(U16, Array::new(I8))),
        record_beet(),
    ]
}

// Decoding arbitrary bytes may fail, but must never panic
fn decode_bytes(buf: &[u8]) {
    for beet in descriptors() {
        if let Ok(value) = decode(&beet, buf) {
            // Anything that decodes must re-encode to the same bytes, unless
            // map entries were reordered.
            let encoded = encode(&beet, &value).expect("Failed to encode a decoded value!");
            if !matches!(value, Value::Map(_)) {
                assert_eq!(&encoded[..], buf);
            }
        }
    }
}

#[derive(Arbitrary, Debug)]
struct Item {
    id: u64,
    name: String,
    tags: Vec<String>,
    payload: Vec<u8>,
}

#[derive(Arbitrary, Debug)]
enum FuzzInput<'a> {
    Bytes(&'a [u8]),

    // Collections
    String(String),
    Buffer(Vec<u8>),
    Strings(Vec<String>),
    Nested(Vec<Vec<u8>>),
    Uniform([u16; 4]),
    ByteMap(BTreeMap<u8, u8>),
    StringMap(BTreeMap<String, i32>),
    ArrayMap(BTreeMap<u16, Vec<i8>>),

    // Structs
    Struct(Item),

    // Primitive inputs!
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
}

fn fuzz(input: FuzzInput) {
    match input {
        FuzzInput::Bytes(it) => decode_bytes(it),
        // Collections
        FuzzInput::String(it) => roundtrip(Utf8String::new().into(), Value::from(it)),
        FuzzInput::Buffer(it) => roundtrip(Uint8Array::new().into(), Value::from(Bytes::from(it))),
        FuzzInput::Strings(it) => roundtrip(Array::new(Utf8String::new()).into(), Value::from(it)),
        FuzzInput::Nested(it) => roundtrip(Array::new(Array::new(U8)).into(), Value::from(it)),
        FuzzInput::Uniform(it) => roundtrip(
            UniformFixedSizeArray::new(U16, 4, true).into(),
            Value::from(it.to_vec()),
        ),
        FuzzInput::ByteMap(it) => roundtrip(Map::new(U8, U8).into(), Value::from(it)),
        FuzzInput::StringMap(it) => {
            roundtrip(Map::new(Utf8String::new(), I32).into(), Value::from(it))
        }
        FuzzInput::ArrayMap(it) => roundtrip(Map::new(U16, Array::new(I8)).into(), Value::from(it)),
        // Structs
        FuzzInput::Struct(it) => {
            let mut record = Record::new();
            record.insert("id".into(), Value::from(it.id));
            record.insert("name".into(), Value::from(it.name));
            record.insert("tags".into(), Value::from(it.tags));
            record.insert("payload".into(), Value::from(Bytes::from(it.payload)));
            roundtrip(record_beet(), Value::Record(record));
        }
        // Fixed-width primitives
        FuzzInput::Bool(v) => roundtrip(Bool.into(), Value::from(v)),
        FuzzInput::U8(v) => roundtrip(U8.into(), Value::from(v)),
        FuzzInput::U16(v) => roundtrip(U16.into(), Value::from(v)),
        FuzzInput::U32(v) => roundtrip(U32.into(), Value::from(v)),
        FuzzInput::U64(v) => roundtrip(U64.into(), Value::from(v)),
        FuzzInput::U128(v) => roundtrip(U128.into(), Value::from(v)),
        FuzzInput::I8(v) => roundtrip(I8.into(), Value::from(v)),
        FuzzInput::I16(v) => roundtrip(I16.into(), Value::from(v)),
        FuzzInput::I32(v) => roundtrip(I32.into(), Value::from(v)),
        FuzzInput::I64(v) => roundtrip(I64.into(), Value::from(v)),
        FuzzInput::I128(v) => roundtrip(I128.into(), Value::from(v)),
    };
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
