//! Resolve variable-size schemas into exact fixed-size layouts.
//!
//! # Overview
//!
//! A Borsh-compatible binary serialization library built around one idea: every
//! type descriptor (a _beet_) is either of fixed size, or _fixable_, meaning its
//! size depends on the instance at hand. Before any byte is read or written, a
//! fixable beet is resolved, against a value (to encode) or against the serialized
//! bytes (to decode), into a [FixedSizeBeet] that knows the exact byte size of that
//! one instance. Buffers are therefore allocated once, at their final size.
//!
//! # Wire Format
//!
//! - Integers are little-endian, in their natural width.
//! - Strings, arrays, and maps carry a 4-byte little-endian length (bytes for
//!   strings, elements or entries otherwise) before their contents.
//! - Structs are the concatenation of their fields, in declaration order.
//!
//! # Supported Types
//!
//! - Scalars: [U8] through [U128], [I8] through [I128], and [Bool]
//! - Strings: [FixedSizeUtf8String] and [Utf8String]
//! - Arrays: [UniformFixedSizeArray], [FixedSizeArray], and [Array]
//! - Bytes: [FixedSizeBuffer], [FixedSizeUint8Array], and [Uint8Array]
//! - Maps: [FixedSizeMap] and [Map]
//! - Structs: [BeetStruct], [FixableBeetStruct], and their args variants
//!
//! # Example
//!
//! ```
//! use commonware_beet::{decode, encode, Array, Beet, Map, Utf8String, Value, I32};
//! use std::collections::BTreeMap;
//!
//! // A map from names to lists of scores
//! let beet = Beet::from(Map::new(Utf8String::new(), Array::new(I32)));
//! let value = Value::from(BTreeMap::from([
//!     ("alice".to_string(), vec![1i32, -2]),
//!     ("bob".to_string(), vec![]),
//! ]));
//!
//! let buf = encode(&beet, &value).unwrap();
//! assert_eq!(buf.len(), 4 + (4 + 5) + (4 + 8) + (4 + 3) + 4);
//! assert_eq!(decode(&beet, &buf).unwrap(), value);
//! ```
//!
//! # Decoding Untrusted Data
//!
//! Lengths read from data are checked against the remaining buffer before
//! anything is allocated. Dynamic codecs additionally accept a [RangeCfg] (via
//! `with_limit`) bounding the lengths they accept when resolving from data.

pub mod beet;
pub mod codec;
pub mod config;
pub mod error;
pub mod read_write;
pub mod types;
pub mod util;
pub mod value;

// Re-export main types and traits
pub use beet::{
    Beet, ElementCollection, Field, FixableBeet, FixedBeet, FixedField, FixedSizeBeet, Source,
};
pub use codec::{decode, encode};
pub use config::RangeCfg;
pub use error::Error;
pub use read_write::{BeetReader, BeetWriter};
pub use types::{
    collections::{
        Array, FixedSizeArray, FixedSizeBuffer, FixedSizeUint8Array, Uint8Array,
        UniformFixedSizeArray,
    },
    map::{FixedEntries, FixedSizeMap, Map},
    primitives::{Bool, I128, I16, I32, I64, I8, U128, U16, U32, U64, U8},
    string::{FixedSizeUtf8String, Utf8String},
    structs::{BeetArgsStruct, BeetStruct, FixableBeetArgsStruct, FixableBeetStruct, StructField},
};
pub use value::{field, Record, Value};
