//! Codec implementations for scalars, collections, strings, maps, and structs.

pub mod collections;
pub mod map;
pub mod primitives;
pub mod string;
pub mod structs;
