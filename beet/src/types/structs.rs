//! Struct codecs.
//!
//! A struct is the concatenation of its fields in declared order, with no header.
//! Each [StructField] pairs a codec with a typed getter used when writing, and
//! each struct carries a constructor that assembles the fields read back into a
//! domain instance:
//!
//! ```
//! use commonware_beet::{field, FixableBeetStruct, StructField, Utf8String, U8};
//!
//! #[derive(Debug, PartialEq)]
//! struct Pair {
//!     a: u8,
//!     b: String,
//! }
//!
//! let beet = FixableBeetStruct::new(
//!     vec![
//!         StructField::new("a", U8, |p: &Pair| p.a),
//!         StructField::new("b", Utf8String::new(), |p: &Pair| p.b.clone()),
//!     ],
//!     |mut record| {
//!         Ok(Pair {
//!             a: field(&mut record, "a")?,
//!             b: field(&mut record, "b")?,
//!         })
//!     },
//! )
//! .unwrap();
//!
//! let pair = Pair { a: 5, b: "hi".into() };
//! let buf = beet.serialize(&pair).unwrap();
//! assert_eq!(&buf[..], &[5, 2, 0, 0, 0, b'h', b'i']);
//! assert_eq!(beet.deserialize(&buf, 0).unwrap(), (pair, 7));
//! ```

use crate::{
    util, Beet, BeetReader, BeetWriter, Error, FixableBeet, FixedBeet, FixedField, FixedSizeBeet,
    Record, Value,
};
use bytes::BytesMut;
use std::{collections::BTreeSet, fmt, sync::Arc};
use tracing::trace;

type Getter<T> = Arc<dyn Fn(&T) -> Result<Value, Error> + Send + Sync>;
type Constructor<T> = Arc<dyn Fn(Record) -> Result<T, Error> + Send + Sync>;

const BEET_STRUCT: &str = "BeetStruct";
const FIXABLE_BEET_STRUCT: &str = "FixableBeetStruct";

/// A named member of `T` along with its codec and a getter for its value.
pub struct StructField<T> {
    name: String,
    beet: Beet,
    get: Getter<T>,
}

impl<T: 'static> StructField<T> {
    pub fn new<V, F>(name: impl Into<String>, beet: impl Into<Beet>, get: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            beet: beet.into(),
            get: Arc::new(move |instance: &T| -> Result<Value, Error> {
                Ok(get(instance).into())
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn beet(&self) -> &Beet {
        &self.beet
    }
}

impl StructField<Record> {
    /// A field of an args struct, read from the record by name.
    pub fn arg(name: impl Into<String>, beet: impl Into<Beet>) -> Self {
        let name = name.into();
        let key = name.clone();
        Self {
            name,
            beet: beet.into(),
            get: Arc::new(move |record: &Record| -> Result<Value, Error> {
                record
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| Error::MissingField(key.clone()))
            }),
        }
    }
}

impl<T> Clone for StructField<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            beet: self.beet.clone(),
            get: self.get.clone(),
        }
    }
}

impl<T> fmt::Debug for StructField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructField")
            .field("name", &self.name)
            .field("beet", &self.beet)
            .finish()
    }
}

/// De/Serializes a struct whose fields all have a fixed size.
///
/// Read at the [Value] level, a struct yields a [Value::Record]; [BeetStruct::deserialize]
/// additionally runs the constructor to produce a `T`.
pub struct BeetStruct<T> {
    fields: Vec<FixedField>,
    getters: Vec<Getter<T>>,
    construct: Constructor<T>,
    description: String,
    byte_size: usize,
}

/// A [BeetStruct] that yields the raw field [Record] instead of a typed instance.
pub type BeetArgsStruct = BeetStruct<Record>;

/// Field names key the [Record] a struct reads into, so they must be distinct.
fn check_unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), Error> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::DuplicateField(name.to_string()));
        }
    }
    Ok(())
}

impl<T: 'static> BeetStruct<T> {
    /// Creates a struct codec from fixed fields.
    ///
    /// Fails if any field is fixable (use [FixableBeetStruct] for those) or if two
    /// fields share a name.
    pub fn new<F>(fields: Vec<StructField<T>>, construct: F) -> Result<Self, Error>
    where
        F: Fn(Record) -> Result<T, Error> + Send + Sync + 'static,
    {
        check_unique_names(fields.iter().map(|field| field.name.as_str()))?;
        let mut fixed = Vec::with_capacity(fields.len());
        let mut getters = Vec::with_capacity(fields.len());
        for field in fields {
            fixed.push(FixedField {
                name: field.name,
                beet: field.beet.assert_fixed()?.clone(),
            });
            getters.push(field.get);
        }
        Ok(Self::from_parts(
            fixed,
            getters,
            Arc::new(construct),
            BEET_STRUCT.to_string(),
        ))
    }

    fn from_parts(
        fields: Vec<FixedField>,
        getters: Vec<Getter<T>>,
        construct: Constructor<T>,
        description: String,
    ) -> Self {
        let byte_size = fields.iter().map(|field| field.beet.byte_size()).sum();
        Self {
            fields,
            getters,
            construct,
            description,
            byte_size,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn fields(&self) -> &[FixedField] {
        &self.fields
    }

    /// Collects the field values of `instance` into a record.
    pub fn to_record(&self, instance: &T) -> Result<Record, Error> {
        self.fields
            .iter()
            .zip(&self.getters)
            .map(|(field, get)| Ok((field.name.clone(), get(instance)?)))
            .collect()
    }

    /// Serializes `instance` into a new buffer of exactly [FixedBeet::byte_size] bytes.
    pub fn serialize(&self, instance: &T) -> Result<BytesMut, Error> {
        let mut buf = BytesMut::zeroed(self.byte_size);
        let mut writer = BeetWriter::new(&mut buf);
        for (field, get) in self.fields.iter().zip(&self.getters) {
            writer.write(&field.beet, &get(instance)?)?;
        }
        writer.finish()?;
        Ok(buf)
    }

    /// Deserializes an instance from `buf` starting at `offset`.
    ///
    /// Returns the instance and the offset just past it.
    pub fn deserialize(&self, buf: &[u8], offset: usize) -> Result<(T, usize), Error> {
        let mut reader = BeetReader::new(buf, offset);
        let record = reader.read_struct(&self.fields)?;
        Ok(((self.construct)(record)?, reader.offset()))
    }
}

impl BeetStruct<Record> {
    /// Creates an args struct from fixed fields with distinct names.
    pub fn args(fields: Vec<FixedField>) -> Result<Self, Error> {
        check_unique_names(fields.iter().map(|field| field.name.as_str()))?;
        let getters = fields
            .iter()
            .map(|field| StructField::arg(field.name.clone(), field.beet.clone()).get)
            .collect();
        Ok(Self::from_parts(
            fields,
            getters,
            Arc::new(Ok::<Record, Error>),
            "BeetArgsStruct".to_string(),
        ))
    }
}

impl<T: 'static> FixedBeet for BeetStruct<T> {
    fn byte_size(&self) -> usize {
        self.byte_size
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        let mut writer = BeetWriter::at(buf, offset, self.byte_size)?;
        writer.write_struct(&self.fields, value.as_record()?)?;
        writer.finish()?;
        Ok(())
    }

    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        let mut reader = BeetReader::new(buf, offset);
        Ok(Value::Record(reader.read_struct(&self.fields)?))
    }
}

impl<T> Clone for BeetStruct<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            getters: self.getters.clone(),
            construct: self.construct.clone(),
            description: self.description.clone(),
            byte_size: self.byte_size,
        }
    }
}

impl<T> fmt::Debug for BeetStruct<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeetStruct")
            .field("description", &self.description)
            .field("fields", &self.fields)
            .field("byte_size", &self.byte_size)
            .finish()
    }
}

impl<T: 'static> From<BeetStruct<T>> for FixedSizeBeet {
    fn from(beet: BeetStruct<T>) -> Self {
        FixedSizeBeet::scalar(beet)
    }
}

impl<T: 'static> From<BeetStruct<T>> for Beet {
    fn from(beet: BeetStruct<T>) -> Self {
        Beet::Fixed(beet.into())
    }
}

/// De/Serializes a struct with fields of fixed or fixable size.
///
/// Each operation first resolves a [BeetStruct] for the particular instance or
/// data. Serializing reads every field of the instance twice (once to resolve,
/// once to write), so getters must not have side effects.
pub struct FixableBeetStruct<T> {
    fields: Vec<StructField<T>>,
    construct: Constructor<T>,
    description: Option<String>,
}

/// A [FixableBeetStruct] that yields the raw field [Record] instead of a typed instance.
pub type FixableBeetArgsStruct = FixableBeetStruct<Record>;

impl<T: 'static> FixableBeetStruct<T> {
    /// Creates a struct codec from fields of fixed or fixable size with distinct names.
    pub fn new<F>(fields: Vec<StructField<T>>, construct: F) -> Result<Self, Error>
    where
        F: Fn(Record) -> Result<T, Error> + Send + Sync + 'static,
    {
        check_unique_names(fields.iter().map(|field| field.name.as_str()))?;
        Ok(Self {
            fields,
            construct: Arc::new(construct),
            description: None,
        })
    }

    /// Sets a description, which resolved structs inherit.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn fixed(&self, fields: Vec<FixedField>) -> BeetStruct<T> {
        BeetStruct::from_parts(
            fields,
            self.fields.iter().map(|field| field.get.clone()).collect(),
            self.construct.clone(),
            self.description
                .clone()
                .unwrap_or_else(|| BEET_STRUCT.to_string()),
        )
    }

    /// Resolves the layout of the struct serialized in `buf` at `offset`.
    pub fn resolve_from_data(&self, buf: &[u8], offset: usize) -> Result<BeetStruct<T>, Error> {
        let mut cursor = offset;
        let mut fields = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let beet = field.beet.fix_from_data(buf, cursor)?;
            cursor += beet.byte_size();
            fields.push(FixedField {
                name: field.name.clone(),
                beet,
            });
        }
        util::at_least(buf, offset, cursor - offset)?;
        trace!(offset, byte_size = cursor - offset, "resolved struct from data");
        Ok(self.fixed(fields))
    }

    /// Resolves the layout of `instance`, reading each fixable field once.
    pub fn resolve_from_instance(&self, instance: &T) -> Result<BeetStruct<T>, Error> {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let beet = match &field.beet {
                    Beet::Fixed(beet) => beet.clone(),
                    Beet::Fixable(beet) => beet.to_fixed_from_value(&(field.get)(instance)?)?,
                };
                Ok(FixedField {
                    name: field.name.clone(),
                    beet,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let fixed = self.fixed(fields);
        trace!(byte_size = fixed.byte_size, "resolved struct from instance");
        Ok(fixed)
    }

    /// Resolves the layout of a record holding the field values.
    pub fn resolve_from_record(&self, record: &Record) -> Result<BeetStruct<T>, Error> {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let beet = match &field.beet {
                    Beet::Fixed(beet) => beet.clone(),
                    Beet::Fixable(beet) => {
                        let value = record
                            .get(&field.name)
                            .ok_or_else(|| Error::MissingField(field.name.clone()))?;
                        beet.to_fixed_from_value(value)?
                    }
                };
                Ok(FixedField {
                    name: field.name.clone(),
                    beet,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(self.fixed(fields))
    }

    /// Serializes `instance` into a new buffer sized exactly for it.
    pub fn serialize(&self, instance: &T) -> Result<BytesMut, Error> {
        self.resolve_from_instance(instance)?.serialize(instance)
    }

    /// Deserializes an instance from `buf` starting at `offset`.
    ///
    /// Returns the instance and the offset just past it.
    pub fn deserialize(&self, buf: &[u8], offset: usize) -> Result<(T, usize), Error> {
        self.resolve_from_data(buf, offset)?.deserialize(buf, offset)
    }
}

impl FixableBeetStruct<Record> {
    /// Creates an args struct from fields of fixed or fixable size.
    pub fn args(fields: Vec<crate::Field>) -> Result<Self, Error> {
        check_unique_names(fields.iter().map(|field| field.name.as_str()))?;
        Ok(Self {
            fields: fields
                .into_iter()
                .map(|field| StructField::arg(field.name, field.beet))
                .collect(),
            construct: Arc::new(Ok::<Record, Error>),
            description: Some("FixableBeetArgsStruct".to_string()),
        })
    }
}

impl<T: 'static> FixableBeet for FixableBeetStruct<T> {
    fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| FIXABLE_BEET_STRUCT.to_string())
    }

    fn to_fixed_from_data(&self, buf: &[u8], offset: usize) -> Result<FixedSizeBeet, Error> {
        Ok(self.resolve_from_data(buf, offset)?.into())
    }

    fn to_fixed_from_value(&self, value: &Value) -> Result<FixedSizeBeet, Error> {
        Ok(self.resolve_from_record(value.as_record()?)?.into())
    }
}

impl<T> fmt::Debug for FixableBeetStruct<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixableBeetStruct")
            .field("description", &self.description)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T: 'static> From<FixableBeetStruct<T>> for Beet {
    fn from(beet: FixableBeetStruct<T>) -> Self {
        Beet::fixable(beet)
    }
}
