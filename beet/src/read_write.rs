//! Offset-tracked cursors used to serialize and deserialize structs.

use crate::{Error, FixedField, FixedSizeBeet, Record, Value};
use tracing::debug;

/// Sequences codec writes over a buffer that was sized beforehand.
///
/// The writer never grows its buffer: the exact size must be known (by resolving
/// every beet involved) before the buffer is allocated. Writing past the end of
/// the assigned range fails with [Error::BufferOverflow].
pub struct BeetWriter<'a> {
    buf: &'a mut [u8],
    offset: usize,
    end: usize,
}

impl<'a> BeetWriter<'a> {
    /// Creates a writer over all of `buf`, starting at offset 0.
    pub fn new(buf: &'a mut [u8]) -> Self {
        let end = buf.len();
        Self {
            buf,
            offset: 0,
            end,
        }
    }

    /// Creates a writer over `buf[offset..offset + byte_size]`.
    pub fn at(buf: &'a mut [u8], offset: usize, byte_size: usize) -> Result<Self, Error> {
        let capacity = buf.len();
        let end = offset
            .checked_add(byte_size)
            .filter(|end| *end <= capacity)
            .ok_or(Error::BufferOverflow {
                offset,
                needed: byte_size,
                capacity,
            })?;
        Ok(Self { buf, offset, end })
    }

    /// Current absolute offset into the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Writes `value` with `beet` at the current offset and advances past it.
    pub fn write(&mut self, beet: &FixedSizeBeet, value: &Value) -> Result<(), Error> {
        let byte_size = beet.byte_size();
        if self.end - self.offset < byte_size {
            return Err(Error::BufferOverflow {
                offset: self.offset,
                needed: byte_size,
                capacity: self.end,
            });
        }
        beet.write(self.buf, self.offset, value)?;
        self.offset += byte_size;
        Ok(())
    }

    /// Writes every field of `record`, in field order.
    pub fn write_struct(&mut self, fields: &[FixedField], record: &Record) -> Result<(), Error> {
        for field in fields {
            let value = record
                .get(&field.name)
                .ok_or_else(|| Error::MissingField(field.name.clone()))?;
            self.write(&field.beet, value)?;
        }
        Ok(())
    }

    /// Consumes the writer, returning the final offset.
    ///
    /// Fails with [Error::IncompleteWrite] unless the assigned range was filled exactly.
    pub fn finish(self) -> Result<usize, Error> {
        if self.offset != self.end {
            debug!(
                written = self.offset,
                expected = self.end,
                "writer did not fill its buffer"
            );
            return Err(Error::IncompleteWrite {
                written: self.offset,
                expected: self.end,
            });
        }
        Ok(self.offset)
    }
}

/// Sequences codec reads over a byte span.
pub struct BeetReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> BeetReader<'a> {
    /// Creates a reader over `buf`, starting at `offset`.
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    /// Current absolute offset into the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Reads a value with `beet` at the current offset and advances past it.
    pub fn read(&mut self, beet: &FixedSizeBeet) -> Result<Value, Error> {
        let value = beet.read(self.buf, self.offset)?;
        self.offset += beet.byte_size();
        Ok(value)
    }

    /// Reads every field in order, keyed by field name.
    ///
    /// The offset afterwards points just past the last field.
    pub fn read_struct(&mut self, fields: &[FixedField]) -> Result<Record, Error> {
        let mut record = Record::new();
        for field in fields {
            let value = self.read(&field.beet)?;
            record.insert(field.name.clone(), value);
        }
        Ok(record)
    }
}
