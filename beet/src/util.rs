//! Bounds-checked buffer access shared by all codecs.

use crate::Error;
use bytes::{Buf, BufMut};

/// Number of bytes used by every length (or count) prefix on the wire.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Returns `buf[offset..offset + len]`, or [Error::EndOfBuffer] if the span is too short.
#[inline]
pub(crate) fn at_least(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], Error> {
    let remaining = buf.len().saturating_sub(offset);
    if offset > buf.len() || remaining < len {
        return Err(Error::EndOfBuffer {
            offset,
            needed: len,
            remaining,
        });
    }
    Ok(&buf[offset..offset + len])
}

/// Returns `buf[offset..offset + len]` for writing, or [Error::BufferOverflow] if the
/// buffer was not sized to hold it.
#[inline]
pub(crate) fn room_for(buf: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8], Error> {
    let capacity = buf.len();
    if offset > capacity || capacity - offset < len {
        return Err(Error::BufferOverflow {
            offset,
            needed: len,
            capacity,
        });
    }
    Ok(&mut buf[offset..offset + len])
}

/// Reads a little-endian `u32` length prefix at `offset`.
#[inline]
pub(crate) fn read_len(buf: &[u8], offset: usize) -> Result<usize, Error> {
    let mut prefix = at_least(buf, offset, LEN_PREFIX_SIZE)?;
    let len = prefix.get_u32_le();
    usize::try_from(len).map_err(|_| Error::InvalidLength(len as usize))
}

/// Writes `len` as a little-endian `u32` length prefix at `offset`.
#[inline]
pub(crate) fn write_len(buf: &mut [u8], offset: usize, len: usize) -> Result<(), Error> {
    let len = u32::try_from(len).map_err(|_| Error::InvalidLength(len))?;
    let mut prefix = room_for(buf, offset, LEN_PREFIX_SIZE)?;
    prefix.put_u32_le(len);
    Ok(())
}

/// Fails with [Error::LengthMismatch] unless `found == expected`.
#[inline]
pub(crate) fn expect_len(
    context: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), Error> {
    if expected != found {
        return Err(Error::LengthMismatch {
            context,
            expected,
            found,
        });
    }
    Ok(())
}
