//! Fixed-width scalar codecs.
//!
//! All multi-byte integers are little-endian, matching the Borsh reference
//! encoding. `bool` occupies one byte and decodes only from `0` or `1`.

use crate::{util, Beet, Error, FixedBeet, FixedSizeBeet, Value};
use bytes::{Buf, BufMut};
use paste::paste;

macro_rules! impl_scalar {
    ($beet:ident, $type:ident, $variant:ident) => {
        paste! {
            #[doc = "De/Serializes a little-endian `" $type "`."]
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $beet;

            impl FixedBeet for $beet {
                #[inline]
                fn byte_size(&self) -> usize {
                    std::mem::size_of::<$type>()
                }

                fn description(&self) -> String {
                    stringify!($type).to_string()
                }

                #[inline]
                fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
                    let v = value.[<as_ $type>]()?;
                    let mut dst = util::room_for(buf, offset, std::mem::size_of::<$type>())?;
                    dst.[<put_ $type _le>](v);
                    Ok(())
                }

                #[inline]
                fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
                    let mut src = util::at_least(buf, offset, std::mem::size_of::<$type>())?;
                    Ok(Value::$variant(src.[<get_ $type _le>]()))
                }
            }

            impl From<$beet> for FixedSizeBeet {
                fn from(beet: $beet) -> Self {
                    FixedSizeBeet::scalar(beet)
                }
            }

            impl From<$beet> for Beet {
                fn from(beet: $beet) -> Self {
                    Beet::Fixed(beet.into())
                }
            }
        }
    };
}

impl_scalar!(U16, u16, U16);
impl_scalar!(U32, u32, U32);
impl_scalar!(U64, u64, U64);
impl_scalar!(U128, u128, U128);
impl_scalar!(I16, i16, I16);
impl_scalar!(I32, i32, I32);
impl_scalar!(I64, i64, I64);
impl_scalar!(I128, i128, I128);

// Single-byte scalars have no endianness
macro_rules! impl_byte_scalar {
    ($beet:ident, $type:ident, $variant:ident, $put:ident, $get:ident) => {
        #[doc = concat!("De/Serializes a single `", stringify!($type), "` byte.")]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $beet;

        impl FixedBeet for $beet {
            #[inline]
            fn byte_size(&self) -> usize {
                1
            }

            fn description(&self) -> String {
                stringify!($type).to_string()
            }

            #[inline]
            fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
                let v = value.$variant()?;
                let mut dst = util::room_for(buf, offset, 1)?;
                dst.$put(v);
                Ok(())
            }

            #[inline]
            fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
                let mut src = util::at_least(buf, offset, 1)?;
                Ok(Value::from(src.$get()))
            }
        }

        impl From<$beet> for FixedSizeBeet {
            fn from(beet: $beet) -> Self {
                FixedSizeBeet::scalar(beet)
            }
        }

        impl From<$beet> for Beet {
            fn from(beet: $beet) -> Self {
                Beet::Fixed(beet.into())
            }
        }
    };
}

impl_byte_scalar!(U8, u8, as_u8, put_u8, get_u8);
impl_byte_scalar!(I8, i8, as_i8, put_i8, get_i8);

/// De/Serializes a `bool` as a single `0` or `1` byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bool;

impl FixedBeet for Bool {
    #[inline]
    fn byte_size(&self) -> usize {
        1
    }

    fn description(&self) -> String {
        "bool".to_string()
    }

    #[inline]
    fn write(&self, buf: &mut [u8], offset: usize, value: &Value) -> Result<(), Error> {
        let v = value.as_bool()?;
        let mut dst = util::room_for(buf, offset, 1)?;
        dst.put_u8(u8::from(v));
        Ok(())
    }

    #[inline]
    fn read(&self, buf: &[u8], offset: usize) -> Result<Value, Error> {
        let mut src = util::at_least(buf, offset, 1)?;
        match src.get_u8() {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            b => Err(Error::InvalidBool(b)),
        }
    }
}

impl From<Bool> for FixedSizeBeet {
    fn from(beet: Bool) -> Self {
        FixedSizeBeet::scalar(beet)
    }
}

impl From<Bool> for Beet {
    fn from(beet: Bool) -> Self {
        Beet::Fixed(beet.into())
    }
}
