//! Canonical byte encoding for keys and values.
//!
//! Any type implementing [`serde::Serialize`] can be encoded. The output is a
//! deterministic, compact byte sequence meant only for hashing; it is never
//! decoded. Two values that serialize the same way produce identical bytes,
//! which is why a `String` key can be looked up with a `&str`.
//!
//! The layout is:
//!
//! - integers, `char` (as `u32`) and floats (as IEEE bits) are little-endian at
//!   their native width, `bool` is a single byte
//! - strings and byte slices carry a `u64` length prefix
//! - sequences and maps carry a `u64` element count, which must be known
//!   before the first element is written
//! - `Option` carries a `0`/`1` tag byte, enum variants a `u32` variant index
//! - unit values encode to nothing, structs and tuples are their fields in
//!   order
//!
//! Collections whose iteration order is not deterministic (such as
//! `std::collections::HashMap`) do not produce canonical bytes and should not
//! be used inside keys.

use alloc::string::String;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt::Display;

use serde::Serialize;
use serde::ser;

/// A value could not be converted into a canonical byte sequence.
///
/// This is raised when a [`Serialize`] implementation refuses to serialize
/// (for example a handle with no stable representation calling
/// [`ser::Error::custom`]), or when a sequence or map does not report its
/// length up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    message: String,
}

impl EncodingError {
    fn unsized_collection() -> Self {
        Self {
            message: "sequence or map length must be known before encoding".to_string(),
        }
    }

    /// Describes why encoding failed.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "value has no canonical byte encoding: {}", self.message)
    }
}

impl core::error::Error for EncodingError {}

impl ser::Error for EncodingError {
    fn custom<T: Display>(msg: T) -> Self {
        Self {
            message: msg.to_string(),
        }
    }
}

/// Encodes `value` into a freshly allocated byte vector.
///
/// # Examples
///
/// ```rust
/// use chain_map::encode::to_bytes;
///
/// assert_eq!(to_bytes(&0x0102_u16).unwrap(), vec![0x02, 0x01]);
/// // `String` and `str` share an encoding
/// assert_eq!(
///     to_bytes("key").unwrap(),
///     to_bytes(&String::from("key")).unwrap()
/// );
/// ```
pub fn to_bytes<T>(value: &T) -> Result<Vec<u8>, EncodingError>
where
    T: Serialize + ?Sized,
{
    let mut out = Vec::new();
    encode_into(&mut out, value)?;
    Ok(out)
}

/// Appends the encoding of `value` to `out`.
///
/// On failure `out` may contain a partial encoding.
pub fn encode_into<T>(out: &mut Vec<u8>, value: &T) -> Result<(), EncodingError>
where
    T: Serialize + ?Sized,
{
    value.serialize(&mut Encoder { out })
}

struct Encoder<'a> {
    out: &'a mut Vec<u8>,
}

impl Encoder<'_> {
    #[inline(always)]
    fn put(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    #[inline(always)]
    fn put_len(&mut self, len: usize) {
        self.put(&(len as u64).to_le_bytes());
    }

    #[inline(always)]
    fn put_variant(&mut self, variant_index: u32) {
        self.put(&variant_index.to_le_bytes());
    }
}

impl<'a> ser::Serializer for &mut Encoder<'a> {
    type Ok = ();
    type Error = EncodingError;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<(), EncodingError> {
        self.put(&[v as u8]);
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), EncodingError> {
        self.put(&[v]);
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<(), EncodingError> {
        self.put(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), EncodingError> {
        self.put(&v.to_bits().to_le_bytes());
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<(), EncodingError> {
        self.put(&v.to_bits().to_le_bytes());
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<(), EncodingError> {
        self.put(&u32::from(v).to_le_bytes());
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<(), EncodingError> {
        self.serialize_bytes(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), EncodingError> {
        self.put_len(v.len());
        self.put(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<(), EncodingError> {
        self.put(&[0]);
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        self.put(&[1]);
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), EncodingError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), EncodingError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<(), EncodingError> {
        self.put_variant(variant_index);
        Ok(())
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        self.put_variant(variant_index);
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, EncodingError> {
        let len = len.ok_or_else(EncodingError::unsized_collection)?;
        self.put_len(len);
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, EncodingError> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, EncodingError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, EncodingError> {
        self.put_variant(variant_index);
        Ok(self)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, EncodingError> {
        let len = len.ok_or_else(EncodingError::unsized_collection)?;
        self.put_len(len);
        Ok(self)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, EncodingError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, EncodingError> {
        self.put_variant(variant_index);
        Ok(self)
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

impl<'a> ser::SerializeSeq for &mut Encoder<'a> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodingError> {
        Ok(())
    }
}

impl<'a> ser::SerializeTuple for &mut Encoder<'a> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodingError> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleStruct for &mut Encoder<'a> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodingError> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleVariant for &mut Encoder<'a> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodingError> {
        Ok(())
    }
}

impl<'a> ser::SerializeMap for &mut Encoder<'a> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        key.serialize(&mut **self)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodingError> {
        Ok(())
    }
}

impl<'a> ser::SerializeStruct for &mut Encoder<'a> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodingError> {
        Ok(())
    }
}

impl<'a> ser::SerializeStructVariant for &mut Encoder<'a> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<(), EncodingError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodingError> {
        Ok(())
    }
}
