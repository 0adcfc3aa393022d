//! Wire primitives
//!
//! Big-endian fixed-width integers, one-byte booleans and ordinals, UTF-8
//! strings with a two-byte length prefix, and UUIDs as two 8-byte halves
//! (most significant first).

use bytes::{Buf, BufMut};
use uuid::Uuid;

use crate::error::{DecodeError, EncodeError};

/// Longest string a two-byte length prefix can describe.
pub const MAX_STRING_BYTES: usize = u16::MAX as usize;

pub fn put_i64(buf: &mut impl BufMut, value: i64) {
    buf.put_i64(value);
}

pub fn put_u8(buf: &mut impl BufMut, value: u8) {
    buf.put_u8(value);
}

pub fn put_bool(buf: &mut impl BufMut, value: bool) {
    buf.put_u8(u8::from(value));
}

pub fn put_uuid(buf: &mut impl BufMut, value: Uuid) {
    let (most, least) = value.as_u64_pair();
    buf.put_u64(most);
    buf.put_u64(least);
}

pub fn put_string(
    buf: &mut impl BufMut,
    field: &'static str,
    value: &str,
) -> Result<(), EncodeError> {
    let len = u16::try_from(value.len()).map_err(|_| EncodeError::StringTooLong {
        field,
        len: value.len(),
        max: MAX_STRING_BYTES,
    })?;
    buf.put_u16(len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

fn ensure(buf: &impl Buf, field: &'static str, len: usize) -> Result<(), DecodeError> {
    let remaining = buf.remaining();
    if remaining < len {
        return Err(DecodeError::Truncated {
            field,
            needed: len - remaining,
        });
    }
    Ok(())
}

pub fn get_i64(buf: &mut impl Buf, field: &'static str) -> Result<i64, DecodeError> {
    ensure(buf, field, 8)?;
    Ok(buf.get_i64())
}

pub fn get_u8(buf: &mut impl Buf, field: &'static str) -> Result<u8, DecodeError> {
    ensure(buf, field, 1)?;
    Ok(buf.get_u8())
}

pub fn get_bool(buf: &mut impl Buf, field: &'static str) -> Result<bool, DecodeError> {
    match get_u8(buf, field)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeError::InvalidBoolean(other)),
    }
}

pub fn get_uuid(buf: &mut impl Buf, field: &'static str) -> Result<Uuid, DecodeError> {
    ensure(buf, field, 16)?;
    let most = buf.get_u64();
    let least = buf.get_u64();
    Ok(Uuid::from_u64_pair(most, least))
}

pub fn get_string(buf: &mut impl Buf, field: &'static str) -> Result<String, DecodeError> {
    ensure(buf, field, 2)?;
    let len = usize::from(buf.get_u16());
    ensure(buf, field, len)?;
    let bytes = buf.copy_to_bytes(len);
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field })
}
