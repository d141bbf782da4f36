//! Byte codecs for record keys and values.
//!
//! Number encodings are big-endian and match the broker's native
//! integer/long/double serializers, so topics stay readable by other clients.

use crate::error::{Error, Result};
use ohara_common::Row;

/// Converts between a value and its byte form on a topic.
pub trait Serializer<T>: Send + Sync {
    fn to_bytes(&self, value: &T) -> Result<Vec<u8>>;

    fn from_bytes(&self, bytes: &[u8]) -> Result<T>;
}

/// Identity codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

impl Serializer<Vec<u8>> for BytesSerializer {
    fn to_bytes(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// UTF-8 codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

impl Serializer<String> for StringSerializer {
    fn to_bytes(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Serialization(format!("Invalid UTF-8 string: {e}")))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntSerializer;

impl Serializer<i32> for IntSerializer {
    fn to_bytes(&self, value: &i32) -> Result<Vec<u8>> {
        Ok(value.to_be_bytes().to_vec())
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<i32> {
        Ok(i32::from_be_bytes(fixed::<4>(bytes, "int")?))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LongSerializer;

impl Serializer<i64> for LongSerializer {
    fn to_bytes(&self, value: &i64) -> Result<Vec<u8>> {
        Ok(value.to_be_bytes().to_vec())
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<i64> {
        Ok(i64::from_be_bytes(fixed::<8>(bytes, "long")?))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleSerializer;

impl Serializer<f64> for DoubleSerializer {
    fn to_bytes(&self, value: &f64) -> Result<Vec<u8>> {
        Ok(value.to_bits().to_be_bytes().to_vec())
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(fixed::<8>(
            bytes, "double",
        )?)))
    }
}

/// JSON codec for [`Row`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RowSerializer;

impl Serializer<Row> for RowSerializer {
    fn to_bytes(&self, value: &Row) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| Error::Serialization(format!("Failed to encode row: {e}")))
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Row> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::Serialization(format!("Failed to decode row: {e}")))
    }
}

fn fixed<const N: usize>(bytes: &[u8], kind: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::Serialization(format!(
            "Size of data received by {kind} deserializer is not {N} (got {})",
            bytes.len()
        ))
    })
}
