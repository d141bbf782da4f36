//! Key/value serdes for stream applications.
//!
//! A [`Serde`] pairs a [`Serializer`] with a [`Deserializer`] for the same
//! type. Both halves see the application configs once before the stream starts
//! and are closed after it stops. [`Serdes`] hands out the built-in serdes,
//! which reuse the topic codecs of `ohara-kafka`.

use crate::error::{Error, Result};
use ohara_common::Row;
use ohara_kafka::{
    BytesSerializer, DoubleSerializer, IntSerializer, LongSerializer, RowSerializer,
    StringSerializer,
};
use std::collections::BTreeMap;

/// Application configs handed to [`Serde::configure`].
pub type Configs = BTreeMap<String, String>;

pub trait Serializer<T>: Send + Sync {
    fn configure(&mut self, _configs: &Configs, _is_key: bool) {}

    fn serialize(&self, topic: &str, data: &T) -> Result<Vec<u8>>;

    fn close(&mut self) {}
}

pub trait Deserializer<T>: Send + Sync {
    fn configure(&mut self, _configs: &Configs, _is_key: bool) {}

    fn deserialize(&self, topic: &str, data: &[u8]) -> Result<T>;

    fn close(&mut self) {}
}

/// A serializer and deserializer for `T`.
pub trait Serde<T>: SerdeClone<T> + Send + Sync {
    /// Configure both halves.
    fn configure(&mut self, configs: &Configs, is_key: bool);

    /// Close both halves.
    fn close(&mut self);

    fn serializer(&self) -> &dyn Serializer<T>;

    fn deserializer(&self) -> &dyn Deserializer<T>;
}

/// Lets boxed serdes be cloned. Implemented for every `Clone` serde.
pub trait SerdeClone<T> {
    fn clone_box(&self) -> Box<dyn Serde<T>>;
}

impl<T, S> SerdeClone<T> for S
where
    S: Serde<T> + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn Serde<T>> {
        Box::new(self.clone())
    }
}

impl<T> Clone for Box<dyn Serde<T>> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Serde made of two independent halves.
#[derive(Debug, Clone)]
pub struct WrapperSerde<S, D> {
    serializer: S,
    deserializer: D,
}

impl<S, D> WrapperSerde<S, D> {
    pub fn new(serializer: S, deserializer: D) -> Self {
        Self {
            serializer,
            deserializer,
        }
    }
}

impl<C: Clone> WrapperSerde<CodecSerializer<C>, CodecDeserializer<C>> {
    /// Serde backed by a single topic codec.
    pub fn from_codec(codec: C) -> Self {
        Self::new(CodecSerializer(codec.clone()), CodecDeserializer(codec))
    }
}

impl<T, S, D> Serde<T> for WrapperSerde<S, D>
where
    S: Serializer<T> + Clone + 'static,
    D: Deserializer<T> + Clone + 'static,
{
    fn configure(&mut self, configs: &Configs, is_key: bool) {
        self.serializer.configure(configs, is_key);
        self.deserializer.configure(configs, is_key);
    }

    fn close(&mut self) {
        self.serializer.close();
        self.deserializer.close();
    }

    fn serializer(&self) -> &dyn Serializer<T> {
        &self.serializer
    }

    fn deserializer(&self) -> &dyn Deserializer<T> {
        &self.deserializer
    }
}

/// Serializing half of an `ohara-kafka` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecSerializer<C>(pub C);

impl<T, C> Serializer<T> for CodecSerializer<C>
where
    C: ohara_kafka::Serializer<T>,
{
    fn serialize(&self, topic: &str, data: &T) -> Result<Vec<u8>> {
        self.0
            .to_bytes(data)
            .map_err(|e| Error::Serialization(format!("Failed to serialize for {topic}: {e}")))
    }
}

/// Deserializing half of an `ohara-kafka` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecDeserializer<C>(pub C);

impl<T, C> Deserializer<T> for CodecDeserializer<C>
where
    C: ohara_kafka::Serializer<T>,
{
    fn deserialize(&self, topic: &str, data: &[u8]) -> Result<T> {
        self.0
            .from_bytes(data)
            .map_err(|e| Error::Serialization(format!("Failed to deserialize from {topic}: {e}")))
    }
}

pub type CodecSerde<C> = WrapperSerde<CodecSerializer<C>, CodecDeserializer<C>>;
pub type StringSerde = CodecSerde<StringSerializer>;
pub type RowSerde = CodecSerde<RowSerializer>;
pub type DoubleSerde = CodecSerde<DoubleSerializer>;
pub type LongSerde = CodecSerde<LongSerializer>;
pub type IntSerde = CodecSerde<IntSerializer>;
pub type BytesSerde = CodecSerde<BytesSerializer>;

/// Factory for the built-in serdes.
pub struct Serdes;

impl Serdes {
    pub fn string() -> StringSerde {
        WrapperSerde::from_codec(StringSerializer)
    }

    pub fn row() -> RowSerde {
        WrapperSerde::from_codec(RowSerializer)
    }

    pub fn double() -> DoubleSerde {
        WrapperSerde::from_codec(DoubleSerializer)
    }

    pub fn long() -> LongSerde {
        WrapperSerde::from_codec(LongSerializer)
    }

    pub fn int() -> IntSerde {
        WrapperSerde::from_codec(IntSerializer)
    }

    pub fn bytes() -> BytesSerde {
        WrapperSerde::from_codec(BytesSerializer)
    }
}

/// Serdes used to read the source topic.
pub struct Consumed<K, V> {
    pub(crate) key: Box<dyn Serde<K>>,
    pub(crate) value: Box<dyn Serde<V>>,
}

impl<K, V> Consumed<K, V> {
    pub fn with(key: impl Serde<K> + 'static, value: impl Serde<V> + 'static) -> Self {
        Self::from_boxed(Box::new(key), Box::new(value))
    }

    pub(crate) fn from_boxed(key: Box<dyn Serde<K>>, value: Box<dyn Serde<V>>) -> Self {
        Self { key, value }
    }

    pub fn key_serde(&self) -> &dyn Serde<K> {
        self.key.as_ref()
    }

    pub fn value_serde(&self) -> &dyn Serde<V> {
        self.value.as_ref()
    }
}

impl<K, V> Clone for Consumed<K, V> {
    fn clone(&self) -> Self {
        Self::from_boxed(self.key.clone(), self.value.clone())
    }
}

/// Serdes used to write the target topic.
pub struct Produced<K, V> {
    pub(crate) key: Box<dyn Serde<K>>,
    pub(crate) value: Box<dyn Serde<V>>,
}

impl<K, V> Produced<K, V> {
    pub fn with(key: impl Serde<K> + 'static, value: impl Serde<V> + 'static) -> Self {
        Self::from_boxed(Box::new(key), Box::new(value))
    }

    pub(crate) fn from_boxed(key: Box<dyn Serde<K>>, value: Box<dyn Serde<V>>) -> Self {
        Self { key, value }
    }

    pub fn key_serde(&self) -> &dyn Serde<K> {
        self.key.as_ref()
    }

    pub fn value_serde(&self) -> &dyn Serde<V> {
        self.value.as_ref()
    }
}

impl<K, V> Clone for Produced<K, V> {
    fn clone(&self) -> Self {
        Self::from_boxed(self.key.clone(), self.value.clone())
    }
}
