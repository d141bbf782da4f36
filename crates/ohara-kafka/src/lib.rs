//! Kafka plumbing for ohara.
//!
//! Features:
//!
//! - Typed codecs: [`Serializer`] implementations for bytes, strings, numbers and rows
//! - Typed consumer/producer builders over `rdkafka`
//! - Topic administration
//! - A REST client for Kafka Connect workers ([`WorkerClient`])
//! - The row connector contract implemented by ohara connectors

pub mod admin;

/// Row connector contract: task configs, connectors, tasks and records
pub mod connector;

/// Typed consumer with deadline-bounded polling
pub mod consumer;
pub mod error;

/// Typed producer with a fluent record sender
pub mod producer;
pub mod serialization;

/// Connect worker REST client
pub mod worker;

pub use admin::TopicAdmin;
pub use consumer::{Consumer, ConsumerBuilder, Record};
pub use error::{Error, Result};
pub use producer::{Acks, Producer, ProducerBuilder, RecordMetadata};
pub use serialization::{
    BytesSerializer, DoubleSerializer, IntSerializer, LongSerializer, RowSerializer,
    Serializer, StringSerializer,
};
pub use worker::{ConnectorCreator, ConnectorInfo, ConnectorStatus, WorkerClient};
