use crate::error::{Error, Result};
use crate::serialization::Serializer;
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer as RdkafkaProducer};
use std::collections::BTreeMap;
use std::time::Duration;

/// How long a send may wait for room in the local queue.
const QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Acknowledgement level requested from the brokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acks {
    None,
    One,
    #[default]
    All,
}

impl Acks {
    fn as_str(&self) -> &'static str {
        match self {
            Self::None => "0",
            Self::One => "1",
            Self::All => "all",
        }
    }
}

/// Where a record landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Builder for [`Producer`]. `connection_props` is required.
#[derive(Debug, Clone, Default)]
pub struct ProducerBuilder {
    connection_props: Option<String>,
    acks: Acks,
    options: BTreeMap<String, String>,
}

impl ProducerBuilder {
    pub fn connection_props(mut self, brokers: impl Into<String>) -> Self {
        self.connection_props = Some(brokers.into());
        self
    }

    pub fn acks(mut self, acks: Acks) -> Self {
        self.acks = acks;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn build<K, V>(
        self,
        key_serializer: impl Serializer<K> + 'static,
        value_serializer: impl Serializer<V> + 'static,
    ) -> Result<Producer<K, V>> {
        let brokers = self
            .connection_props
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("connection_props is required".to_string()))?;

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &brokers)
            .set("acks", self.acks.as_str())
            .set("message.timeout.ms", "30000");
        for (key, value) in &self.options {
            config.set(key, value);
        }

        let inner: FutureProducer = config
            .create()
            .map_err(|e| Error::Producer(format!("Failed to create producer: {e}")))?;

        Ok(Producer {
            inner,
            key_serializer: Box::new(key_serializer),
            value_serializer: Box::new(value_serializer),
        })
    }
}

/// Typed producer.
pub struct Producer<K, V> {
    inner: FutureProducer,
    key_serializer: Box<dyn Serializer<K>>,
    value_serializer: Box<dyn Serializer<V>>,
}

impl Producer<(), ()> {
    pub fn builder() -> ProducerBuilder {
        ProducerBuilder::default()
    }
}

impl<K, V> Producer<K, V> {
    /// Start a record; finish it with [`Sender::send`].
    pub fn sender(&self) -> Sender<'_, K, V> {
        Sender {
            producer: self,
            key: None,
            value: None,
            partition: None,
            timestamp: None,
            headers: Vec::new(),
        }
    }

    /// Wait until all queued records are delivered.
    ///
    /// librdkafka blocks while flushing, so the wait runs on the blocking pool.
    pub async fn flush(&self, timeout: Duration) -> Result<()> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.flush(timeout))
            .await
            .map_err(|e| Error::Producer(format!("Flush task failed: {e}")))??;
        Ok(())
    }

    /// Get the underlying producer (for advanced use cases)
    pub fn inner(&self) -> &FutureProducer {
        &self.inner
    }
}

/// One outgoing record under construction.
pub struct Sender<'a, K, V> {
    producer: &'a Producer<K, V>,
    key: Option<K>,
    value: Option<V>,
    partition: Option<i32>,
    timestamp: Option<i64>,
    headers: Vec<(String, Vec<u8>)>,
}

impl<K, V> Sender<'_, K, V> {
    pub fn key(mut self, key: K) -> Self {
        self.key = Some(key);
        self
    }

    pub fn value(mut self, value: V) -> Self {
        self.value = Some(value);
        self
    }

    pub fn partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    /// Record timestamp in milliseconds since epoch.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Send the record and wait for the broker's acknowledgement.
    pub async fn send(self, topic: &str) -> Result<RecordMetadata> {
        let key = self
            .key
            .as_ref()
            .map(|k| self.producer.key_serializer.to_bytes(k))
            .transpose()?;
        let value = self
            .value
            .as_ref()
            .map(|v| self.producer.value_serializer.to_bytes(v))
            .transpose()?;

        let mut record: FutureRecord<'_, [u8], [u8]> = FutureRecord::to(topic);
        if let Some(key) = key.as_deref() {
            record = record.key(key);
        }
        if let Some(value) = value.as_deref() {
            record = record.payload(value);
        }
        if let Some(partition) = self.partition {
            record = record.partition(partition);
        }
        if let Some(timestamp) = self.timestamp {
            record = record.timestamp(timestamp);
        }
        if !self.headers.is_empty() {
            let mut headers = OwnedHeaders::new();
            for (key, value) in &self.headers {
                headers = headers.insert(Header {
                    key: key.as_str(),
                    value: Some(value.as_slice()),
                });
            }
            record = record.headers(headers);
        }

        let (partition, offset) = self
            .producer
            .inner
            .send(record, QUEUE_TIMEOUT)
            .await
            .map_err(|(err, _)| err)?;

        tracing::trace!("Sent record to {topic}-{partition}@{offset}");
        Ok(RecordMetadata {
            topic: topic.to_string(),
            partition,
            offset,
        })
    }
}
