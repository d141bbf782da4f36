use crate::error::{Error, Result};
use crate::serialization::Serializer;
use ohara_common::util;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{
    CommitMode, Consumer as RdkafkaConsumer, StreamConsumer as RdkafkaStreamConsumer,
};
use rdkafka::message::{BorrowedMessage as RdkafkaBorrowedMessage, Headers, Message as _};
use rdkafka::{Offset, TopicPartitionList};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// A record read from a topic, with key and value decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<K, V> {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Milliseconds since epoch, when the broker reported one
    pub timestamp: Option<i64>,
    pub key: Option<K>,
    pub value: Option<V>,
    pub headers: Vec<(String, Vec<u8>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OffsetReset {
    Earliest,
    Latest,
}

/// Builder for [`Consumer`].
///
/// `connection_props` and at least one topic are required. Without an explicit
/// group id every consumer gets its own random group.
#[derive(Debug, Clone)]
pub struct ConsumerBuilder {
    connection_props: Option<String>,
    topics: Vec<String>,
    group_id: Option<String>,
    offset_reset: OffsetReset,
    options: BTreeMap<String, String>,
}

impl Default for ConsumerBuilder {
    fn default() -> Self {
        Self {
            connection_props: None,
            topics: Vec::new(),
            group_id: None,
            offset_reset: OffsetReset::Latest,
            options: BTreeMap::new(),
        }
    }
}

impl ConsumerBuilder {
    pub fn connection_props(mut self, brokers: impl Into<String>) -> Self {
        self.connection_props = Some(brokers.into());
        self
    }

    pub fn topic_name(mut self, topic: impl Into<String>) -> Self {
        self.topics = vec![topic.into()];
        self
    }

    pub fn topic_names<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Start from the earliest offset when the group has no committed offsets.
    pub fn offset_from_begin(mut self) -> Self {
        self.offset_reset = OffsetReset::Earliest;
        self
    }

    /// Start after the latest offset when the group has no committed offsets.
    pub fn offset_after_latest(mut self) -> Self {
        self.offset_reset = OffsetReset::Latest;
        self
    }

    /// Raw librdkafka property, applied after the builder's own settings.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn build<K, V>(
        self,
        key_serializer: impl Serializer<K> + 'static,
        value_serializer: impl Serializer<V> + 'static,
    ) -> Result<Consumer<K, V>> {
        let brokers = self
            .connection_props
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("connection_props is required".to_string()))?;
        if self.topics.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one topic is required".to_string(),
            ));
        }
        let group_id = self.group_id.unwrap_or_else(util::uuid);

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &brokers)
            .set("group.id", &group_id)
            .set(
                "auto.offset.reset",
                match self.offset_reset {
                    OffsetReset::Earliest => "earliest",
                    OffsetReset::Latest => "latest",
                },
            )
            .set("enable.partition.eof", "false")
            .set("enable.auto.commit", "false");
        for (key, value) in &self.options {
            config.set(key, value);
        }

        let inner: RdkafkaStreamConsumer = config
            .create()
            .map_err(|e| Error::Consumer(format!("Failed to create consumer: {e}")))?;

        let topics: Vec<&str> = self.topics.iter().map(String::as_str).collect();
        inner
            .subscribe(&topics)
            .map_err(|e| Error::Consumer(format!("Failed to subscribe to topics: {e}")))?;

        tracing::debug!(
            "Consumer of group {group_id} subscribed to {:?} on {brokers}",
            self.topics
        );

        Ok(Consumer {
            inner,
            key_serializer: Box::new(key_serializer),
            value_serializer: Box::new(value_serializer),
            topics: self.topics,
        })
    }
}

/// Typed consumer over one or more topics.
pub struct Consumer<K, V> {
    inner: RdkafkaStreamConsumer,
    key_serializer: Box<dyn Serializer<K>>,
    value_serializer: Box<dyn Serializer<V>>,
    topics: Vec<String>,
}

impl Consumer<(), ()> {
    pub fn builder() -> ConsumerBuilder {
        ConsumerBuilder::default()
    }
}

impl<K, V> Consumer<K, V> {
    /// Receive records until `expected` of them arrived or `timeout` elapsed.
    ///
    /// Returns whatever was received, which may be fewer than `expected`.
    /// Offsets are not committed; call [`Consumer::commit`] for that.
    pub async fn poll(&self, timeout: Duration, expected: usize) -> Result<Vec<Record<K, V>>> {
        let deadline = Instant::now() + timeout;
        let mut records = Vec::new();

        while records.len() < expected {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match tokio::time::timeout(deadline - now, self.inner.recv()).await {
                Ok(Ok(msg)) => records.push(self.decode_message(&msg)?),
                Ok(Err(e)) => {
                    return Err(Error::Consumer(format!("Error receiving message: {e}")))
                }
                Err(_) => break,
            }
        }

        tracing::trace!("Polled {} records from {:?}", records.len(), self.topics);
        Ok(records)
    }

    /// Synchronously commit the offsets of everything received so far.
    pub fn commit(&self) -> Result<()> {
        self.inner
            .commit_consumer_state(CommitMode::Sync)
            .map_err(|e| Error::Consumer(format!("Failed to commit offsets: {e}")))
    }

    /// Commit the offsets just past the given records.
    ///
    /// Only the highest offset per topic-partition is committed. The commit is
    /// queued without waiting for the broker; the group coordinator applies
    /// commits in order, and pending ones complete when the consumer closes.
    pub fn commit_records(&self, records: &[Record<K, V>]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut latest: HashMap<(&str, i32), i64> = HashMap::new();
        for record in records {
            let offset = latest
                .entry((record.topic.as_str(), record.partition))
                .or_insert(record.offset);
            *offset = (*offset).max(record.offset);
        }

        let mut tpl = TopicPartitionList::new();
        for ((topic, partition), offset) in latest {
            tpl.add_partition_offset(topic, partition, Offset::Offset(offset + 1))
                .map_err(|e| Error::Consumer(format!("Failed to add partition offset: {e}")))?;
        }

        self.inner
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| Error::Consumer(format!("Failed to commit offsets: {e}")))
    }

    /// Topics this consumer subscribed to.
    pub fn subscription(&self) -> &[String] {
        &self.topics
    }

    fn decode_message(&self, msg: &RdkafkaBorrowedMessage) -> Result<Record<K, V>> {
        let key = msg
            .key()
            .map(|k| self.key_serializer.from_bytes(k))
            .transpose()?;
        let value = msg
            .payload()
            .map(|v| self.value_serializer.from_bytes(v))
            .transpose()?;
        let headers = msg
            .headers()
            .map(|headers| {
                headers
                    .iter()
                    .map(|h| (h.key.to_string(), h.value.map(<[u8]>::to_vec).unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Record {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            timestamp: msg.timestamp().to_millis(),
            key,
            value,
            headers,
        })
    }

    /// Get the underlying consumer (for advanced use cases)
    pub fn inner(&self) -> &RdkafkaStreamConsumer {
        &self.inner
    }
}
