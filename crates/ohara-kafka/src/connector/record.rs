use crate::consumer::Record;
use crate::error::{Error, Result};
use ohara_common::Row;

/// A row emitted by a source task.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSourceRecord {
    pub topic: String,
    pub row: Row,
    pub partition: Option<i32>,
    pub timestamp: Option<i64>,
}

impl RowSourceRecord {
    pub fn of(topic: impl Into<String>, row: Row) -> Self {
        Self {
            topic: topic.into(),
            row,
            partition: None,
            timestamp: None,
        }
    }

    pub fn builder() -> RowSourceRecordBuilder {
        RowSourceRecordBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowSourceRecordBuilder {
    topic: Option<String>,
    row: Option<Row>,
    partition: Option<i32>,
    timestamp: Option<i64>,
}

impl RowSourceRecordBuilder {
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn row(mut self, row: Row) -> Self {
        self.row = Some(row);
        self
    }

    pub fn partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> Result<RowSourceRecord> {
        let topic = self
            .topic
            .ok_or_else(|| Error::InvalidConfig("source record requires a topic".to_string()))?;
        let row = self
            .row
            .ok_or_else(|| Error::InvalidConfig("source record requires a row".to_string()))?;
        Ok(RowSourceRecord {
            topic,
            row,
            partition: self.partition,
            timestamp: self.timestamp,
        })
    }
}

/// A row delivered to a sink task.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSinkRecord {
    pub topic: String,
    pub row: Row,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: Option<i64>,
}

impl<K> TryFrom<Record<K, Row>> for RowSinkRecord {
    type Error = Error;

    /// Records without a value (tombstones) carry no row and are rejected.
    fn try_from(record: Record<K, Row>) -> Result<Self> {
        let row = record.value.ok_or_else(|| {
            Error::Connector(format!(
                "record {}-{}@{} has no row",
                record.topic, record.partition, record.offset
            ))
        })?;
        Ok(Self {
            topic: record.topic,
            row,
            partition: record.partition,
            offset: record.offset,
            timestamp: record.timestamp,
        })
    }
}
