//! Timestamps for records written by a stream.

use ohara_kafka::Record;

/// Picks the timestamp, in epoch milliseconds, of the output record.
///
/// `partition_time` is the highest timestamp extracted so far from the same
/// source partition, or `-1` before the first record.
pub trait TimestampExtractor: Send + Sync {
    fn extract(&self, record: &Record<Vec<u8>, Vec<u8>>, partition_time: i64) -> i64;
}

/// Uses the broker timestamp of the source record.
///
/// Falls back to the partition time when the record carries none.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordTimestampExtractor;

impl TimestampExtractor for RecordTimestampExtractor {
    fn extract(&self, record: &Record<Vec<u8>, Vec<u8>>, partition_time: i64) -> i64 {
        match record.timestamp {
            Some(ts) if ts >= 0 => ts,
            _ => partition_time,
        }
    }
}

/// Stamps records with the local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallclockTimestampExtractor;

impl TimestampExtractor for WallclockTimestampExtractor {
    fn extract(&self, _record: &Record<Vec<u8>, Vec<u8>>, _partition_time: i64) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
