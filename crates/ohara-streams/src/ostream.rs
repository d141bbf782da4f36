//! Runtime of a topic-to-topic stream.
//!
//! The stream reads the source topic in batches, runs every record through its
//! steps and writes what survives to the destination topic. Offsets of a batch
//! are committed once all of its output records are acknowledged.

use crate::error::{Error, Result};
use crate::extractor::TimestampExtractor;
use crate::serdes::{Configs, Consumed, Produced};
use async_trait::async_trait;
use ohara_kafka::{BytesSerializer, Consumer, Producer, Record, TopicAdmin};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const POLL_TIMEOUT: Duration = Duration::from_millis(500);
const MAX_BATCH_SIZE: usize = 500;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub bootstrap_servers: String,
    pub app_id: String,
    pub from_topic: String,
    pub to_topic: String,
    pub clean_start: bool,
}

impl StreamConfig {
    /// Configs handed to every serde before the stream starts.
    pub fn to_configs(&self) -> Configs {
        Configs::from([
            ("bootstrap.servers".to_string(), self.bootstrap_servers.clone()),
            ("application.id".to_string(), self.app_id.clone()),
            ("from.topic".to_string(), self.from_topic.clone()),
            ("to.topic".to_string(), self.to_topic.clone()),
        ])
    }
}

type Step<K, V> =
    Box<dyn Fn(Option<K>, Option<V>) -> Option<(Option<K>, Option<V>)> + Send + Sync>;

/// A configured stream. Nothing runs until [`OStream::start`].
pub struct OStream<K, V> {
    config: StreamConfig,
    consumed: Consumed<K, V>,
    produced: Produced<K, V>,
    extractor: Arc<dyn TimestampExtractor>,
    steps: Vec<Step<K, V>>,
}

/// Record counters of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub consumed: u64,
    pub produced: u64,
    pub filtered: u64,
}

#[derive(Default)]
struct Counters {
    consumed: AtomicU64,
    produced: AtomicU64,
    filtered: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> StreamStats {
        StreamStats {
            consumed: self.consumed.load(Ordering::Relaxed),
            produced: self.produced.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> OStream<K, V> {
    pub(crate) fn new(
        config: StreamConfig,
        consumed: Consumed<K, V>,
        produced: Produced<K, V>,
        extractor: Arc<dyn TimestampExtractor>,
    ) -> Self {
        Self {
            config,
            consumed,
            produced,
            extractor,
            steps: Vec::new(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn consumed(&self) -> &Consumed<K, V> {
        &self.consumed
    }

    pub fn produced(&self) -> &Produced<K, V> {
        &self.produced
    }

    pub fn timestamp_extractor(&self) -> &dyn TimestampExtractor {
        self.extractor.as_ref()
    }

    /// Run a record through every step. `None` means it was filtered out.
    pub fn apply(&self, key: Option<K>, value: Option<V>) -> Option<(Option<K>, Option<V>)> {
        apply_steps(&self.steps, key, value)
    }
}

fn apply_steps<K, V>(
    steps: &[Step<K, V>],
    key: Option<K>,
    value: Option<V>,
) -> Option<(Option<K>, Option<V>)> {
    steps
        .iter()
        .try_fold((key, value), |(key, value), step| step(key, value))
}

impl<K, V> OStream<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    /// Drop records the predicate rejects.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&K>, Option<&V>) -> bool + Send + Sync + 'static,
    {
        self.steps.push(Box::new(move |key: Option<K>, value: Option<V>| {
            predicate(key.as_ref(), value.as_ref()).then_some((key, value))
        }));
        self
    }

    /// Transform values. Tombstones pass through untouched.
    pub fn map_values<F>(mut self, f: F) -> Self
    where
        F: Fn(V) -> V + Send + Sync + 'static,
    {
        self.steps.push(Box::new(move |key: Option<K>, value: Option<V>| {
            Some((key, value.map(&f)))
        }));
        self
    }

    pub fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<K>, Option<V>) -> (Option<K>, Option<V>) + Send + Sync + 'static,
    {
        self.steps.push(Box::new(move |key: Option<K>, value: Option<V>| {
            Some(f(key, value))
        }));
        self
    }

    /// Observe records without changing them.
    pub fn peek<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&K>, Option<&V>) + Send + Sync + 'static,
    {
        self.steps.push(Box::new(move |key: Option<K>, value: Option<V>| {
            f(key.as_ref(), value.as_ref());
            Some((key, value))
        }));
        self
    }

    /// Configure the serdes and spawn the stream loop.
    pub async fn start(self) -> Result<RunningStream> {
        let counters = Arc::new(Counters::default());
        let (config, mut processor) = self.into_processor(Arc::clone(&counters));
        processor.configure(&config.to_configs());

        if config.clean_start {
            tracing::info!("Clean start: deleting consumer group {}", config.app_id);
            TopicAdmin::new(&config.bootstrap_servers)?
                .delete_group(&config.app_id)
                .await?;
        }

        let consumer = Consumer::builder()
            .connection_props(&config.bootstrap_servers)
            .topic_name(&config.from_topic)
            .group_id(&config.app_id)
            .offset_from_begin()
            .build(BytesSerializer, BytesSerializer)?;
        let producer = Producer::builder()
            .connection_props(&config.bootstrap_servers)
            .option("client.id", &config.app_id)
            .build(BytesSerializer, BytesSerializer)?;

        tracing::info!(
            "Starting stream {}: {} -> {}",
            config.app_id,
            config.from_topic,
            config.to_topic
        );

        let mut runner = StreamLoop {
            app_id: config.app_id.clone(),
            processor,
            source: consumer,
            sink: producer,
        };
        Ok(RunningStream::spawn(
            config.app_id,
            counters,
            move |shutdown| async move {
                let result = runner.run(shutdown).await;
                runner.processor.close();
                result
            },
        ))
    }
}

impl<K, V> OStream<K, V> {
    fn into_processor(self, counters: Arc<Counters>) -> (StreamConfig, Processor<K, V>) {
        let processor = Processor {
            from_topic: self.config.from_topic.clone(),
            to_topic: self.config.to_topic.clone(),
            consumed: self.consumed,
            produced: self.produced,
            extractor: self.extractor,
            steps: self.steps,
            counters,
            partition_times: HashMap::new(),
        };
        (self.config, processor)
    }
}

/// Encoded record ready for the destination topic.
#[derive(Debug, Clone, PartialEq)]
struct Output {
    key: Option<Vec<u8>>,
    value: Option<Vec<u8>>,
    timestamp: Option<i64>,
}

/// Decodes a source record, runs the steps, stamps and encodes the result.
struct Processor<K, V> {
    from_topic: String,
    to_topic: String,
    consumed: Consumed<K, V>,
    produced: Produced<K, V>,
    extractor: Arc<dyn TimestampExtractor>,
    steps: Vec<Step<K, V>>,
    counters: Arc<Counters>,
    partition_times: HashMap<i32, i64>,
}

impl<K, V> Processor<K, V> {
    fn configure(&mut self, configs: &Configs) {
        self.consumed.key.configure(configs, true);
        self.consumed.value.configure(configs, false);
        self.produced.key.configure(configs, true);
        self.produced.value.configure(configs, false);
    }

    /// `Ok(None)` means a step filtered the record out.
    fn process(&mut self, record: &Record<Vec<u8>, Vec<u8>>) -> Result<Option<Output>> {
        self.counters.consumed.fetch_add(1, Ordering::Relaxed);

        let from = self.from_topic.as_str();
        let key = record
            .key
            .as_deref()
            .map(|bytes| self.consumed.key.deserializer().deserialize(from, bytes))
            .transpose()?;
        let value = record
            .value
            .as_deref()
            .map(|bytes| self.consumed.value.deserializer().deserialize(from, bytes))
            .transpose()?;

        let Some((key, value)) = apply_steps(&self.steps, key, value) else {
            self.counters.filtered.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        let partition_time = self
            .partition_times
            .get(&record.partition)
            .copied()
            .unwrap_or(-1);
        let timestamp = self.extractor.extract(record, partition_time);
        self.partition_times
            .insert(record.partition, partition_time.max(timestamp));

        let to = self.to_topic.as_str();
        let key = key
            .map(|key| self.produced.key.serializer().serialize(to, &key))
            .transpose()?;
        let value = value
            .map(|value| self.produced.value.serializer().serialize(to, &value))
            .transpose()?;
        Ok(Some(Output {
            key,
            value,
            timestamp: (timestamp >= 0).then_some(timestamp),
        }))
    }

    fn close(&mut self) {
        self.consumed.key.close();
        self.consumed.value.close();
        self.produced.key.close();
        self.produced.value.close();
    }
}

/// Where a stream reads its batches from.
#[async_trait]
trait RecordSource: Send + Sync {
    async fn next_batch(&self) -> Result<Vec<Record<Vec<u8>, Vec<u8>>>>;

    fn commit_batch(&self, batch: &[Record<Vec<u8>, Vec<u8>>]) -> Result<()>;
}

#[async_trait]
impl RecordSource for Consumer<Vec<u8>, Vec<u8>> {
    async fn next_batch(&self) -> Result<Vec<Record<Vec<u8>, Vec<u8>>>> {
        Ok(self.poll(POLL_TIMEOUT, MAX_BATCH_SIZE).await?)
    }

    fn commit_batch(&self, batch: &[Record<Vec<u8>, Vec<u8>>]) -> Result<()> {
        Ok(self.commit_records(batch)?)
    }
}

/// Where a stream writes its output.
#[async_trait]
trait RecordSink: Send + Sync {
    /// Resolves once the record is acknowledged.
    async fn send_output(&self, topic: &str, output: Output) -> Result<()>;

    async fn flush_outputs(&self) -> Result<()>;
}

#[async_trait]
impl RecordSink for Producer<Vec<u8>, Vec<u8>> {
    async fn send_output(&self, topic: &str, output: Output) -> Result<()> {
        let mut sender = self.sender();
        if let Some(key) = output.key {
            sender = sender.key(key);
        }
        if let Some(value) = output.value {
            sender = sender.value(value);
        }
        if let Some(timestamp) = output.timestamp {
            sender = sender.timestamp(timestamp);
        }
        sender.send(topic).await?;
        Ok(())
    }

    async fn flush_outputs(&self) -> Result<()> {
        Ok(self.flush(FLUSH_TIMEOUT).await?)
    }
}

struct StreamLoop<K, V, S, P> {
    app_id: String,
    processor: Processor<K, V>,
    source: S,
    sink: P,
}

impl<K, V, S, P> StreamLoop<K, V, S, P>
where
    S: RecordSource,
    P: RecordSink,
{
    async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            let batch = tokio::select! {
                _ = shutdown.changed() => break,
                batch = self.source.next_batch() => batch?,
            };
            if batch.is_empty() {
                continue;
            }

            for record in &batch {
                if let Some(output) = self.processor.process(record)? {
                    self.sink
                        .send_output(&self.processor.to_topic, output)
                        .await?;
                    self.processor
                        .counters
                        .produced
                        .fetch_add(1, Ordering::Relaxed);
                }
            }
            self.source.commit_batch(&batch)?;
            tracing::debug!("Stream {} processed {} records", self.app_id, batch.len());
        }

        self.sink.flush_outputs().await?;
        tracing::info!("Stream {} stopped", self.app_id);
        Ok(())
    }
}

/// Handle of a started stream.
pub struct RunningStream {
    app_id: String,
    shutdown: watch::Sender<bool>,
    done: watch::Receiver<bool>,
    handle: JoinHandle<Result<()>>,
    counters: Arc<Counters>,
}

impl RunningStream {
    fn spawn<F, Fut>(app_id: String, counters: Arc<Counters>, run: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (done_tx, done) = watch::channel(false);
        let task = run(shutdown_rx);
        let handle = tokio::spawn(async move {
            let result = task.await;
            done_tx.send_replace(true);
            result
        });
        Self {
            app_id,
            shutdown,
            done,
            handle,
            counters,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn stats(&self) -> StreamStats {
        self.counters.snapshot()
    }

    /// Whether the loop ended on its own, which only happens on error.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Resolves once the loop has ended.
    ///
    /// Before [`RunningStream::stop`] is called that only happens on error;
    /// `stop` then returns the error.
    pub async fn finished(&self) {
        let mut done = self.done.clone();
        // A closed channel means the task is gone as well.
        let _ = done.wait_for(|done| *done).await;
    }

    /// Stop the loop and wait for it to finish.
    ///
    /// Returns the final counters, or the error that ended the loop early.
    pub async fn stop(self) -> Result<StreamStats> {
        // The receiver is gone if the loop already ended.
        let _ = self.shutdown.send(true);
        self.handle
            .await
            .map_err(|e| Error::Stream(format!("Stream {} panicked: {e}", self.app_id)))??;
        Ok(self.counters.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::OStreamBuilder;
    use crate::serdes::Serdes;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn stream() -> OStream<String, String> {
        OStreamBuilder::new(Serdes::string(), Serdes::string())
            .bootstrap_servers("localhost:9092")
            .from_topic("a")
            .to_topic("b")
            .build()
            .unwrap()
    }

    #[test]
    fn test_no_steps_passes_through() {
        let result = stream().apply(Some("k".to_string()), Some("v".to_string()));
        assert_eq!(result, Some((Some("k".to_string()), Some("v".to_string()))));
    }

    #[test]
    fn test_filter_then_map_values() {
        let stream = stream()
            .filter(|_, value| value.is_some_and(|v| v.starts_with('a')))
            .map_values(|v| v.to_uppercase());

        assert_eq!(
            stream.apply(None, Some("abc".to_string())),
            Some((None, Some("ABC".to_string())))
        );
        assert_eq!(stream.apply(None, Some("xyz".to_string())), None);
        assert_eq!(stream.apply(None, None), None);
    }

    #[test]
    fn test_map_values_keeps_tombstones() {
        let stream = stream().map_values(|v| format!("{v}!"));
        assert_eq!(
            stream.apply(Some("k".to_string()), None),
            Some((Some("k".to_string()), None))
        );
    }

    #[test]
    fn test_map_and_peek() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let stream = stream()
            .map(|key, value| (value, key))
            .peek(move |key, _| sink.lock().unwrap().push(key.cloned()));

        assert_eq!(
            stream.apply(Some("k".to_string()), Some("v".to_string())),
            Some((Some("v".to_string()), Some("k".to_string())))
        );
        assert_eq!(*seen.lock().unwrap(), vec![Some("v".to_string())]);
    }

    #[test]
    fn test_to_configs() {
        let configs = stream().config().to_configs();
        assert_eq!(configs["bootstrap.servers"], "localhost:9092");
        assert_eq!(configs["from.topic"], "a");
        assert_eq!(configs["to.topic"], "b");
        assert!(configs["application.id"].ends_with("-streamApp"));
    }

    fn record(
        partition: i32,
        offset: i64,
        timestamp: Option<i64>,
        value: &[u8],
    ) -> Record<Vec<u8>, Vec<u8>> {
        Record {
            topic: "a".to_string(),
            partition,
            offset,
            timestamp,
            key: None,
            value: Some(value.to_vec()),
            headers: Vec::new(),
        }
    }

    fn processor(stream: OStream<String, String>) -> Processor<String, String> {
        stream.into_processor(Arc::new(Counters::default())).1
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Sent(Option<Vec<u8>>),
        Committed(Vec<i64>),
        Flushed,
    }

    type Events = Arc<Mutex<Vec<Event>>>;

    struct FakeSource {
        batches: Mutex<VecDeque<Vec<Record<Vec<u8>, Vec<u8>>>>>,
        events: Events,
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        async fn next_batch(&self) -> Result<Vec<Record<Vec<u8>, Vec<u8>>>> {
            let batch = self.batches.lock().unwrap().pop_front();
            match batch {
                Some(batch) => Ok(batch),
                None => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(Vec::new())
                }
            }
        }

        fn commit_batch(&self, batch: &[Record<Vec<u8>, Vec<u8>>]) -> Result<()> {
            let offsets = batch.iter().map(|r| r.offset).collect();
            self.events.lock().unwrap().push(Event::Committed(offsets));
            Ok(())
        }
    }

    struct FakeSink {
        reject: Option<Vec<u8>>,
        events: Events,
    }

    #[async_trait]
    impl RecordSink for FakeSink {
        async fn send_output(&self, _topic: &str, output: Output) -> Result<()> {
            if output.value.is_some() && output.value == self.reject {
                return Err(Error::Stream("delivery failed".to_string()));
            }
            self.events.lock().unwrap().push(Event::Sent(output.value));
            Ok(())
        }

        async fn flush_outputs(&self) -> Result<()> {
            self.events.lock().unwrap().push(Event::Flushed);
            Ok(())
        }
    }

    fn spawn_loop(
        stream: OStream<String, String>,
        batches: Vec<Vec<Record<Vec<u8>, Vec<u8>>>>,
        reject: Option<&[u8]>,
    ) -> (RunningStream, Events) {
        let events: Events = Arc::default();
        let counters = Arc::new(Counters::default());
        let (config, processor) = stream.into_processor(Arc::clone(&counters));
        let mut runner = StreamLoop {
            app_id: config.app_id.clone(),
            processor,
            source: FakeSource {
                batches: Mutex::new(batches.into()),
                events: Arc::clone(&events),
            },
            sink: FakeSink {
                reject: reject.map(<[u8]>::to_vec),
                events: Arc::clone(&events),
            },
        };
        let running = RunningStream::spawn(config.app_id, counters, move |shutdown| async move {
            runner.run(shutdown).await
        });
        (running, events)
    }

    async fn wait_for_events(events: &Events, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while events.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_processor_counts_filtered_records() {
        let mut processor =
            processor(stream().filter(|_, value| value.is_some_and(|v| v.as_str() != "drop")));
        assert!(processor.process(&record(0, 0, None, b"drop")).unwrap().is_none());
        let output = processor.process(&record(0, 1, None, b"keep")).unwrap().unwrap();
        assert_eq!(output.value, Some(b"keep".to_vec()));
        assert_eq!(output.key, None);

        let stats = processor.counters.snapshot();
        assert_eq!(stats.consumed, 2);
        assert_eq!(stats.filtered, 1);
        assert_eq!(stats.produced, 0);
    }

    #[test]
    fn test_processor_tracks_partition_time() {
        let mut processor = processor(stream());
        let mut stamp = |record: Record<Vec<u8>, Vec<u8>>| {
            processor.process(&record).unwrap().unwrap().timestamp
        };

        assert_eq!(stamp(record(0, 0, Some(100), b"a")), Some(100));
        assert_eq!(stamp(record(0, 1, None, b"b")), Some(100));
        assert_eq!(stamp(record(1, 0, None, b"c")), None);
        assert_eq!(stamp(record(0, 2, Some(50), b"d")), Some(50));
        assert_eq!(stamp(record(0, 3, None, b"e")), Some(100));
    }

    #[test]
    fn test_processor_rejects_undecodable_value() {
        let mut processor = processor(stream());
        let result = processor.process(&record(0, 0, None, &[0xff, 0xfe]));
        assert!(matches!(result, Err(Error::Serialization(_))));
        assert_eq!(processor.counters.snapshot().consumed, 1);
    }

    #[tokio::test]
    async fn test_batch_is_committed_after_its_sends() {
        let stream = stream()
            .filter(|_, value| value.is_some_and(|v| v.as_str() != "drop"))
            .map_values(|v| v.to_uppercase());
        let batch = vec![
            record(0, 0, Some(100), b"a"),
            record(0, 1, None, b"drop"),
            record(1, 0, None, b"b"),
        ];
        let (running, events) = spawn_loop(stream, vec![batch], None);

        wait_for_events(&events, 3).await;
        let stats = running.stop().await.unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                Event::Sent(Some(b"A".to_vec())),
                Event::Sent(Some(b"B".to_vec())),
                Event::Committed(vec![0, 1, 0]),
                Event::Flushed,
            ]
        );
        assert_eq!(
            stats,
            StreamStats {
                consumed: 3,
                produced: 2,
                filtered: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_decode_error_ends_stream() {
        let batch = vec![record(0, 0, None, b"a"), record(0, 1, None, &[0xff])];
        let (running, events) = spawn_loop(stream(), vec![batch], None);

        tokio::time::timeout(Duration::from_secs(5), running.finished())
            .await
            .unwrap();
        assert_eq!(running.stats().produced, 1);
        assert_eq!(*events.lock().unwrap(), vec![Event::Sent(Some(b"a".to_vec()))]);
        assert!(matches!(running.stop().await, Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn test_delivery_error_ends_stream() {
        let batches = vec![vec![record(0, 0, None, b"boom")], vec![record(0, 1, None, b"b")]];
        let (running, events) = spawn_loop(stream(), batches, Some(&b"boom"[..]));

        tokio::time::timeout(Duration::from_secs(5), running.finished())
            .await
            .unwrap();
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(running.stats().produced, 0);
        assert!(matches!(running.stop().await, Err(Error::Stream(_))));
    }

    #[tokio::test]
    async fn test_idle_stream_stops_cleanly() {
        let (running, events) = spawn_loop(stream(), Vec::new(), None);
        assert!(!running.is_finished());

        let stats = running.stop().await.unwrap();
        assert_eq!(stats, StreamStats::default());
        assert_eq!(*events.lock().unwrap(), vec![Event::Flushed]);
    }
}
