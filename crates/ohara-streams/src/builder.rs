use crate::error::{Error, Result};
use crate::extractor::{RecordTimestampExtractor, TimestampExtractor};
use crate::ostream::{OStream, StreamConfig};
use crate::serdes::{Consumed, Produced, Serde};
use ohara_common::util;
use std::sync::Arc;

/// Suffix of generated application ids.
pub const APP_ID_SUFFIX: &str = "-streamApp";

/// Fluent configuration of a topic-to-topic stream.
///
/// Bootstrap servers, the source topic and the destination topic are required.
/// The serdes given to [`OStreamBuilder::new`] are used for any topic set without
/// explicit serdes.
pub struct OStreamBuilder<K, V> {
    key_serde: Box<dyn Serde<K>>,
    value_serde: Box<dyn Serde<V>>,
    bootstrap_servers: Option<String>,
    app_id: Option<String>,
    from_topic: Option<(String, Consumed<K, V>)>,
    to_topic: Option<(String, Produced<K, V>)>,
    extractor: Option<Arc<dyn TimestampExtractor>>,
    clean_start: bool,
}

impl<K, V> OStreamBuilder<K, V> {
    pub fn new(key_serde: impl Serde<K> + 'static, value_serde: impl Serde<V> + 'static) -> Self {
        Self {
            key_serde: Box::new(key_serde),
            value_serde: Box::new(value_serde),
            bootstrap_servers: None,
            app_id: None,
            from_topic: None,
            to_topic: None,
            extractor: None,
            clean_start: false,
        }
    }

    pub fn bootstrap_servers(mut self, servers: impl Into<String>) -> Self {
        self.bootstrap_servers = Some(servers.into());
        self
    }

    /// Application id, also used as the consumer group of the stream.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn from_topic(mut self, topic: impl Into<String>) -> Self {
        let consumed = Consumed::from_boxed(self.key_serde.clone(), self.value_serde.clone());
        self.from_topic = Some((topic.into(), consumed));
        self
    }

    /// Read `topic` with other serdes.
    ///
    /// The given serdes become the defaults of the returned builder. A
    /// destination topic set earlier keeps its name and switches to the new
    /// serdes.
    pub fn from_topic_with<S, U>(
        self,
        topic: impl Into<String>,
        key_serde: impl Serde<S> + 'static,
        value_serde: impl Serde<U> + 'static,
    ) -> OStreamBuilder<S, U> {
        let key_serde: Box<dyn Serde<S>> = Box::new(key_serde);
        let value_serde: Box<dyn Serde<U>> = Box::new(value_serde);
        let consumed = Consumed::from_boxed(key_serde.clone(), value_serde.clone());
        let to_topic = self.to_topic.map(|(name, _)| {
            (
                name,
                Produced::from_boxed(key_serde.clone(), value_serde.clone()),
            )
        });

        OStreamBuilder {
            key_serde,
            value_serde,
            bootstrap_servers: self.bootstrap_servers,
            app_id: self.app_id,
            from_topic: Some((topic.into(), consumed)),
            to_topic,
            extractor: self.extractor,
            clean_start: self.clean_start,
        }
    }

    pub fn to_topic(mut self, topic: impl Into<String>) -> Self {
        let produced = Produced::from_boxed(self.key_serde.clone(), self.value_serde.clone());
        self.to_topic = Some((topic.into(), produced));
        self
    }

    pub fn to_topic_with(
        mut self,
        topic: impl Into<String>,
        key_serde: impl Serde<K> + 'static,
        value_serde: impl Serde<V> + 'static,
    ) -> Self {
        self.to_topic = Some((topic.into(), Produced::with(key_serde, value_serde)));
        self
    }

    /// Forget the committed progress of the application before starting.
    pub fn clean_start(mut self) -> Self {
        self.clean_start = true;
        self
    }

    pub fn timestamp_extractor(mut self, extractor: impl TimestampExtractor + 'static) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    pub fn build(self) -> Result<OStream<K, V>> {
        let bootstrap_servers = self
            .bootstrap_servers
            .ok_or(Error::MissingField("bootstrap_servers"))?;
        let (from_topic, consumed) = self.from_topic.ok_or(Error::MissingField("from_topic"))?;
        let (to_topic, produced) = self.to_topic.ok_or(Error::MissingField("to_topic"))?;
        let app_id = self
            .app_id
            .unwrap_or_else(|| format!("{}{APP_ID_SUFFIX}", util::uuid()));
        let extractor = self
            .extractor
            .unwrap_or_else(|| Arc::new(RecordTimestampExtractor));

        tracing::debug!("Built stream {app_id}: {from_topic} -> {to_topic} on {bootstrap_servers}");

        Ok(OStream::new(
            StreamConfig {
                bootstrap_servers,
                app_id,
                from_topic,
                to_topic,
                clean_start: self.clean_start,
            },
            consumed,
            produced,
            extractor,
        ))
    }
}
