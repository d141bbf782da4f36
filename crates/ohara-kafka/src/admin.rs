//! Topic and consumer-group administration.

use crate::error::{Error, Result};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;

const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin wrapper over the broker admin API.
pub struct TopicAdmin {
    client: Arc<AdminClient<DefaultClientContext>>,
    brokers: String,
}

impl TopicAdmin {
    pub fn new(brokers: &str) -> Result<Self> {
        if brokers.trim().is_empty() {
            return Err(Error::InvalidConfig("brokers must not be empty".to_string()));
        }
        let client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .create()
            .map_err(|e| Error::Admin(format!("Failed to create admin client: {e}")))?;
        Ok(Self {
            client: Arc::new(client),
            brokers: brokers.to_string(),
        })
    }

    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Create a topic. A topic that already exists is left untouched.
    pub async fn create_topic(&self, topic: &str, partitions: i32, replication: i32) -> Result<()> {
        let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(replication));
        let results = self
            .client
            .create_topics(&[new_topic], &Self::options())
            .await?;

        for result in results {
            match result {
                Ok(name) => tracing::info!("Topic '{name}' created successfully"),
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    tracing::info!("Topic '{name}' already exists")
                }
                Err((name, code)) => {
                    return Err(Error::Admin(format!(
                        "Failed to create topic '{name}': {code}"
                    )))
                }
            }
        }
        Ok(())
    }

    pub async fn delete_topic(&self, topic: &str) -> Result<()> {
        let results = self
            .client
            .delete_topics(&[topic], &Self::options())
            .await?;
        for result in results {
            if let Err((name, code)) = result {
                return Err(Error::Admin(format!(
                    "Failed to delete topic '{name}': {code}"
                )));
            }
        }
        tracing::info!("Topic '{topic}' deleted");
        Ok(())
    }

    /// Delete a consumer group and its committed offsets. A missing group is not an error.
    pub async fn delete_group(&self, group: &str) -> Result<()> {
        let results = self
            .client
            .delete_groups(&[group], &Self::options())
            .await?;
        for result in results {
            match result {
                Ok(name) => tracing::info!("Consumer group '{name}' deleted"),
                Err((name, RDKafkaErrorCode::GroupIdNotFound)) => {
                    tracing::debug!("Consumer group '{name}' does not exist")
                }
                Err((name, code)) => {
                    return Err(Error::Admin(format!(
                        "Failed to delete consumer group '{name}': {code}"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Topic names in order, internal topics excluded.
    pub async fn list_topics(&self) -> Result<Vec<String>> {
        // Metadata requests block the calling thread.
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            let metadata = client.inner().fetch_metadata(None, METADATA_TIMEOUT)?;
            let mut topics: Vec<String> = metadata
                .topics()
                .iter()
                .map(|t| t.name().to_string())
                .filter(|name| !name.starts_with("__"))
                .collect();
            topics.sort();
            Ok::<_, Error>(topics)
        })
        .await
        .map_err(|e| Error::Admin(format!("Metadata task failed: {e}")))?
    }

    pub async fn exist(&self, topic: &str) -> Result<bool> {
        Ok(self.list_topics().await?.iter().any(|t| t == topic))
    }

    fn options() -> AdminOptions {
        AdminOptions::new().operation_timeout(Some(OPERATION_TIMEOUT))
    }
}
