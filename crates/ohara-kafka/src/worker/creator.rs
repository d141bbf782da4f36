use crate::connector::task_config::{NAME_KEY, TOPICS_KEY};
use crate::error::{Error, Result};
use crate::worker::client::WorkerClient;
use crate::worker::model::ConnectorInfo;
use ohara_common::{util, Column, COLUMN_KEY};
use std::collections::BTreeMap;

/// Converter that passes record bytes through untouched.
pub const BYTE_ARRAY_CONVERTER: &str = "org.apache.kafka.connect.converters.ByteArrayConverter";

const CONNECTOR_CLASS_KEY: &str = "connector.class";
const TASKS_MAX_KEY: &str = "tasks.max";
const KEY_CONVERTER_KEY: &str = "key.converter";
const VALUE_CONVERTER_KEY: &str = "value.converter";

/// Fluent definition of a connector to submit to the workers.
///
/// `connector_class` and at least one topic are required; the name defaults
/// to a random identifier and the task count to one. Free-form configs are
/// applied first, so the dedicated setters always win.
pub struct ConnectorCreator<'a> {
    client: &'a WorkerClient,
    name: Option<String>,
    connector_class: Option<String>,
    topics: Vec<String>,
    number_of_tasks: u32,
    disable_converter: bool,
    columns: Option<Vec<Column>>,
    configs: BTreeMap<String, String>,
}

impl<'a> ConnectorCreator<'a> {
    pub(crate) fn new(client: &'a WorkerClient) -> Self {
        Self {
            client,
            name: None,
            connector_class: None,
            topics: Vec::new(),
            number_of_tasks: 1,
            disable_converter: false,
            columns: None,
            configs: BTreeMap::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn connector_class(mut self, class: impl Into<String>) -> Self {
        self.connector_class = Some(class.into());
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topics = vec![topic.into()];
        self
    }

    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn number_of_tasks(mut self, number_of_tasks: u32) -> Self {
        self.number_of_tasks = number_of_tasks;
        self
    }

    /// Use the byte-array converter for keys and values.
    pub fn disable_converter(mut self) -> Self {
        self.disable_converter = true;
        self
    }

    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configs.insert(key.into(), value.into());
        self
    }

    pub fn configs(mut self, configs: BTreeMap<String, String>) -> Self {
        self.configs.extend(configs);
        self
    }

    /// Validate and assemble the connector name and config map.
    pub fn build_config(&self) -> Result<(String, BTreeMap<String, String>)> {
        let connector_class = self
            .connector_class
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("connector class is required".to_string()))?;
        if self.topics.is_empty() || self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "at least one non-empty topic is required".to_string(),
            ));
        }
        if self.number_of_tasks == 0 {
            return Err(Error::InvalidConfig(
                "number of tasks must be greater than zero".to_string(),
            ));
        }
        let name = self.name.clone().unwrap_or_else(util::uuid);

        let mut config = self.configs.clone();
        config.insert(NAME_KEY.to_string(), name.clone());
        config.insert(CONNECTOR_CLASS_KEY.to_string(), connector_class.to_string());
        config.insert(TASKS_MAX_KEY.to_string(), self.number_of_tasks.to_string());
        config.insert(TOPICS_KEY.to_string(), self.topics.join(","));
        if let Some(columns) = &self.columns {
            config.insert(COLUMN_KEY.to_string(), Column::from_columns(columns));
        }
        if self.disable_converter {
            config.insert(KEY_CONVERTER_KEY.to_string(), BYTE_ARRAY_CONVERTER.to_string());
            config.insert(VALUE_CONVERTER_KEY.to_string(), BYTE_ARRAY_CONVERTER.to_string());
        }
        Ok((name, config))
    }

    /// Submit the connector.
    pub async fn create(self) -> Result<ConnectorInfo> {
        let (name, config) = self.build_config()?;
        self.client.create(&name, &config).await
    }
}
