use crate::error::{Error, Result};
use ohara_common::{Column, COLUMN_KEY};
use std::collections::BTreeMap;

pub(crate) const NAME_KEY: &str = "name";
pub(crate) const TOPICS_KEY: &str = "topics";

/// Settings handed to a connector and its tasks.
///
/// A task config travels through the worker as a flat string map (see
/// [`TaskConfig::to_props`]); name and topics use reserved keys and every
/// other entry is an option. The schema is always kept in its encoded form
/// under the [`COLUMN_KEY`] option as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    name: String,
    topics: Vec<String>,
    schema: Vec<Column>,
    options: BTreeMap<String, String>,
}

impl TaskConfig {
    pub fn builder() -> TaskConfigBuilder {
        TaskConfigBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn schema(&self) -> &[Column] {
        &self.schema
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Like [`TaskConfig::option`] but a missing key is an error.
    pub fn require_option(&self, key: &str) -> Result<&str> {
        self.option(key)
            .ok_or_else(|| Error::Connector(format!("missing required option '{key}'")))
    }

    pub fn to_props(&self) -> BTreeMap<String, String> {
        let mut props = self.options.clone();
        props.insert(NAME_KEY.to_string(), self.name.clone());
        props.insert(TOPICS_KEY.to_string(), self.topics.join(","));
        props
    }

    pub fn from_props(props: &BTreeMap<String, String>) -> Result<Self> {
        let mut options = props.clone();
        let name = options.remove(NAME_KEY).unwrap_or_default();
        let topics = options
            .remove(TOPICS_KEY)
            .map(|t| split_topics(&t))
            .unwrap_or_default();
        TaskConfigBuilder {
            name: Some(name),
            topics,
            schema: Vec::new(),
            options,
        }
        .build()
    }
}

fn split_topics(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct TaskConfigBuilder {
    name: Option<String>,
    topics: Vec<String>,
    schema: Vec<Column>,
    options: BTreeMap<String, String>,
}

impl TaskConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
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

    pub fn schema(mut self, schema: Vec<Column>) -> Self {
        self.schema = schema;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn build(self) -> Result<TaskConfig> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("task config name is required".to_string()))?;
        if self.topics.is_empty() {
            return Err(Error::InvalidConfig(
                "task config requires at least one topic".to_string(),
            ));
        }
        let mut options = self.options;
        let schema = match options.get(COLUMN_KEY) {
            Some(encoded) => {
                let declared = Column::to_columns(encoded)?;
                if !self.schema.is_empty() && declared != self.schema {
                    return Err(Error::InvalidConfig(format!(
                        "option '{COLUMN_KEY}' does not match the task schema"
                    )));
                }
                declared
            }
            None => self.schema,
        };
        options.insert(COLUMN_KEY.to_string(), Column::from_columns(&schema));
        Ok(TaskConfig {
            name,
            topics: self.topics,
            schema,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohara_common::DataType;

    fn sample() -> TaskConfig {
        TaskConfig::builder()
            .name("test")
            .topics(["a", "b"])
            .schema(vec![Column::of("cf0", DataType::Boolean, 0)])
            .option("output", "out")
            .build()
            .unwrap()
    }

    #[test]
    fn test_props_round_trip() {
        let config = sample();
        let props = config.to_props();
        assert_eq!(props["topics"], "a,b");
        assert_eq!(TaskConfig::from_props(&props).unwrap(), config);
    }

    #[test]
    fn test_column_option_survives_props() {
        let config = TaskConfig::builder()
            .name("test")
            .topic("t")
            .option(COLUMN_KEY, "[]")
            .option("x", "y")
            .build()
            .unwrap();
        assert_eq!(config.option(COLUMN_KEY), Some("[]"));
        assert_eq!(TaskConfig::from_props(&config.to_props()).unwrap(), config);
    }

    #[test]
    fn test_column_option_sets_schema() {
        let columns = vec![Column::of("cf0", DataType::Boolean, 0)];
        let config = TaskConfig::builder()
            .name("test")
            .topic("t")
            .option(COLUMN_KEY, Column::from_columns(&columns))
            .build()
            .unwrap();
        assert_eq!(config.schema(), columns.as_slice());

        let same = TaskConfig::builder()
            .name("test")
            .topic("t")
            .schema(columns.clone())
            .build()
            .unwrap();
        assert_eq!(same, config);
    }

    #[test]
    fn test_conflicting_column_option_is_rejected() {
        let result = TaskConfig::builder()
            .name("test")
            .topic("t")
            .schema(vec![Column::of("cf0", DataType::Boolean, 0)])
            .option(COLUMN_KEY, "[]")
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_build_validation() {
        assert!(TaskConfig::builder().topic("t").build().is_err());
        assert!(TaskConfig::builder().name("n").build().is_err());
        assert!(TaskConfig::from_props(&BTreeMap::new()).is_err());
    }

    #[test]
    fn test_require_option() {
        let config = sample();
        assert_eq!(config.require_option("output").unwrap(), "out");
        let err = config.require_option("broker").unwrap_err();
        assert!(err.to_string().contains("broker"));
    }
}
