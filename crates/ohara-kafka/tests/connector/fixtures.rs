//! Connectors used only by tests.

use async_trait::async_trait;
use ohara_common::{Column, DataType, Row, COLUMN_KEY};
use ohara_kafka::connector::{
    RowSinkConnector, RowSinkRecord, RowSinkTask, RowSourceConnector, RowSourceRecord,
    RowSourceTask, TaskConfig,
};
use ohara_kafka::{BytesSerializer, Error, Producer, Result, RowSerializer};
use std::time::Duration;

/// Option naming the brokers a sink task writes to.
pub const BROKER: &str = "broker";
/// Option naming the topic a sink task writes to.
pub const OUTPUT: &str = "output";

pub fn dumb_columns() -> Vec<Column> {
    vec![
        Column::of("cf0", DataType::Boolean, 0),
        Column::of("cf1", DataType::Boolean, 1),
    ]
}

/// Source with a fixed schema whose task never emits rows.
pub struct DumbSource {
    columns: Vec<Column>,
}

impl Default for DumbSource {
    fn default() -> Self {
        Self {
            columns: dumb_columns(),
        }
    }
}

impl RowSourceConnector for DumbSource {
    type Task = DumbSourceTask;

    fn start(&mut self, _config: TaskConfig) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn task_configs(&self, _max_tasks: usize) -> Result<Vec<TaskConfig>> {
        let config = TaskConfig::builder()
            .name("test")
            .topic("topic")
            .schema(self.columns.clone())
            .option(COLUMN_KEY, Column::from_columns(&self.columns))
            .build()?;
        Ok(vec![config])
    }
}

#[derive(Default)]
pub struct DumbSourceTask;

#[async_trait]
impl RowSourceTask for DumbSourceTask {
    async fn start(&mut self, _config: TaskConfig) -> Result<()> {
        Ok(())
    }

    async fn poll(&mut self) -> Result<Vec<RowSourceRecord>> {
        Ok(Vec::new())
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink that copies incoming rows to the `OUTPUT` topic on the `BROKER` cluster.
#[derive(Default)]
pub struct SimpleRowSinkConnector {
    config: Option<TaskConfig>,
}

impl RowSinkConnector for SimpleRowSinkConnector {
    type Task = SimpleRowSinkTask;

    fn start(&mut self, config: TaskConfig) -> Result<()> {
        config.require_option(OUTPUT)?;
        config.require_option(BROKER)?;
        self.config = Some(config);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn task_configs(&self, max_tasks: usize) -> Result<Vec<TaskConfig>> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| Error::Connector("connector has not been started".to_string()))?;
        Ok(vec![config.clone(); max_tasks])
    }
}

#[derive(Default)]
pub struct SimpleRowSinkTask {
    producer: Option<Producer<Vec<u8>, Row>>,
    output: Option<String>,
}

#[async_trait]
impl RowSinkTask for SimpleRowSinkTask {
    async fn start(&mut self, config: TaskConfig) -> Result<()> {
        let broker = config.require_option(BROKER)?;
        let output = config.require_option(OUTPUT)?;
        self.producer = Some(
            Producer::builder()
                .connection_props(broker)
                .build(BytesSerializer, RowSerializer)?,
        );
        self.output = Some(output.to_string());
        Ok(())
    }

    async fn put(&mut self, records: Vec<RowSinkRecord>) -> Result<()> {
        let (Some(producer), Some(output)) = (&self.producer, &self.output) else {
            return Err(Error::Connector("task has not been started".to_string()));
        };
        for record in records {
            producer.sender().value(record.row).send(output).await?;
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(producer) = self.producer.take() {
            producer.flush(Duration::from_secs(10)).await?;
        }
        Ok(())
    }
}
