//! The contract ohara row connectors implement.
//!
//! A connector receives its [`TaskConfig`] on start, splits the work into
//! per-task configs, and hands them to tasks it creates. Scheduling,
//! rebalancing and offset storage belong to the Connect worker; this module
//! only fixes the shape of the plugins.

pub mod record;
pub mod task_config;

use crate::error::Result;
use async_trait::async_trait;

pub use record::{RowSinkRecord, RowSourceRecord, RowSourceRecordBuilder};
pub use task_config::{TaskConfig, TaskConfigBuilder};

/// Task side of a row source: produces rows to be written to topics.
#[async_trait]
pub trait RowSourceTask: Send {
    async fn start(&mut self, config: TaskConfig) -> Result<()>;

    /// Rows produced since the last call. An empty batch means "nothing yet".
    async fn poll(&mut self) -> Result<Vec<RowSourceRecord>>;

    async fn stop(&mut self) -> Result<()>;
}

/// Task side of a row sink: consumes rows read from topics.
#[async_trait]
pub trait RowSinkTask: Send {
    async fn start(&mut self, config: TaskConfig) -> Result<()>;

    async fn put(&mut self, records: Vec<RowSinkRecord>) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;
}

pub trait RowSourceConnector: Send {
    type Task: RowSourceTask + Default;

    fn start(&mut self, config: TaskConfig) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Split the work into at most `max_tasks` task configs.
    fn task_configs(&self, max_tasks: usize) -> Result<Vec<TaskConfig>>;

    fn create_task(&self) -> Self::Task {
        Self::Task::default()
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }
}

pub trait RowSinkConnector: Send {
    type Task: RowSinkTask + Default;

    fn start(&mut self, config: TaskConfig) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Split the work into at most `max_tasks` task configs.
    fn task_configs(&self, max_tasks: usize) -> Result<Vec<TaskConfig>>;

    fn create_task(&self) -> Self::Task {
        Self::Task::default()
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }
}
