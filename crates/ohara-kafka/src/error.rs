use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Worker returned {status}: {message}")]
    Worker { status: u16, message: String },

    #[error("No worker available among [{0}]")]
    NoWorkerAvailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("Producer error: {0}")]
    Producer(String),

    #[error("Connector error: {0}")]
    Connector(String),

    #[error("Admin error: {0}")]
    Admin(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] ohara_common::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
