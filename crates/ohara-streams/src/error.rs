use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Kafka error: {0}")]
    Kafka(#[from] ohara_kafka::Error),

    #[error("Stream error: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, Error>;
