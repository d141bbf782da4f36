use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid column definition: {0}")]
    InvalidColumns(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Condition not met within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
