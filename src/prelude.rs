pub use vault_ingest_core::*;

use miette::Diagnostic;
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("shared-memory error: {0}")]
    ShmError(String),

    #[error("sink error: {0}")]
    SinkError(String),

    #[error("subscriber error: {0}")]
    SubscriberError(String),

    #[error("core error: {0}")]
    CoreError(#[from] CoreError),

    #[error("{0}")]
    Message(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn config(text: impl Display) -> Error {
        Error::ConfigError(text.to_string())
    }

    pub fn shm(error: impl Display) -> Error {
        Error::ShmError(error.to_string())
    }

    pub fn sink(error: impl Display) -> Error {
        Error::SinkError(error.to_string())
    }

    pub fn subscriber(error: impl Display) -> Error {
        Error::SubscriberError(error.to_string())
    }

    pub fn message(text: impl Into<String>) -> Error {
        Error::Message(text.into())
    }

    pub fn custom(error: impl Display) -> Error {
        Error::Custom(error.to_string())
    }
}

impl From<Box<dyn std::error::Error>> for Error {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        Error::custom(err)
    }
}
