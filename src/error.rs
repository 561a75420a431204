//! Error taxonomy for the premium time series
//!
//! Every variant is recoverable at the position boundary. Platform-level
//! failures are panics and are never converted into an [`Error`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A period or basis lacks a fact the current stage requires
    #[error("{subject} is missing required fact `{fact}`")]
    MissingFact {
        fact: &'static str,
        subject: String,
    },

    /// A structural precondition was violated
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Semantically impossible overlap between source records
    #[error("data inconsistency: {0}")]
    DataInconsistency(String),

    /// A computed value violates a domain constraint
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed textual amount
    #[error("invalid amount format: {0:?}")]
    InvalidFormat(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn missing_fact(fact: &'static str, subject: impl std::fmt::Display) -> Self {
        Error::MissingFact {
            fact,
            subject: subject.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
