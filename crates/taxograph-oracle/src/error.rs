//! Error types for the SPARQL oracle client

use thiserror::Error;

pub type OracleResult<T> = std::result::Result<T, OracleError>;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
