use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetalsError {
    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("malformed price payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("price payload is missing {0}")]
    MissingField(&'static str),
}
