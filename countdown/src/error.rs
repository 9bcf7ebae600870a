use thiserror::Error;

#[derive(Error, Debug)]
pub enum CountdownError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint url {0:?}")]
    InvalidUrl(String),
}
