use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Insufficient corpus: requested {requested} neighbors, but only {available} contracts are indexed")]
    InsufficientCorpus { requested: usize, available: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Name of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Corpus(_) => "corpus",
            Error::Encoding(_) | Error::InvalidDimension { .. } => "encoding",
            Error::Artifact(_) => "artifact",
            Error::InsufficientCorpus { .. } => "index",
            Error::InvalidArgument(_) => "request",
            Error::Io(_) => "io",
        }
    }
}
