use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Malformed value: {0}")]
    MalformedValue(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Sink error: {0}")]
    SinkError(String),
}
