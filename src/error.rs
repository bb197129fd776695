use axum::http::StatusCode;
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use thiserror::Error;

/// Failure of a single outbound call to the picture provider.
///
/// The `Display` strings are the user-facing messages; the underlying
/// transport detail is logged at the call site before the variant is built.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("The request to NASA timed out.")]
    Timeout,

    #[error("Failed to connect to NASA API.")]
    ConnectionFailed,

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("Failed to fetch APOD data.")]
    Other(String),
}

/// Failure of a document store operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document store error: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure inside the notification publisher. Logged and swallowed by the
/// adapter; never reaches a request handler.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Kafka client is not available")]
    Unavailable,

    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("failed to create topic '{topic}': {code}")]
    TopicCreation { topic: String, code: RDKafkaErrorCode },
}

/// Top-level error for the request handling core. Every use case returns
/// this, and a single mapping turns the tag into an HTTP status code.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad or missing input from the caller.
    #[error("{0}")]
    Validation(String),

    /// The picture provider was unreachable or answered with an error.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// A store operation failed; carries the user-facing message only,
    /// the driver error is logged where it happened.
    #[error("{0}")]
    Store(String),

    /// Startup-time misconfiguration. Never produced while serving.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Fetch(_) | AppError::Store(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
