use crate::schema::ValidationError;

/// Failure before an HTTP response was received.
#[derive(Debug, thiserror::Error)]
#[error("Transport error: {message}")]
pub struct TransportError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The builder could not produce a descriptor (bad URL, header, or body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The call succeeded but the body did not match the output schema
    #[error("Response validation failed at {}", .0.path)]
    Validation(#[from] ValidationError),
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }
}
