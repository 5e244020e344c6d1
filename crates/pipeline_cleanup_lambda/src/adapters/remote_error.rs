use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// A failed call to one of the collaborating AWS services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct RemoteCallError {
    pub operation: &'static str,
    pub message: String,
}

impl RemoteCallError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Prefers the message the service put in its error response and falls
    /// back to the full SDK error chain for transport or dispatch failures.
    pub fn from_sdk<E, R>(operation: &'static str, error: &SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let service_message = error
            .as_service_error()
            .and_then(|service_error| service_error.message())
            .map(str::to_string);

        let message = service_message.unwrap_or_else(|| DisplayErrorContext(error).to_string());
        Self::new(operation, message)
    }
}
