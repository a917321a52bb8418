use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid credentials: {message}")]
    CredentialsInvalid { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Remote engine rejected the payload: {message}")]
    RemoteRejected { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Remediation found no failing execution. Benign for callers of the
    /// remediation engine; every other component treats it as unexpected.
    #[error("No errors found")]
    NoErrorsFound,

    #[error("Unrecognized failure: {message}")]
    UnrecognizedFailure { message: String },

    /// A local store write failed after the remote side already confirmed a
    /// mutation. Remote state is correct; recovery is a pull, not a retry.
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn credentials_invalid(message: impl Into<String>) -> Self {
        Self::CredentialsInvalid {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn remote_rejected(message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unrecognized_failure(message: impl Into<String>) -> Self {
        Self::UnrecognizedFailure {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for failures that are safe to retry at the protocol level.
    /// Note that deploy must never be retried even on these - retrying a
    /// create produces duplicate remote workflows.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
