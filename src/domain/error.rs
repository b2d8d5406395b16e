use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Transient failure: {provider} - {message}")]
    Transient { provider: String, message: String },

    #[error("Unparseable output from {source_name}: {message}")]
    Unparseable {
        source_name: String,
        message: String,
    },

    #[error("Missing precondition: {message}")]
    MissingPrecondition { message: String },

    #[error("Verification mismatch: expected {expected}, found {found}")]
    VerificationMismatch { expected: String, found: String },

    #[error("Credential error: {message}")]
    Credential { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
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

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn unparseable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unparseable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn missing_precondition(message: impl Into<String>) -> Self {
        Self::MissingPrecondition {
            message: message.into(),
        }
    }

    pub fn verification_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::VerificationMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
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

    /// Whether a retry of the same outbound call could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Attribute a collaborator failure to the named operation
    pub fn with_provider(self, name: &str) -> Self {
        match self {
            Self::Provider { message, .. } => Self::provider(name, message),
            Self::Transient { message, .. } => Self::transient(name, message),
            Self::Unparseable { message, .. } => Self::unparseable(name, message),
            other => other,
        }
    }
}
