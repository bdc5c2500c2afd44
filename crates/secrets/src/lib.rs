//! Secret reference resolution for aws-init
//!
//! Environment values carrying the `aws-secret:` prefix are references to
//! AWS Secrets Manager entries or SSM parameters. This crate parses those
//! references, fetches their values through the [`SecretFetcher`] and
//! [`ParameterFetcher`] capabilities, and rewrites a whole environment in one
//! atomic pass.
//!
//! # Reference formats
//!
//! ```text
//! aws-secret:secret-name                              whole secret string
//! aws-secret:secret-name#key                          one key of a JSON secret
//! aws-secret:/aws/reference/secretsmanager/name       SSM parameter (decrypted)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use aws_init_secrets::{ResolveContext, resolve_environment};
//!
//! let env: Vec<String> = std::env::vars().map(|(k, v)| format!("{k}={v}")).collect();
//! let resolved = resolve_environment(env, &connector, &ResolveContext::background()).await?;
//! ```

mod context;
mod environment;
mod reference;
mod resolver;
mod store;
#[cfg(test)]
mod testing;

pub use context::{ContextError, ResolveContext};
pub use environment::{contains_references, resolve_environment};
pub use reference::{PARAMETER_PATH_PREFIX, REFERENCE_PREFIX, SecretReference};
pub use resolver::{MAX_ATTEMPTS, RETRY_DELAY, resolve_reference};
pub use store::{ParameterFetcher, SecretFetcher, StoreClients, StoreConnector};

use thiserror::Error;

/// Error types for secret resolution
#[derive(Debug, Error)]
pub enum SecretError {
    /// Nothing follows the reference prefix
    #[error("empty secret reference")]
    EmptyReference,

    /// The secret name in front of `#` is empty
    #[error("empty secret name")]
    EmptyName,

    /// A key was requested but the secret is not a flat JSON string map
    #[error("secret {secret} is not valid JSON: {source}")]
    NotJson {
        /// Secret name
        secret: String,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// The requested key is absent from the secret
    #[error("key {key} not found in secret {secret}")]
    KeyNotFound {
        /// Requested JSON key
        key: String,
        /// Secret name
        secret: String,
    },

    /// The store kept failing until the attempt budget ran out
    #[error("fetching {target} failed after {attempts} attempts: {source}")]
    Store {
        /// Secret name or parameter path
        target: String,
        /// Number of attempts made
        attempts: u32,
        /// Last underlying failure
        #[source]
        source: FetchError,
    },

    /// The surrounding context was cancelled
    #[error("secret resolution cancelled")]
    Cancelled,

    /// The surrounding context ran past its deadline
    #[error("secret resolution deadline exceeded")]
    DeadlineExceeded,

    /// Store clients could not be initialized
    #[error("failed to initialize secret store clients: {message}")]
    ClientInit {
        /// Error message from the client bootstrap
        message: String,
    },

    /// Resolving one environment variable failed
    ///
    /// Carries only the variable name; the raw value may hold sensitive text.
    #[error("failed to resolve {key}: {source}")]
    Variable {
        /// Environment variable name
        key: String,
        /// Underlying resolution error
        #[source]
        source: Box<SecretError>,
    },
}

/// Coarse classification of a [`SecretError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed reference; never retried
    ReferenceFormat,
    /// Secret payload is not a string map
    NotJson,
    /// Requested key missing from the payload
    KeyNotFound,
    /// Fetch failed after exhausting retries
    Store,
    /// Cancelled or past deadline
    Cancellation,
    /// Clients could not be constructed
    ClientInit,
}

impl SecretError {
    /// Classify this error, looking through [`SecretError::Variable`] wrappers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyReference | Self::EmptyName => ErrorKind::ReferenceFormat,
            Self::NotJson { .. } => ErrorKind::NotJson,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::Store { .. } => ErrorKind::Store,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancellation,
            Self::ClientInit { .. } => ErrorKind::ClientInit,
            Self::Variable { source, .. } => source.kind(),
        }
    }
}

impl From<ContextError> for SecretError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => Self::Cancelled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Failure reported by a single fetch call
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backing service returned an error
    #[error("{message}")]
    Service {
        /// Rendered service error
        message: String,
    },

    /// The call succeeded but carried no usable value
    #[error("{target} has no value")]
    MissingValue {
        /// Secret name or parameter path
        target: String,
    },
}

impl FetchError {
    /// Build a service error from anything displayable
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }
}
