//! Fetch capabilities backing the resolver
//!
//! The resolver never talks to AWS directly. It is handed a [`StoreClients`]
//! bundle built once per resolution run by a [`StoreConnector`], which keeps
//! credential bootstrap out of this crate and lets tests substitute fakes.

use crate::{FetchError, SecretError};
use async_trait::async_trait;

/// Fetches secret strings by name.
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    /// Fetch the string payload of a secret.
    ///
    /// `Ok(None)` means the secret exists but has no string payload.
    async fn fetch_secret(&self, name: &str) -> Result<Option<String>, FetchError>;
}

/// Fetches parameter values by path, always requesting decryption.
#[async_trait]
pub trait ParameterFetcher: Send + Sync {
    /// Fetch the decrypted value of a parameter.
    ///
    /// `Ok(None)` means the response carried no value.
    async fn fetch_parameter(&self, path: &str) -> Result<Option<String>, FetchError>;
}

/// Both fetch capabilities, constructed together.
pub struct StoreClients {
    /// Secret-by-name capability
    pub secrets: Box<dyn SecretFetcher>,
    /// Parameter-by-path capability
    pub parameters: Box<dyn ParameterFetcher>,
}

impl StoreClients {
    /// Bundle two capabilities.
    pub fn new(
        secrets: impl SecretFetcher + 'static,
        parameters: impl ParameterFetcher + 'static,
    ) -> Self {
        Self {
            secrets: Box::new(secrets),
            parameters: Box::new(parameters),
        }
    }
}

impl std::fmt::Debug for StoreClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClients").finish_non_exhaustive()
    }
}

/// Builds [`StoreClients`] on demand.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Construct both clients.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::ClientInit`] when configuration cannot be loaded.
    async fn connect(&self) -> Result<StoreClients, SecretError>;
}
