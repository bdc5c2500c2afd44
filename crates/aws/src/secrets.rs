//! Secrets Manager and Parameter Store fetchers backed by the AWS SDK

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig, retry::RetryConfig};
use aws_init_secrets::{
    FetchError, MAX_ATTEMPTS, ParameterFetcher, SecretError, SecretFetcher, StoreClients,
    StoreConnector,
};
use tracing::debug;

/// Fetches secret strings with `GetSecretValue`.
#[derive(Clone)]
pub struct SecretsManagerFetcher {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerFetcher {
    /// Build a fetcher from a loaded SDK config.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(config),
        }
    }
}

impl std::fmt::Debug for SecretsManagerFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManagerFetcher").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretFetcher for SecretsManagerFetcher {
    async fn fetch_secret(&self, name: &str) -> Result<Option<String>, FetchError> {
        let response = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                FetchError::service(format!(
                    "AWS Secrets Manager error: {}",
                    aws_sdk_secretsmanager::error::DisplayErrorContext(&e)
                ))
            })?;

        // Binary-only secrets carry no string payload
        Ok(response.secret_string().map(str::to_string))
    }
}

/// Fetches decrypted parameters with `GetParameter`.
#[derive(Clone)]
pub struct ParameterStoreFetcher {
    client: aws_sdk_ssm::Client,
}

impl ParameterStoreFetcher {
    /// Build a fetcher from a loaded SDK config.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

impl std::fmt::Debug for ParameterStoreFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStoreFetcher").finish_non_exhaustive()
    }
}

#[async_trait]
impl ParameterFetcher for ParameterStoreFetcher {
    async fn fetch_parameter(&self, path: &str) -> Result<Option<String>, FetchError> {
        let response = self
            .client
            .get_parameter()
            .name(path)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| {
                FetchError::service(format!(
                    "AWS SSM error: {}",
                    aws_sdk_ssm::error::DisplayErrorContext(&e)
                ))
            })?;

        Ok(response
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(str::to_string))
    }
}

/// Builds both fetchers from a single AWS configuration.
///
/// By default the standard credential chain is loaded when
/// [`connect`](StoreConnector::connect) is first called: environment
/// variables, web identity (IRSA), shared config files, then container and
/// instance metadata.
#[derive(Default)]
pub struct AwsConnector {
    config: Option<SdkConfig>,
}

impl std::fmt::Debug for AwsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConnector")
            .field("preloaded", &self.config.is_some())
            .finish()
    }
}

impl AwsConnector {
    /// Connector that loads the default credential chain on connect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector reusing an already loaded configuration.
    #[must_use]
    pub fn with_config(config: SdkConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    /// Load the default AWS configuration with SDK retries capped at
    /// [`MAX_ATTEMPTS`].
    pub async fn load_default_config() -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS))
            .load()
            .await
    }

    fn clients(config: &SdkConfig) -> Result<StoreClients, SecretError> {
        if config.region().is_none() {
            return Err(SecretError::ClientInit {
                message: "no AWS region configured (set AWS_REGION)".to_string(),
            });
        }

        debug!(region = ?config.region(), "Creating AWS secret store clients");
        Ok(StoreClients::new(
            SecretsManagerFetcher::new(config),
            ParameterStoreFetcher::new(config),
        ))
    }
}

#[async_trait]
impl StoreConnector for AwsConnector {
    async fn connect(&self) -> Result<StoreClients, SecretError> {
        match &self.config {
            Some(config) => Self::clients(config),
            None => Self::clients(&Self::load_default_config().await),
        }
    }
}
