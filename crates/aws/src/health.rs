//! Credential health check via STS `GetCallerIdentity`

use crate::AwsConnector;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Upper bound on the whole health check, config loading included.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the health check failed
#[derive(Debug, Error)]
pub enum HealthError {
    /// The check did not finish in time
    #[error("health check timed out after {0:?}")]
    Timeout(Duration),

    /// STS rejected the call
    #[error("health check failed: {0}")]
    Sts(String),
}

/// Identity reported by STS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Account id
    pub account: Option<String>,
    /// Caller ARN
    pub arn: Option<String>,
}

/// Verify that credentials resolve and AWS is reachable.
///
/// # Errors
///
/// Returns [`HealthError::Timeout`] after `timeout` and [`HealthError::Sts`]
/// if the identity call fails.
#[instrument(name = "health_check")]
pub async fn health_check(timeout: Duration) -> Result<CallerIdentity, HealthError> {
    tokio::time::timeout(timeout, caller_identity())
        .await
        .map_err(|_| HealthError::Timeout(timeout))?
}

async fn caller_identity() -> Result<CallerIdentity, HealthError> {
    let config = AwsConnector::load_default_config().await;
    let client = aws_sdk_sts::Client::new(&config);

    let response = client.get_caller_identity().send().await.map_err(|e| {
        HealthError::Sts(aws_sdk_sts::error::DisplayErrorContext(&e).to_string())
    })?;

    let identity = CallerIdentity {
        account: response.account().map(str::to_string),
        arn: response.arn().map(str::to_string),
    };
    debug!(account = ?identity.account, "Caller identity verified");
    Ok(identity)
}
